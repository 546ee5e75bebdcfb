//! Recording interface and artifact layout.
//!
//! The camera/video capture and dataset serialization subsystem is an
//! external collaborator behind [`Recorder`]. Each skill attempt records
//! into its own directory; the artifact consumed by validation is a fixed
//! well-known relative path within it (one designated camera stream, one
//! designated episode index).

use std::path::{Path, PathBuf};

use crate::domain::Pose;
use crate::error::Result;
use crate::robot::Observation;

pub mod jsonl;

pub use jsonl::{JsonlRecorder, JsonlRecorderProvider};

/// Relative path of the validated recording within an attempt directory.
pub const DESIGNATED_ARTIFACT_PATH: &str =
    "videos/chunk-000/observation.images.front/episode_000000.mp4";

/// Relative video path for a given episode index within an attempt directory.
pub fn episode_video_path(episode_index: u32) -> PathBuf {
    PathBuf::from(format!(
        "videos/chunk-000/observation.images.front/episode_{:06}.mp4",
        episode_index
    ))
}

/// Result of one episode loop run.
///
/// Produced per episode and consumed immediately by the skill session.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeResult {
    /// Committed recording artifact, filled in by the session on commit.
    pub artifact: Option<PathBuf>,
    /// The operator ended the episode early.
    pub early_exit: bool,
    /// The episode ended by converging to the home pose.
    pub reached_home: bool,
}

impl EpisodeResult {
    /// Episode that ran to its nominal duration.
    pub fn completed() -> Self {
        Self {
            artifact: None,
            early_exit: false,
            reached_home: false,
        }
    }
}

/// Dataset sink for one skill attempt.
///
/// Frames accumulate in an episode buffer; `commit_episode` persists the
/// buffer as one episode, `discard_episode_buffer` drops it for a re-record.
pub trait Recorder: Send {
    /// Frame rate the sink was created with. Must equal the episode loop's
    /// requested fps or the loop fails fast before any robot command.
    fn fps(&self) -> u32;

    /// Append one observation/applied-action pair as a timestep.
    fn add_frame(&mut self, observation: &Observation, action: &Pose, task: &str) -> Result<()>;

    /// Persist the buffered episode; returns the committed artifact path.
    fn commit_episode(&mut self) -> Result<PathBuf>;

    /// Drop the buffered episode without committing.
    fn discard_episode_buffer(&mut self) -> Result<()>;
}

/// Builds a recorder for one attempt directory.
pub trait RecorderProvider: Send + Sync {
    /// Create the sink writing under `attempt_dir`.
    fn create(&self, attempt_dir: &Path) -> Result<Box<dyn Recorder>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_designated_artifact_is_episode_zero() {
        assert_eq!(
            episode_video_path(0),
            PathBuf::from(DESIGNATED_ARTIFACT_PATH)
        );
    }

    #[test]
    fn test_episode_video_path_indexing() {
        assert!(
            episode_video_path(12)
                .to_string_lossy()
                .ends_with("episode_000012.mp4")
        );
    }

    #[test]
    fn test_episode_result_completed() {
        let result = EpisodeResult::completed();
        assert!(!result.early_exit);
        assert!(!result.reached_home);
        assert!(result.artifact.is_none());
    }
}
