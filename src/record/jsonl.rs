//! JSONL frame sink.
//!
//! Writes each committed episode as one line-per-frame JSONL file under the
//! attempt directory. Video encoding is the capture subsystem's job; this
//! sink persists the observation/action timesteps and reports the designated
//! video path for the committed episode index.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::Pose;
use crate::error::{ArmctlError, Result};
use crate::record::{Recorder, RecorderProvider, episode_video_path};
use crate::robot::Observation;

#[derive(Debug, Serialize)]
struct FrameRecord<'a> {
    frame_index: usize,
    task: &'a str,
    observation: &'a Observation,
    action: &'a Pose,
}

#[derive(Debug, Clone, Serialize)]
struct OwnedFrame {
    task: String,
    observation: Observation,
    action: Pose,
}

/// JSONL-backed recorder for one attempt directory.
pub struct JsonlRecorder {
    attempt_dir: PathBuf,
    fps: u32,
    buffer: Vec<OwnedFrame>,
    committed_episodes: u32,
}

impl JsonlRecorder {
    /// Create a recorder writing under `attempt_dir` at the given fps.
    pub fn new(attempt_dir: impl AsRef<Path>, fps: u32) -> Result<Self> {
        let attempt_dir = attempt_dir.as_ref().to_path_buf();
        fs::create_dir_all(attempt_dir.join("data"))?;
        Ok(Self {
            attempt_dir,
            fps,
            buffer: Vec::new(),
            committed_episodes: 0,
        })
    }

    /// Number of frames currently buffered.
    pub fn buffered_frames(&self) -> usize {
        self.buffer.len()
    }

    /// Number of episodes committed so far.
    pub fn committed_episodes(&self) -> u32 {
        self.committed_episodes
    }

    fn episode_data_path(&self, episode_index: u32) -> PathBuf {
        self.attempt_dir
            .join("data")
            .join(format!("episode_{:06}.jsonl", episode_index))
    }
}

impl Recorder for JsonlRecorder {
    fn fps(&self) -> u32 {
        self.fps
    }

    fn add_frame(&mut self, observation: &Observation, action: &Pose, task: &str) -> Result<()> {
        self.buffer.push(OwnedFrame {
            task: task.to_string(),
            observation: observation.clone(),
            action: action.clone(),
        });
        Ok(())
    }

    fn commit_episode(&mut self) -> Result<PathBuf> {
        let index = self.committed_episodes;
        let path = self.episode_data_path(index);
        let mut file: File = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)?;
        for (frame_index, frame) in self.buffer.iter().enumerate() {
            let record = FrameRecord {
                frame_index,
                task: &frame.task,
                observation: &frame.observation,
                action: &frame.action,
            };
            writeln!(file, "{}", serde_json::to_string(&record)?)?;
        }
        self.buffer.clear();
        self.committed_episodes += 1;
        Ok(self.attempt_dir.join(episode_video_path(index)))
    }

    fn discard_episode_buffer(&mut self) -> Result<()> {
        self.buffer.clear();
        Ok(())
    }
}

/// Provider creating a [`JsonlRecorder`] per attempt directory.
pub struct JsonlRecorderProvider {
    fps: u32,
}

impl JsonlRecorderProvider {
    /// Create a provider producing sinks at the given fps.
    pub fn new(fps: u32) -> Self {
        Self { fps }
    }
}

impl RecorderProvider for JsonlRecorderProvider {
    fn create(&self, attempt_dir: &Path) -> Result<Box<dyn Recorder>> {
        if attempt_dir.as_os_str().is_empty() {
            return Err(ArmctlError::Recording("empty attempt directory".to_string()));
        }
        Ok(Box::new(JsonlRecorder::new(attempt_dir, self.fps)?))
    }
}
