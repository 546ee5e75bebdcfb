//! Skill session: the episode sequence for one skill invocation.
//!
//! A session runs the configured number of primary recording episodes, with
//! an unrecorded reset episode between recordings to give time for manual
//! environment reset. Operator signals steer it: re-record discards the
//! buffered episode and redoes the same index, stop ends the session after
//! committing the current episode. The artifact handed to validation is
//! always the first committed episode of the session.

use std::path::PathBuf;

use log::info;

use crate::control::episode::{EpisodeSpec, run_episode};
use crate::control::home::HomingOptions;
use crate::domain::Pose;
use crate::error::{ArmctlError, Result};
use crate::escalation::help::HelpChannel;
use crate::events::Events;
use crate::policy::Policy;
use crate::record::{EpisodeResult, Recorder};
use crate::robot::RobotDriver;

/// Parameters of one skill session.
#[derive(Debug, Clone)]
pub struct SessionSpec<'a> {
    /// Control frequency for every episode in the session.
    pub fps: u32,
    /// Number of primary recording episodes.
    pub episode_count: u32,
    /// Duration of each primary episode, in seconds.
    pub episode_seconds: f64,
    /// Duration of the reset episode between recordings, in seconds.
    pub reset_seconds: f64,
    /// Task label for the policy and recorder.
    pub task: &'a str,
}

/// Execute one skill session; returns the first committed artifact.
pub async fn execute_session<R>(
    robot: &R,
    events: &Events,
    policy: &dyn Policy,
    recorder: &mut dyn Recorder,
    home: &Pose,
    homing: &HomingOptions,
    spec: &SessionSpec<'_>,
    help: &dyn HelpChannel,
) -> Result<PathBuf>
where
    R: RobotDriver + ?Sized,
{
    let mut episode_index = 0u32;
    let mut first_artifact: Option<PathBuf> = None;

    while episode_index < spec.episode_count {
        help.say(&format!("Recording episode {}", episode_index + 1)).await;
        let primary = EpisodeSpec {
            fps: spec.fps,
            duration_seconds: spec.episode_seconds,
            task: spec.task,
        };
        let episode = run_episode(
            robot,
            events,
            &primary,
            Some(policy),
            Some(&mut *recorder),
            home,
            homing,
        )
        .await?;

        if events.take_rerecord_episode() {
            help.say("Re-record episode").await;
            // A pending early-exit must not leak into the redone episode.
            events.take_exit_early();
            recorder.discard_episode_buffer()?;
            continue;
        }

        let episode = commit_recorded_episode(&mut *recorder, episode)?;
        if let Some(artifact) = &episode.artifact {
            info!(
                "Committed episode {} -> {} (early_exit: {}, reached_home: {})",
                episode_index + 1,
                artifact.display(),
                episode.early_exit,
                episode.reached_home
            );
        }
        if first_artifact.is_none() {
            first_artifact = episode.artifact;
        }

        if events.take_stop_recording() {
            break;
        }

        episode_index += 1;
        if episode_index < spec.episode_count {
            help.say("Reset the environment").await;
            let reset = EpisodeSpec {
                fps: spec.fps,
                duration_seconds: spec.reset_seconds,
                task: spec.task,
            };
            run_episode(robot, events, &reset, None, None, home, homing).await?;
        }
    }

    first_artifact
        .ok_or_else(|| ArmctlError::Recording("session committed no episode".to_string()))
}

/// Persist the buffered episode and attach the committed artifact to its
/// result.
fn commit_recorded_episode(
    recorder: &mut dyn Recorder,
    episode: EpisodeResult,
) -> Result<EpisodeResult> {
    let artifact = recorder.commit_episode()?;
    Ok(EpisodeResult {
        artifact: Some(artifact),
        ..episode
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::help::SilentHelp;
    use crate::policy::HoldPolicy;
    use crate::record::JsonlRecorder;
    use crate::robot::SimRobot;
    use tempfile::tempdir;

    fn pose(values: &[(&str, f64)]) -> Pose {
        values.iter().copied().collect()
    }

    fn fast_homing() -> HomingOptions {
        HomingOptions {
            settle_interval_ms: 0,
            ..HomingOptions::default()
        }
    }

    fn far_home() -> Pose {
        pose(&[("a", 500.0)])
    }

    fn spec(count: u32) -> SessionSpec<'static> {
        SessionSpec {
            fps: 50,
            episode_count: count,
            episode_seconds: 0.1,
            reset_seconds: 0.05,
            task: "stir",
        }
    }

    #[tokio::test]
    async fn test_commit_attaches_artifact_to_episode_result() {
        let dir = tempdir().unwrap();
        let robot = SimRobot::new(pose(&[("a", 0.0)]));
        let events = Events::new();
        let mut recorder = JsonlRecorder::new(dir.path(), 50).unwrap();
        let primary = EpisodeSpec {
            fps: 50,
            duration_seconds: 0.1,
            task: "stir",
        };

        let episode = run_episode(
            &robot,
            &events,
            &primary,
            Some(&HoldPolicy),
            Some(&mut recorder),
            &far_home(),
            &fast_homing(),
        )
        .await
        .unwrap();
        assert!(episode.artifact.is_none());

        let episode = commit_recorded_episode(&mut recorder, episode).unwrap();
        assert_eq!(
            episode.artifact,
            Some(dir.path().join(crate::record::DESIGNATED_ARTIFACT_PATH))
        );
    }

    #[tokio::test]
    async fn test_returns_first_committed_artifact() {
        let dir = tempdir().unwrap();
        let robot = SimRobot::new(pose(&[("a", 0.0)]));
        let events = Events::new();
        let mut recorder = JsonlRecorder::new(dir.path(), 50).unwrap();

        let artifact = execute_session(
            &robot,
            &events,
            &HoldPolicy,
            &mut recorder,
            &far_home(),
            &fast_homing(),
            &spec(2),
            &SilentHelp,
        )
        .await
        .unwrap();

        assert!(artifact.to_string_lossy().ends_with("episode_000000.mp4"));
        assert_eq!(recorder.committed_episodes(), 2);
    }

    #[tokio::test]
    async fn test_stop_recording_ends_after_current_commit() {
        let dir = tempdir().unwrap();
        let robot = SimRobot::new(pose(&[("a", 0.0)]));
        let events = Events::new();
        events.set_stop_recording();
        let mut recorder = JsonlRecorder::new(dir.path(), 50).unwrap();

        execute_session(
            &robot,
            &events,
            &HoldPolicy,
            &mut recorder,
            &far_home(),
            &fast_homing(),
            &spec(3),
            &SilentHelp,
        )
        .await
        .unwrap();

        // Stopped after committing the first episode despite count = 3.
        assert_eq!(recorder.committed_episodes(), 1);
        assert!(!events.take_stop_recording());
    }

    #[tokio::test]
    async fn test_rerecord_discards_and_redoes_same_index() {
        let dir = tempdir().unwrap();
        let robot = SimRobot::new(pose(&[("a", 0.0)]));
        let events = Events::new();
        // First pass gets re-recorded, second pass commits.
        events.set_rerecord_episode();
        events.set_exit_early();
        let mut recorder = JsonlRecorder::new(dir.path(), 50).unwrap();

        execute_session(
            &robot,
            &events,
            &HoldPolicy,
            &mut recorder,
            &far_home(),
            &fast_homing(),
            &spec(1),
            &SilentHelp,
        )
        .await
        .unwrap();

        assert_eq!(recorder.committed_episodes(), 1);
        assert!(!events.take_rerecord_episode());
        assert!(!events.take_exit_early());
    }

    #[tokio::test]
    async fn test_fps_mismatch_propagates_before_any_command() {
        let dir = tempdir().unwrap();
        let robot = SimRobot::new(pose(&[("a", 0.0)]));
        let events = Events::new();
        let mut recorder = JsonlRecorder::new(dir.path(), 24).unwrap();

        let err = execute_session(
            &robot,
            &events,
            &HoldPolicy,
            &mut recorder,
            &far_home(),
            &fast_homing(),
            &SessionSpec {
                fps: 30,
                episode_count: 1,
                episode_seconds: 0.1,
                reset_seconds: 0.05,
                task: "stir",
            },
            &SilentHelp,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ArmctlError::Configuration(_)));
        assert_eq!(robot.actions_sent(), 0);
    }
}
