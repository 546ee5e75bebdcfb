//! Control loops: homing, episodes, and skill sessions.

pub mod episode;
pub mod home;
pub mod session;

pub use episode::{EpisodeSpec, run_episode};
pub use home::{HomingOptions, StepOutcome, is_near_home, return_to_home, step_toward};
pub use session::{SessionSpec, execute_session};
