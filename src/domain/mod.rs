//! Core domain types: poses, skills, plans.

pub mod pose;
pub mod skill;

pub use pose::Pose;
pub use skill::{Plan, Skill};
