//! armctl - Skill execution orchestrator for a robot arm
//!
//! armctl drives a robot arm through a multi-step physical task by composing
//! discrete learned skills. Each skill runs as a fixed-rate recording episode,
//! is validated by a vision-language judge, and is retried with bounded
//! escalation to a human operator.

pub mod control;
pub mod domain;
pub mod error;
pub mod escalation;
pub mod events;
pub mod gemini;
pub mod orchestrator;
pub mod planner;
pub mod policy;
pub mod record;
pub mod robot;
pub mod validation;

pub use error::{ArmctlError, Result};
