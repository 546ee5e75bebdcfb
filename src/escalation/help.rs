//! Human-alert channel.
//!
//! Spoken status lines and the blocking hand-off used by escalation live
//! behind this trait; speech synthesis belongs to the presentation layer and
//! stays outside the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use log::{info, warn};

use crate::error::Result;
use crate::events::Events;

const ACK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Status announcements and the blocking human hand-off.
#[async_trait]
pub trait HelpChannel: Send + Sync {
    /// Announce a status line (episode start, reset phase, retry).
    async fn say(&self, message: &str);

    /// Raise an alert and block until the human explicitly acknowledges it.
    async fn alert_and_wait(&self, message: &str) -> Result<()>;
}

/// Console help channel: prints status lines and waits for the operator's
/// Enter keypress on alerts.
///
/// The acknowledgment arrives through the shared [`Events`] flags set by the
/// keyboard listener, which is the single reader of the terminal. Reading
/// stdin here would race the listener for the same keypress.
pub struct ConsoleHelp {
    events: Arc<Events>,
}

impl ConsoleHelp {
    /// Create a console channel observing the given signal set.
    pub fn new(events: Arc<Events>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl HelpChannel for ConsoleHelp {
    async fn say(&self, message: &str) {
        info!("{}", message);
        println!("{} {}", "Status:".cyan(), message);
    }

    async fn alert_and_wait(&self, message: &str) -> Result<()> {
        warn!("Escalating to human: {}", message);
        println!("{} {}", "I need help!".red().bold(), message);
        println!("{}", "Press Enter to continue...".yellow());

        // A keypress from before the alert is not an acknowledgment.
        self.events.take_acknowledge();
        loop {
            if self.events.take_acknowledge() {
                info!("Human acknowledged the alert");
                return Ok(());
            }
            tokio::time::sleep(ACK_POLL_INTERVAL).await;
        }
    }
}

/// Help channel that announces nothing and acknowledges immediately.
pub struct SilentHelp;

#[async_trait]
impl HelpChannel for SilentHelp {
    async fn say(&self, _message: &str) {}

    async fn alert_and_wait(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}
