//! Validation gate: did the recorded attempt actually accomplish the skill?
//!
//! Binary verdicts only - no scores, no partial credit. An ambiguous judge
//! answer is a failure. The gate performs no local retries; transient judge
//! failures surface to the retry policy as a judged failure.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ArmctlError, Result};

pub mod gemini;

pub use gemini::GeminiJudge;

/// External vision judge answering a yes/no question about a recording.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Judge the artifact against the question; `true` means success.
    async fn judge(&self, artifact: &Path, question: &str) -> Result<bool>;
}

/// Judge that affirms everything. Used by dry runs, where no recording worth
/// analyzing exists.
pub struct ApproveAllJudge;

#[async_trait]
impl Judge for ApproveAllJudge {
    async fn judge(&self, _artifact: &Path, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Judge replaying a fixed sequence of verdicts, for tests and rehearsals.
///
/// Once the script is exhausted every further call fails.
pub struct ScriptedJudge {
    verdicts: Mutex<Vec<Result<bool>>>,
}

impl ScriptedJudge {
    /// Judge answering the given verdicts in order.
    pub fn new(verdicts: Vec<bool>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into_iter().rev().map(Ok).collect()),
        }
    }

    /// Judge whose first `calls` invocations error out.
    pub fn failing_calls(calls: usize) -> Self {
        Self {
            verdicts: Mutex::new(
                (0..calls)
                    .map(|_| Err(ArmctlError::Llm("judge unavailable".to_string())))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge(&self, _artifact: &Path, _question: &str) -> Result<bool> {
        self.verdicts
            .lock()
            .map_err(|e| ArmctlError::Llm(e.to_string()))?
            .pop()
            .unwrap_or_else(|| Err(ArmctlError::Llm("judge script exhausted".to_string())))
    }
}

/// Interpret a judge's textual answer: success iff it contains an affirmative
/// token, case-insensitively. Anything else, including ambiguity, fails.
pub fn is_affirmative(answer: &str) -> bool {
    answer.to_lowercase().contains("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_approve_all() {
        assert!(ApproveAllJudge.judge(Path::new("x.mp4"), "?").await.unwrap());
    }

    #[tokio::test]
    async fn test_scripted_judge_replays_in_order() {
        let judge = ScriptedJudge::new(vec![false, true]);
        assert!(!judge.judge(Path::new("a"), "?").await.unwrap());
        assert!(judge.judge(Path::new("a"), "?").await.unwrap());
        assert!(judge.judge(Path::new("a"), "?").await.is_err());
    }

    #[test]
    fn test_affirmative_parsing() {
        assert!(is_affirmative("Yes"));
        assert!(is_affirmative("YES, the teabag is in the cup."));
        assert!(is_affirmative("I would say yes."));
        assert!(!is_affirmative("No."));
        assert!(!is_affirmative("It is unclear from the video."));
        assert!(!is_affirmative(""));
    }
}
