//! Run status lifecycle and the backoff policy used while waiting for a run.

use std::fmt;
use std::time::Duration;

/// Status of a run as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    Other(String),
}

impl RunStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "requires_action" => Self::RequiresAction,
            "cancelling" => Self::Cancelling,
            "cancelled" => Self::Cancelled,
            "failed" => Self::Failed,
            "completed" | "complete" => Self::Completed,
            "incomplete" => Self::Incomplete,
            "expired" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Other(s) => s,
        }
    }

    /// Terminal success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Terminal states that produce no reply.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exponential backoff between run polls, bounded by an overall timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep after the first non-terminal poll.
    pub initial_interval: Duration,
    /// Upper bound for a single sleep.
    pub max_interval: Duration,
    /// Total time to wait for a terminal status before giving up.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(120),
        }
    }
}

impl PollPolicy {
    /// Interval following `current`: doubled, capped at `max_interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_completion_spellings() {
        assert_eq!(RunStatus::parse("completed"), RunStatus::Completed);
        assert_eq!(RunStatus::parse("complete"), RunStatus::Completed);
        assert_eq!(RunStatus::parse("in_progress"), RunStatus::InProgress);
        assert_eq!(
            RunStatus::parse("thinking"),
            RunStatus::Other("thinking".to_string())
        );
    }

    #[test]
    fn test_terminal_classification() {
        assert!(RunStatus::Completed.is_success());
        for status in ["failed", "cancelled", "expired", "incomplete"] {
            assert!(RunStatus::parse(status).is_failure(), "{status}");
        }
        for status in ["queued", "in_progress", "requires_action", "cancelling", "odd"] {
            assert!(!RunStatus::parse(status).is_terminal(), "{status}");
        }
    }

    #[test]
    fn test_next_interval_doubles_until_cap() {
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        };
        let mut interval = policy.initial_interval;
        let mut seen = Vec::new();
        for _ in 0..4 {
            interval = policy.next_interval(interval);
            seen.push(interval.as_millis());
        }
        assert_eq!(seen, vec![500, 1000, 1000, 1000]);
    }
}
