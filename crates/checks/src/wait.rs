//! Bounded condition polling for the `Pulp` custom resource.
//!
//! The operator has no readiness endpoint; the only completion signal is a
//! status condition it flips to `True` at the end of a reconciliation pass.
//! The poller fetches the condition list on a fixed cadence until that
//! happens or the attempt budget runs out, and always says which of the two
//! it was.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::crd::{is_status_condition_true, PulpCondition};
use crate::error::CheckError;

/// Attempt bound and inter-attempt delay for one poll session.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// How a poll session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition reported `True` on the given fetch attempt.
    Met { attempts: u32 },
    /// The attempt budget ran out without the condition turning `True`.
    TimedOut { attempts: u32 },
}

impl WaitOutcome {
    #[must_use]
    pub fn is_met(self) -> bool {
        matches!(self, Self::Met { .. })
    }
}

/// Supplies the watched resource's current condition list on demand.
#[async_trait]
pub trait ConditionSource {
    async fn conditions(&self) -> Result<Vec<PulpCondition>, CheckError>;
}

/// Poll `source` until the condition named `condition_type` reports `True`.
///
/// Performs at most `settings.max_attempts` fetches with `settings.delay`
/// between them (no trailing delay after the last fetch), so the call blocks
/// for less than `max_attempts * delay` of wall-clock time. A zero attempt
/// budget times out without fetching. Fetch errors propagate immediately.
///
/// Dropping the returned future cancels the wait; callers with a hard
/// deadline can wrap the call in `tokio::time::timeout`.
pub async fn wait_for_condition<S>(
    source: &S,
    condition_type: &str,
    settings: PollSettings,
) -> Result<WaitOutcome, CheckError>
where
    S: ConditionSource + ?Sized,
{
    for attempt in 1..=settings.max_attempts {
        let conditions = source.conditions().await?;
        if is_status_condition_true(&conditions, condition_type) {
            debug!(attempt, condition = condition_type, "condition reported True");
            return Ok(WaitOutcome::Met { attempts: attempt });
        }
        if attempt < settings.max_attempts {
            info!(
                attempt,
                max_attempts = settings.max_attempts,
                "operator still reconciling, retrying after delay"
            );
            sleep(settings.delay).await;
        }
    }
    Ok(WaitOutcome::TimedOut {
        attempts: settings.max_attempts,
    })
}
