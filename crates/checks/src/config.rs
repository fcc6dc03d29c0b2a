//! Explicit configuration for one check run.

use std::time::Duration;

use crate::wait::PollSettings;

/// Everything the checks need to know about the instance under test.
///
/// Defaults live on the CLI; nothing in here is global.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Namespace the Pulp instance runs in.
    pub namespace: String,
    /// Service account the operator manages pull secrets for.
    pub service_account: String,
    /// Name of the `Pulp` custom resource.
    pub instance: String,
    /// Secret names the driver patches into `spec.image_pull_secrets`.
    pub pull_secrets: Vec<String>,
    /// Attempt bound and cadence for the post-mutation condition poll.
    pub wait: PollSettings,
    /// Fixed pause after each mutation before polling starts.
    pub settle: Duration,
}
