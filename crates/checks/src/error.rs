//! Error type shared across the checks.

use thiserror::Error;

/// Failure talking to the cluster or preparing a comparison.
///
/// Assertion mismatches are not errors; checks report them as values and the
/// driver translates them into exit codes.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("failed to serialize a spec for comparison: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid dockercfg secret pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{object} has no spec in the API server response")]
    MissingSpec { object: String },
}
