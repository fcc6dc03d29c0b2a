//! Post-reconciliation object checks.

pub mod deployment;
pub mod service;
pub mod service_account;

use crate::derivative::Mismatch;

/// Result of comparing one live object against its expected template.
#[derive(Debug)]
pub struct SpecReport {
    /// Object identity, e.g. `deployment/ocp-example-api`.
    pub object: String,
    pub mismatches: Vec<Mismatch>,
}

impl SpecReport {
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}
