//! Pull-secret reconciliation check for the operator's service account.
//!
//! The expected list is composed from two sources of truth: the secret names
//! declared on the `Pulp` spec, plus the one dockercfg secret the controller
//! manager creates for the service account (discovered by annotation and
//! name pattern). The service account's attached `imagePullSecrets` must
//! equal that list exactly, order included - this is plain sequence
//! equality, not the derivative subset rule.

use k8s_openapi::api::core::v1::Secret;
use kube::api::ListParams;
use regex::Regex;
use tracing::{debug, instrument};

use crate::cluster::Cluster;
use crate::config::CheckConfig;
use crate::crd::Pulp;
use crate::error::CheckError;

/// Annotation the controller manager stamps on service-account secrets.
const SERVICE_ACCOUNT_ANNOTATION: &str = "kubernetes.io/service-account.name";

/// Both sides of the pull-secret comparison.
#[derive(Debug)]
pub struct SecretSetReport {
    /// Declared secrets plus the discovered dockercfg secret, in order.
    pub expected: Vec<String>,
    /// Names attached to the service account, in API-server order.
    pub actual: Vec<String>,
}

impl SecretSetReport {
    #[must_use]
    pub fn in_sync(&self) -> bool {
        self.expected == self.actual
    }
}

/// Compare the service account's `imagePullSecrets` against the names the
/// operator should have attached for this instance.
#[instrument(
    skip_all,
    fields(namespace = %cluster.namespace(), service_account = %config.service_account)
)]
pub async fn check_service_account(
    cluster: &Cluster,
    config: &CheckConfig,
    pulp: &Pulp,
) -> Result<SecretSetReport, CheckError> {
    let pattern = dockercfg_pattern(&config.service_account)?;
    let secrets = cluster.secrets().list(&ListParams::default()).await?;
    let discovered = secrets
        .items
        .iter()
        .find(|secret| is_dockercfg_secret(&pattern, &config.service_account, secret))
        .and_then(|secret| secret.metadata.name.clone());
    debug!(?discovered, "dockercfg secret scan finished");

    let expected = merge_pull_secrets(&pulp.spec.image_pull_secrets, discovered);

    let account = cluster
        .service_accounts()
        .get(&config.service_account)
        .await?;
    let actual = account
        .image_pull_secrets
        .unwrap_or_default()
        .into_iter()
        .map(|reference| reference.name)
        .collect();

    Ok(SecretSetReport { expected, actual })
}

/// Declared names first, then the discovered dockercfg secret, if any.
#[must_use]
pub fn merge_pull_secrets(declared: &[String], dockercfg: Option<String>) -> Vec<String> {
    let mut merged = declared.to_vec();
    merged.extend(dockercfg);
    merged
}

fn dockercfg_pattern(service_account: &str) -> Result<Regex, CheckError> {
    Ok(Regex::new(&format!(
        "^{}-dockercfg-",
        regex::escape(service_account)
    ))?)
}

fn is_dockercfg_secret(pattern: &Regex, service_account: &str, secret: &Secret) -> bool {
    let annotated = secret
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(SERVICE_ACCOUNT_ANNOTATION))
        .is_some_and(|owner| owner == service_account);
    annotated
        && secret
            .metadata
            .name
            .as_deref()
            .is_some_and(|name| pattern.is_match(name))
}
