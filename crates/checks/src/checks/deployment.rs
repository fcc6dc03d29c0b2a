//! Deployment spec verification for one workload.

use k8s_openapi::api::apps::v1::Deployment;
use tracing::instrument;

use crate::checks::SpecReport;
use crate::cluster::Cluster;
use crate::derivative;
use crate::error::CheckError;
use crate::workloads::{expected_deployment_spec, Workload};

/// Fetch the workload's Deployment and compare its spec against the template
/// derived from the instance name.
///
/// Only fields set in the template are asserted; cluster-defaulted fields
/// (image pull policy, probes, scheduler name, ...) pass untouched.
#[instrument(skip(cluster), fields(namespace = %cluster.namespace()))]
pub async fn check_deployment(
    cluster: &Cluster,
    workload: Workload,
    instance: &str,
) -> Result<SpecReport, CheckError> {
    let name = workload.deployment_name(instance);
    let object = format!("deployment/{name}");

    let deployment: Deployment = cluster.deployments().get(&name).await?;
    let spec = deployment.spec.ok_or_else(|| CheckError::MissingSpec {
        object: object.clone(),
    })?;

    let expected = serde_json::to_value(expected_deployment_spec(workload, instance))?;
    let actual = serde_json::to_value(spec)?;

    Ok(SpecReport {
        object,
        mismatches: derivative::mismatches(&expected, &actual),
    })
}
