//! Service spec verification for one workload.

use k8s_openapi::api::core::v1::Service;
use tracing::instrument;

use crate::checks::SpecReport;
use crate::cluster::Cluster;
use crate::derivative;
use crate::error::CheckError;
use crate::workloads::{expected_service_spec, Workload};

/// Fetch the workload's Service and compare its spec against the template
/// derived from the instance name and deployment type.
///
/// Fields assigned on provisioning (cluster IPs, IP families) are absent
/// from the template and therefore never asserted.
#[instrument(skip(cluster), fields(namespace = %cluster.namespace()))]
pub async fn check_service(
    cluster: &Cluster,
    workload: Workload,
    instance: &str,
    deployment_type: &str,
) -> Result<SpecReport, CheckError> {
    let name = workload.service_name(instance);
    let object = format!("service/{name}");

    let service: Service = cluster.services().get(&name).await?;
    let spec = service.spec.ok_or_else(|| CheckError::MissingSpec {
        object: object.clone(),
    })?;

    let expected = serde_json::to_value(expected_service_spec(workload, instance, deployment_type))?;
    let actual = serde_json::to_value(spec)?;

    Ok(SpecReport {
        object,
        mismatches: derivative::mismatches(&expected, &actual),
    })
}
