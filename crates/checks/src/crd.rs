//! Typed view of the `Pulp` custom resource.
//!
//! Only the spec and status fields the checks read are modeled; everything
//! else the CRD carries is ignored on decode.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Deployment flavor assumed when the spec leaves `deployment_type` unset.
pub const DEFAULT_DEPLOYMENT_TYPE: &str = "pulp";

/// `Pulp` CRD spec, reduced to the fields the checks consume.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(group = "pulp.pulpproject.org", version = "v1beta1", kind = "Pulp")]
#[kube(namespaced)]
#[kube(status = "PulpStatus")]
pub struct PulpSpec {
    /// Secret names the operator attaches to its service account as image
    /// pull secrets.
    #[serde(default)]
    pub image_pull_secrets: Vec<String>,

    /// Provisioning flavor (`pulp` or `galaxy`).
    #[serde(default)]
    pub deployment_type: Option<String>,
}

/// Reconciliation state reported by the operator.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct PulpStatus {
    /// Conditions the operator attaches as reconciliation progresses.
    #[serde(default)]
    pub conditions: Vec<PulpCondition>,
}

/// A single status condition, identified by its `type`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PulpCondition {
    /// Type of condition
    #[serde(rename = "type")]
    pub condition_type: String,

    /// Status of the condition (True, False, or Unknown)
    pub status: ConditionStatus,

    /// Reason for the condition's last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message about the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned (RFC3339 format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Wire values a condition status can take.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// True when a condition with the given type reports `True`.
#[must_use]
pub fn is_status_condition_true(conditions: &[PulpCondition], condition_type: &str) -> bool {
    conditions
        .iter()
        .any(|condition| {
            condition.condition_type == condition_type
                && condition.status == ConditionStatus::True
        })
}

impl Pulp {
    /// Provisioning flavor, defaulting to `pulp` when the spec leaves it
    /// unset.
    #[must_use]
    pub fn deployment_type(&self) -> &str {
        self.spec
            .deployment_type
            .as_deref()
            .unwrap_or(DEFAULT_DEPLOYMENT_TYPE)
    }

    /// Type of the condition the operator flips to `True` once a
    /// reconciliation pass finishes, e.g. `Pulp-Operator-Finished-Execution`.
    #[must_use]
    pub fn finished_condition_type(&self) -> String {
        format!(
            "{}-Operator-Finished-Execution",
            title_case(self.deployment_type())
        )
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn condition(condition_type: &str, status: ConditionStatus) -> PulpCondition {
        PulpCondition {
            condition_type: condition_type.to_string(),
            status,
            reason: None,
            message: None,
            last_transition_time: None,
        }
    }

    #[test]
    fn decodes_live_representation_ignoring_unknown_fields() {
        let pulp: Pulp = serde_json::from_value(json!({
            "apiVersion": "pulp.pulpproject.org/v1beta1",
            "kind": "Pulp",
            "metadata": {"name": "ocp-example", "namespace": "pulp-operator-system"},
            "spec": {
                "deployment_type": "galaxy",
                "image_pull_secrets": ["test-C", "test-E"],
                "api": {"replicas": 1},
                "file_storage_size": "100Gi"
            },
            "status": {"conditions": [{
                "type": "Galaxy-Operator-Finished-Execution",
                "status": "True",
                "reason": "OperatorFinishedExecution",
                "lastTransitionTime": "2023-01-05T12:00:00Z"
            }]}
        }))
        .expect("decode Pulp");

        assert_eq!(pulp.deployment_type(), "galaxy");
        assert_eq!(pulp.spec.image_pull_secrets, ["test-C", "test-E"]);
        assert_eq!(
            pulp.finished_condition_type(),
            "Galaxy-Operator-Finished-Execution"
        );
        let status = pulp.status.expect("status");
        assert!(is_status_condition_true(
            &status.conditions,
            "Galaxy-Operator-Finished-Execution"
        ));
    }

    #[test]
    fn defaults_apply_when_spec_is_sparse() {
        let pulp: Pulp = serde_json::from_value(json!({
            "apiVersion": "pulp.pulpproject.org/v1beta1",
            "kind": "Pulp",
            "metadata": {"name": "ocp-example"},
            "spec": {}
        }))
        .expect("decode Pulp");

        assert_eq!(pulp.deployment_type(), "pulp");
        assert!(pulp.spec.image_pull_secrets.is_empty());
        assert!(pulp.status.is_none());
        assert_eq!(
            pulp.finished_condition_type(),
            "Pulp-Operator-Finished-Execution"
        );
    }

    #[test]
    fn condition_lookup_requires_matching_type_and_true_status() {
        let conditions = vec![
            condition("Pulp-API-Ready", ConditionStatus::True),
            condition("Pulp-Operator-Finished-Execution", ConditionStatus::False),
        ];
        assert!(!is_status_condition_true(
            &conditions,
            "Pulp-Operator-Finished-Execution"
        ));
        assert!(is_status_condition_true(&conditions, "Pulp-API-Ready"));
        assert!(!is_status_condition_true(&conditions, "Pulp-Web-Ready"));
    }
}
