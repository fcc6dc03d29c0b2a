//! Workload parameterization for the objects the operator derives.
//!
//! The api and content workloads follow one template and differ only in name
//! suffix, port, worker-count env entry, and the api-only container-auth key
//! mounts, so a single builder pair covers both.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, KeyToPath, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, SecretVolumeSource, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// Container image every Pulp workload runs.
pub const PULP_IMAGE: &str = "quay.io/pulp/pulp:latest";

const SECRET_DEFAULT_MODE: i32 = 420;

/// The two workloads the operator deploys per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    Api,
    Content,
}

impl Workload {
    pub const ALL: [Self; 2] = [Self::Api, Self::Content];

    /// Name suffix shared by the workload's derived objects.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Content => "content",
        }
    }

    /// Gunicorn port the workload listens on.
    #[must_use]
    pub fn port(self) -> i32 {
        match self {
            Self::Api => 24817,
            Self::Content => 24816,
        }
    }

    #[must_use]
    pub fn deployment_name(self, instance: &str) -> String {
        format!("{instance}-{}", self.suffix())
    }

    #[must_use]
    pub fn service_name(self, instance: &str) -> String {
        format!("{instance}-{}-svc", self.suffix())
    }

    fn workers_env(self) -> &'static str {
        match self {
            Self::Api => "PULP_API_WORKERS",
            Self::Content => "PULP_CONTENT_WORKERS",
        }
    }
}

/// Expected Deployment spec for one workload of an instance.
///
/// Only fields the operator renders deterministically are populated;
/// everything the cluster defaults on its own is left out so the derivative
/// comparison ignores it.
#[must_use]
pub fn expected_deployment_spec(workload: Workload, instance: &str) -> DeploymentSpec {
    DeploymentSpec {
        replicas: Some(1),
        selector: LabelSelector::default(),
        template: PodTemplateSpec {
            metadata: None,
            spec: Some(PodSpec {
                containers: vec![Container {
                    args: Some(vec![format!("pulp-{}", workload.suffix())]),
                    env: Some(expected_env(workload, instance)),
                    image: Some(PULP_IMAGE.to_string()),
                    name: workload.suffix().to_string(),
                    ports: Some(vec![ContainerPort {
                        container_port: workload.port(),
                        protocol: Some("TCP".to_string()),
                        ..ContainerPort::default()
                    }]),
                    volume_mounts: Some(expected_volume_mounts(workload, instance)),
                    ..Container::default()
                }],
                volumes: Some(expected_volumes(workload, instance)),
                ..PodSpec::default()
            }),
        },
        ..DeploymentSpec::default()
    }
}

/// Expected Service spec for one workload of an instance.
///
/// Fields the cluster assigns on provisioning (cluster IPs and friends) stay
/// unset on purpose.
#[must_use]
pub fn expected_service_spec(
    workload: Workload,
    instance: &str,
    deployment_type: &str,
) -> ServiceSpec {
    let suffix = workload.suffix();
    let port = workload.port();
    ServiceSpec {
        ports: Some(vec![ServicePort {
            name: Some(format!("{suffix}-{port}")),
            port,
            protocol: Some("TCP".to_string()),
            target_port: Some(IntOrString::Int(port)),
            ..ServicePort::default()
        }]),
        selector: Some(selector_labels(workload, instance, deployment_type)),
        type_: Some("ClusterIP".to_string()),
        ..ServiceSpec::default()
    }
}

fn selector_labels(
    workload: Workload,
    instance: &str,
    deployment_type: &str,
) -> BTreeMap<String, String> {
    let suffix = workload.suffix();
    [
        ("app.kubernetes.io/component", suffix.to_string()),
        (
            "app.kubernetes.io/instance",
            format!("{deployment_type}-{suffix}-{instance}"),
        ),
        (
            "app.kubernetes.io/managed-by",
            format!("{deployment_type}-operator"),
        ),
        ("app.kubernetes.io/name", format!("{deployment_type}-{suffix}")),
        ("app.kubernetes.io/part-of", deployment_type.to_string()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

fn expected_env(workload: Workload, instance: &str) -> Vec<EnvVar> {
    vec![
        env("POSTGRES_SERVICE_HOST", format!("{instance}-postgres-13")),
        env("POSTGRES_SERVICE_PORT", "5432"),
        env("REDIS_SERVICE_HOST", format!("{instance}-redis-svc")),
        env("REDIS_SERVICE_PORT", "6379"),
        env("PULP_GUNICORN_TIMEOUT", "90"),
        env(workload.workers_env(), "2"),
    ]
}

fn expected_volume_mounts(workload: Workload, instance: &str) -> Vec<VolumeMount> {
    let mut mounts = vec![
        mount(
            "/etc/pulp/settings.py",
            format!("{instance}-server"),
            Some("settings.py"),
            true,
        ),
        mount(
            "/etc/pulp/pulp-admin-password",
            format!("{instance}-admin-password"),
            Some("admin-password"),
            true,
        ),
        mount(
            "/etc/pulp/keys/database_fields.symmetric.key",
            format!("{instance}-db-fields-encryption"),
            Some("database_fields.symmetric.key"),
            true,
        ),
        mount("/var/lib/pulp", "file-storage".to_string(), None, false),
    ];
    if workload == Workload::Api {
        mounts.push(mount(
            "/etc/pulp/keys/container_auth_private_key.pem",
            format!("{instance}-container-auth-certs"),
            Some("container_auth_private_key.pem"),
            true,
        ));
        mounts.push(mount(
            "/etc/pulp/keys/container_auth_public_key.pem",
            format!("{instance}-container-auth-certs"),
            Some("container_auth_public_key.pem"),
            true,
        ));
    }
    mounts
}

fn expected_volumes(workload: Workload, instance: &str) -> Vec<Volume> {
    let mut volumes = vec![
        secret_volume(
            format!("{instance}-server"),
            format!("{instance}-server"),
            &[("settings.py", "settings.py")],
        ),
        // The operator mounts the admin password under the "example-"
        // prefixed secret name regardless of the instance name.
        secret_volume(
            format!("{instance}-admin-password"),
            "example-pulp-admin-password".to_string(),
            &[("password", "admin-password")],
        ),
        secret_volume(
            format!("{instance}-db-fields-encryption"),
            format!("{instance}-db-fields-encryption"),
            &[(
                "database_fields.symmetric.key",
                "database_fields.symmetric.key",
            )],
        ),
        Volume {
            name: "file-storage".to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: format!("{instance}-file-storage"),
                read_only: None,
            }),
            ..Volume::default()
        },
    ];
    if workload == Workload::Api {
        volumes.push(secret_volume(
            format!("{instance}-container-auth-certs"),
            format!("{instance}-container-auth"),
            &[
                (
                    "container_auth_public_key.pem",
                    "container_auth_public_key.pem",
                ),
                (
                    "container_auth_private_key.pem",
                    "container_auth_private_key.pem",
                ),
            ],
        ));
    }
    volumes
}

fn env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        value_from: None,
    }
}

fn mount(path: &str, name: String, sub_path: Option<&str>, read_only: bool) -> VolumeMount {
    VolumeMount {
        mount_path: path.to_string(),
        name,
        read_only: read_only.then_some(true),
        sub_path: sub_path.map(str::to_string),
        ..VolumeMount::default()
    }
}

fn secret_volume(name: String, secret_name: String, items: &[(&str, &str)]) -> Volume {
    Volume {
        name,
        secret: Some(SecretVolumeSource {
            default_mode: Some(SECRET_DEFAULT_MODE),
            items: Some(
                items
                    .iter()
                    .map(|(key, path)| KeyToPath {
                        key: (*key).to_string(),
                        path: (*path).to_string(),
                        mode: None,
                    })
                    .collect(),
            ),
            secret_name: Some(secret_name),
            optional: None,
        }),
        ..Volume::default()
    }
}
