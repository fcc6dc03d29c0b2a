//! Namespaced access to every object kind the checks read or mutate.

use std::path::Path;

use async_trait::async_trait;
use json_patch::{AddOperation, Patch as JsonPatch, PatchOperation, RemoveOperation};
use jsonptr::PointerBuf;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, Service, ServiceAccount};
use kube::api::{Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use tracing::debug;

use crate::crd::{Pulp, PulpCondition};
use crate::error::CheckError;
use crate::wait::ConditionSource;

/// Build a client from an explicit kubeconfig path.
///
/// CI mounts a kube-admin kubeconfig at a fixed location; there is no
/// in-cluster fallback.
pub async fn client_from_kubeconfig(path: &Path) -> Result<Client, CheckError> {
    let kubeconfig = Kubeconfig::read_from(path)?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
    Ok(Client::try_from(config)?)
}

/// One namespace's worth of typed APIs.
#[derive(Clone)]
pub struct Cluster {
    client: Client,
    namespace: String,
}

impl Cluster {
    #[must_use]
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn pulps(&self) -> Api<Pulp> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    #[must_use]
    pub fn deployments(&self) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    #[must_use]
    pub fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    #[must_use]
    pub fn service_accounts(&self) -> Api<ServiceAccount> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    #[must_use]
    pub fn secrets(&self) -> Api<Secret> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Fetch the `Pulp` instance, spec and status included.
    pub async fn pulp(&self, name: &str) -> Result<Pulp, CheckError> {
        Ok(self.pulps().get(name).await?)
    }

    /// JSON-Patch `add` of the given secret names onto the instance spec.
    pub async fn add_image_pull_secrets(
        &self,
        name: &str,
        secrets: &[String],
    ) -> Result<(), CheckError> {
        let patch = add_pull_secrets_patch(secrets)?;
        debug!(name, ?secrets, "patching spec.image_pull_secrets");
        self.pulps()
            .patch(name, &PatchParams::default(), &Patch::Json::<()>(patch))
            .await?;
        Ok(())
    }

    /// JSON-Patch `remove` of the whole `image_pull_secrets` field.
    pub async fn remove_image_pull_secrets(&self, name: &str) -> Result<(), CheckError> {
        debug!(name, "removing spec.image_pull_secrets");
        self.pulps()
            .patch(
                name,
                &PatchParams::default(),
                &Patch::Json::<()>(remove_pull_secrets_patch()),
            )
            .await?;
        Ok(())
    }

    /// Condition fetcher for the poller, bound to one instance.
    #[must_use]
    pub fn status_source(&self, name: &str) -> PulpConditionSource {
        PulpConditionSource {
            api: self.pulps(),
            name: name.to_string(),
        }
    }
}

fn image_pull_secrets_path() -> PointerBuf {
    PointerBuf::from_tokens(["spec", "image_pull_secrets"])
}

fn add_pull_secrets_patch(secrets: &[String]) -> Result<JsonPatch, CheckError> {
    Ok(JsonPatch(vec![PatchOperation::Add(AddOperation {
        path: image_pull_secrets_path(),
        value: serde_json::to_value(secrets)?,
    })]))
}

fn remove_pull_secrets_patch() -> JsonPatch {
    JsonPatch(vec![PatchOperation::Remove(RemoveOperation {
        path: image_pull_secrets_path(),
    })])
}

/// Fetches the instance's status conditions on demand.
pub struct PulpConditionSource {
    api: Api<Pulp>,
    name: String,
}

#[async_trait]
impl ConditionSource for PulpConditionSource {
    async fn conditions(&self) -> Result<Vec<PulpCondition>, CheckError> {
        let pulp = self.api.get(&self.name).await?;
        Ok(pulp.status.map(|status| status.conditions).unwrap_or_default())
    }
}
