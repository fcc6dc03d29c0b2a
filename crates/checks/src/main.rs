//! CI driver: mutate `image_pull_secrets` on a Pulp instance, wait for the
//! operator to reconcile, and verify the derived objects.
//!
//! One distinguishable exit code per failure class so CI log triage stays
//! meaningful:
//!
//! - 0: every check passed
//! - 1: service-account pull secrets wrong before any mutation
//! - 2: service-account pull secrets wrong after a mutation
//! - 3: a deployment spec diverged from its template
//! - 4: a service spec diverged from its template
//! - 5: the operator never reported completion within the attempt budget
//! - 10: cluster or configuration failure (transport, auth, kubeconfig)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use pulp_checks::checks::deployment::check_deployment;
use pulp_checks::checks::service::check_service;
use pulp_checks::checks::service_account::{check_service_account, SecretSetReport};
use pulp_checks::checks::SpecReport;
use pulp_checks::cluster::{client_from_kubeconfig, Cluster};
use pulp_checks::config::CheckConfig;
use pulp_checks::wait::{wait_for_condition, PollSettings, WaitOutcome};
use pulp_checks::workloads::Workload;

/// Exit code for transport/auth/config failures, distinct from every check
/// class.
const FATAL: u8 = 10;

/// Verify the objects the Pulp operator derives from a Pulp instance
#[derive(Parser)]
#[command(name = "check-resources")]
#[command(about = "Verify the objects the Pulp operator derives from a Pulp instance")]
#[command(version)]
struct Cli {
    /// Namespace the Pulp instance runs in
    #[arg(long, default_value = "pulp-operator-system")]
    namespace: String,

    /// Service account the operator manages pull secrets for
    #[arg(long, default_value = "pulp-operator-sa")]
    service_account: String,

    /// Name of the Pulp custom resource under test
    #[arg(long, default_value = "ocp-example")]
    instance: String,

    /// Path to the kubeconfig mounted by the CI harness
    #[arg(long, default_value = "/etc/kubeconfig/config")]
    kubeconfig: PathBuf,

    /// Secret names to patch into spec.image_pull_secrets
    #[arg(long, value_delimiter = ',', default_value = "test-C,test-E")]
    pull_secrets: Vec<String>,

    /// Maximum condition fetches per wait
    #[arg(long, default_value_t = 11)]
    wait_attempts: u32,

    /// Seconds between condition fetches
    #[arg(long, default_value_t = 30)]
    wait_delay_secs: u64,

    /// Seconds to pause after each mutation before polling starts
    #[arg(long, default_value_t = 15)]
    settle_secs: u64,
}

impl Cli {
    fn into_config(self) -> (CheckConfig, PathBuf) {
        let config = CheckConfig {
            namespace: self.namespace,
            service_account: self.service_account,
            instance: self.instance,
            pull_secrets: self.pull_secrets,
            wait: PollSettings {
                max_attempts: self.wait_attempts,
                delay: Duration::from_secs(self.wait_delay_secs),
            },
            settle: Duration::from_secs(self.settle_secs),
        };
        (config, self.kubeconfig)
    }
}

/// One distinguishable exit code per failing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    PullSecrets,
    PullSecretsAfterMutation,
    Deployment,
    Service,
    WaitTimedOut,
}

impl Failure {
    fn exit_code(self) -> u8 {
        match self {
            Self::PullSecrets => 1,
            Self::PullSecretsAfterMutation => 2,
            Self::Deployment => 3,
            Self::Service => 4,
            Self::WaitTimedOut => 5,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(None) => {
            info!("service account, deployment and service checks passed");
            ExitCode::SUCCESS
        }
        Ok(Some(failure)) => ExitCode::from(failure.exit_code()),
        Err(error) => {
            error!("fatal: {error:#}");
            ExitCode::from(FATAL)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Option<Failure>> {
    let (config, kubeconfig) = cli.into_config();

    let client = client_from_kubeconfig(&kubeconfig)
        .await
        .with_context(|| format!("loading kubeconfig from {}", kubeconfig.display()))?;
    let cluster = Cluster::new(client, config.namespace.clone());

    let pulp = cluster
        .pulp(&config.instance)
        .await
        .context("fetching the Pulp instance")?;

    let report = check_service_account(&cluster, &config, &pulp).await?;
    if !report.in_sync() {
        log_secret_mismatch(&report, "before any mutation");
        return Ok(Some(Failure::PullSecrets));
    }
    info!("service account imagePullSecrets in sync");

    info!(secrets = ?config.pull_secrets, "adding image_pull_secrets to the instance spec");
    cluster
        .add_image_pull_secrets(&config.instance, &config.pull_secrets)
        .await
        .context("patching image_pull_secrets onto the instance")?;
    if let Some(failure) = settle_and_wait(&cluster, &config).await? {
        return Ok(Some(failure));
    }
    let pulp = cluster.pulp(&config.instance).await?;
    let report = check_service_account(&cluster, &config, &pulp).await?;
    if !report.in_sync() {
        log_secret_mismatch(&report, "after adding new secrets");
        return Ok(Some(Failure::PullSecretsAfterMutation));
    }
    info!("new imagePullSecrets propagated to the service account");

    info!("removing the image_pull_secrets definition from the instance spec");
    cluster
        .remove_image_pull_secrets(&config.instance)
        .await
        .context("removing image_pull_secrets from the instance")?;
    if let Some(failure) = settle_and_wait(&cluster, &config).await? {
        return Ok(Some(failure));
    }
    let pulp = cluster.pulp(&config.instance).await?;
    let report = check_service_account(&cluster, &config, &pulp).await?;
    if !report.in_sync() {
        log_secret_mismatch(&report, "after removing the image_pull_secrets definition");
        return Ok(Some(Failure::PullSecretsAfterMutation));
    }
    info!("service account imagePullSecrets restored");

    let deployment_type = pulp.deployment_type().to_string();
    for workload in Workload::ALL {
        let (deployment, service) = futures::future::try_join(
            check_deployment(&cluster, workload, &config.instance),
            check_service(&cluster, workload, &config.instance, &deployment_type),
        )
        .await?;

        if !deployment.is_match() {
            log_spec_mismatches(&deployment);
            return Ok(Some(Failure::Deployment));
        }
        info!(workload = workload.suffix(), "deployment spec matches");

        if !service.is_match() {
            log_spec_mismatches(&service);
            return Ok(Some(Failure::Service));
        }
        info!(workload = workload.suffix(), "service spec matches");
    }

    Ok(None)
}

/// Pause for the configured settle time, then poll for the operator's
/// finished-execution condition.
async fn settle_and_wait(cluster: &Cluster, config: &CheckConfig) -> anyhow::Result<Option<Failure>> {
    tokio::time::sleep(config.settle).await;

    let pulp = cluster.pulp(&config.instance).await?;
    let condition = pulp.finished_condition_type();
    let source = cluster.status_source(&config.instance);

    match wait_for_condition(&source, &condition, config.wait).await? {
        WaitOutcome::Met { attempts } => {
            info!(attempts, condition = %condition, "operator finished reconciling");
            Ok(None)
        }
        WaitOutcome::TimedOut { attempts } => {
            error!(
                attempts,
                condition = %condition,
                "operator did not report completion within the attempt budget"
            );
            Ok(Some(Failure::WaitTimedOut))
        }
    }
}

fn log_secret_mismatch(report: &SecretSetReport, phase: &str) {
    error!(
        expected = ?report.expected,
        actual = ?report.actual,
        "service account imagePullSecrets do not match the expected secrets {phase}"
    );
}

fn log_spec_mismatches(report: &SpecReport) {
    for mismatch in &report.mismatches {
        error!(object = %report.object, "{mismatch}");
    }
}
