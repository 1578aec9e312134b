use std::path::Path;

use crate::adapters::crypto::rsa_generator::RsaRequestGenerator;
use crate::adapters::kube::csr_gateway::{GatewaySettings, KubeCsrGateway};
use crate::adapters::kubeconfig::kubeconfig_store::KubeconfigStore;
use crate::adapters::output::file_sink::FileSink;
use crate::adapters::output::stdout_sink::StdoutSink;
use crate::cli::CertArgs;
use crate::cli::output;
use crate::config::app_config::{AppConfig, CertSection};
use crate::core::errors::{KonfigError, Result};
use crate::core::models::identity::Identity;
use crate::core::services::bundle_assembler::BundleAssembler;
use crate::core::services::issuance_service::{Cleanup, IssuanceService, IssuanceSettings};
use crate::core::traits::bundle_sink::BundleSink;

/// Execute the `konfig cert` command.
///
/// Generates a key and request for the user, runs it through the cluster's
/// signing request flow and writes the resulting kubeconfig to `--output`
/// or stdout. Everything is validated locally before the cluster is
/// contacted.
pub fn execute(
    args: &CertArgs,
    kubeconfig: Option<&Path>,
    context: Option<&str>,
    config: Option<&Path>,
) -> Result<()> {
    let settings = effective_settings(AppConfig::load(config)?.cert, args)?;
    let identity = Identity::new(args.username.as_str(), args.groups.clone())?;

    let store = KubeconfigStore::load(kubeconfig, context.map(String::from))?;
    let generator = RsaRequestGenerator::new(settings.key_bits)?;
    let sink: Box<dyn BundleSink> = match &args.output {
        Some(path) => Box::new(FileSink::new(path.clone())),
        None => Box::new(StdoutSink),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| KonfigError::InvalidConfig {
            detail: format!("Failed to create async runtime: {e}"),
        })?;

    let issuance = rt.block_on(async {
        let client = store.client().await?;
        let service = IssuanceService {
            generator,
            gateway: KubeCsrGateway::new(
                client,
                GatewaySettings {
                    signer_name: settings.signer_name.clone(),
                    expiration_seconds: Some(settings.expiration_seconds),
                },
            ),
            store,
            assembler: BundleAssembler {
                namespace: settings.namespace.clone(),
            },
            settings: IssuanceSettings {
                wait_timeout: settings.wait_timeout(),
                poll_interval: settings.poll_interval(),
            },
        };

        let spinner = output::spinner(&format!("Issuing certificate for {identity}..."));
        let result = service.issue(&identity, sink.as_ref()).await;
        spinner.finish_and_clear();
        result
    })?;

    if args.output.is_some() {
        output::success(&format!(
            "Kubeconfig for {identity} written to {}",
            sink.describe()
        ));
        output::detail(&format!("context: {}", issuance.context_name()));
    }

    match issuance.cleanup {
        Cleanup::Removed => {
            tracing::info!(request = %issuance.request_name, "signing request removed");
            Ok(())
        }
        Cleanup::Failed(e) => {
            output::warning("Credential delivered, but cleanup did not complete");
            Err(e)
        }
    }
}

/// Config file values with command-line flags applied on top.
fn effective_settings(mut settings: CertSection, args: &CertArgs) -> Result<CertSection> {
    if let Some(expiration) = args.expiration {
        settings.expiration_seconds = expiration;
    }
    if let Some(wait) = args.wait_timeout {
        settings.wait_timeout_secs = wait;
    }
    if let Some(namespace) = &args.namespace {
        settings.namespace = namespace.clone();
    }
    settings.validate()?;
    Ok(settings)
}
