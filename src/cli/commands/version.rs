use std::path::Path;

use k8s_openapi::apimachinery::pkg::version::Info;
use serde::Serialize;

use crate::adapters::kubeconfig::kubeconfig_store::KubeconfigStore;
use crate::cli::VersionFormat;
use crate::core::errors::{KonfigError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientVersion {
    git_version: String,
    platform: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionReport {
    client_version: ClientVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_version: Option<Info>,
}

/// Execute the `konfig version` command.
///
/// Prints the client version and, unless `client_only`, the version
/// reported by the API server of the selected context.
pub fn execute(
    client_only: bool,
    short: bool,
    format: Option<VersionFormat>,
    kubeconfig: Option<&Path>,
    context: Option<&str>,
) -> Result<()> {
    let server_version = if client_only {
        None
    } else {
        Some(server_version(kubeconfig, context)?)
    };
    let report = VersionReport {
        client_version: client_version(),
        server_version,
    };

    print!("{}", render(&report, short, format)?);
    Ok(())
}

fn client_version() -> ClientVersion {
    ClientVersion {
        git_version: format!("v{}", env!("CARGO_PKG_VERSION")),
        platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
    }
}

fn server_version(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Info> {
    let store = KubeconfigStore::load(kubeconfig, context.map(String::from))?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| KonfigError::ApiServer {
            reason: format!("Failed to create async runtime: {e}"),
        })?;

    rt.block_on(async {
        let client = store.client().await?;
        client
            .apiserver_version()
            .await
            .map_err(|e| KonfigError::ApiServer {
                reason: e.to_string(),
            })
    })
}

fn render(report: &VersionReport, short: bool, format: Option<VersionFormat>) -> Result<String> {
    let serialization = |what: &str, e: &dyn std::fmt::Display| KonfigError::Serialization {
        what: what.into(),
        reason: e.to_string(),
    };

    match format {
        Some(VersionFormat::Json) => serde_json::to_string_pretty(report)
            .map(|s| s + "\n")
            .map_err(|e| serialization("version (json)", &e)),
        Some(VersionFormat::Yaml) => {
            serde_yaml::to_string(report).map_err(|e| serialization("version (yaml)", &e))
        }
        None => {
            let client = &report.client_version;
            let mut text = if short {
                format!("Client Version: {}\n", client.git_version)
            } else {
                format!(
                    "Client Version: {} ({})\n",
                    client.git_version, client.platform
                )
            };
            if let Some(server) = &report.server_version {
                if short {
                    text.push_str(&format!("Server Version: {}\n", server.git_version));
                } else {
                    text.push_str(&format!(
                        "Server Version: {} ({})\n",
                        server.git_version, server.platform
                    ));
                }
            }
            Ok(text)
        }
    }
}
