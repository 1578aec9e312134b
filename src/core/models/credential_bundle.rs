use std::collections::BTreeMap;

use kube::config::Cluster;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};

use crate::core::errors::{KonfigError, Result};

/// The caller's selected context, resolved down to its cluster.
///
/// The cluster entry is kept exactly as read, so a bundle reproduces the
/// endpoint field for field (`certificate-authority-data` stays base64
/// text, extensions included).
#[derive(Debug, Clone)]
pub struct CurrentContext {
    pub context_name: String,
    pub cluster_name: String,
    pub cluster: Cluster,
}

/// A ready-to-use kubeconfig with one cluster, one user and one context.
#[derive(Debug, Serialize)]
pub struct CredentialBundle {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub users: Vec<NamedUser>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub preferences: BTreeMap<String, String>,
}

impl CredentialBundle {
    /// Render the bundle as a kubeconfig YAML document.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| KonfigError::Serialization {
            what: "kubeconfig".into(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Debug, Serialize)]
pub struct NamedUser {
    pub name: String,
    pub user: ClientCredentials,
}

/// Client certificate and key, each base64 of the PEM text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientCredentials {
    pub client_certificate_data: String,
    #[serde(serialize_with = "expose_secret")]
    pub client_key_data: SecretString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
    pub namespace: String,
}

fn expose_secret<S: Serializer>(
    secret: &SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_is_redacted_in_debug_but_serialized() {
        let creds = ClientCredentials {
            client_certificate_data: "Y2VydA==".into(),
            client_key_data: SecretString::from("a2V5".to_string()),
        };
        assert!(!format!("{creds:?}").contains("a2V5"));

        let yaml = serde_yaml::to_string(&creds).unwrap();
        assert!(yaml.contains("client-key-data: a2V5"));
        assert!(yaml.contains("client-certificate-data: Y2VydA=="));
    }
}
