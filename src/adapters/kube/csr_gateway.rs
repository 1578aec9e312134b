use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::ByteString;
use k8s_openapi::api::certificates::v1::{
    CertificateSigningRequest, CertificateSigningRequestCondition, CertificateSigningRequestSpec,
    CertificateSigningRequestStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::api::{Api, DeleteParams, PostParams};
use tracing::debug;

use crate::core::errors::{KonfigError, Result};
use crate::core::models::identity::Identity;
use crate::core::models::signing_request::{RequestCondition, SigningRequestRecord};
use crate::core::traits::gateway::SigningRequestGateway;

/// Built-in signer for client certificates trusted by the API server.
pub const DEFAULT_SIGNER_NAME: &str = "kubernetes.io/kube-apiserver-client";

/// One year, the lifetime requested unless configured otherwise.
pub const DEFAULT_EXPIRATION_SECONDS: i32 = 60 * 60 * 24 * 365;

/// Shortest lifetime the API server accepts for `expirationSeconds`.
pub const MIN_EXPIRATION_SECONDS: i32 = 600;

const CLIENT_AUTH_USAGE: &str = "client auth";
const CREATOR_ANNOTATION: &str = "creator";
const CREATOR: &str = "konfig.local.io";

/// What konfig asks the signer for on every request.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub signer_name: String,
    pub expiration_seconds: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Get,
    Create,
    Approve,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Approve => "approve",
            Operation::Delete => "delete",
        })
    }
}

/// `certificates.k8s.io/v1` CertificateSigningRequest gateway.
pub struct KubeCsrGateway {
    api: Api<CertificateSigningRequest>,
    settings: GatewaySettings,
}

impl KubeCsrGateway {
    pub fn new(client: Client, settings: GatewaySettings) -> Self {
        Self {
            api: Api::all(client),
            settings,
        }
    }
}

impl SigningRequestGateway for KubeCsrGateway {
    async fn get(&self, name: &str) -> Result<SigningRequestRecord> {
        debug!(request = %name, "GET certificatesigningrequest");
        let csr = self
            .api
            .get(name)
            .await
            .map_err(|e| map_error(Operation::Get, name, e))?;
        Ok(to_record(csr))
    }

    async fn create(
        &self,
        name: &str,
        identity: &Identity,
        request_pem: &[u8],
    ) -> Result<SigningRequestRecord> {
        debug!(request = %name, signer = %self.settings.signer_name, "POST certificatesigningrequest");
        let csr = pending_resource(name, identity, request_pem, &self.settings);
        let created = self
            .api
            .create(&PostParams::default(), &csr)
            .await
            .map_err(|e| map_error(Operation::Create, name, e))?;
        Ok(to_record(created))
    }

    async fn approve(
        &self,
        name: &str,
        record: &SigningRequestRecord,
    ) -> Result<SigningRequestRecord> {
        debug!(request = %name, "PUT certificatesigningrequest/approval");
        let body = serde_json::to_vec(&to_resource(record)).map_err(|e| {
            KonfigError::Serialization {
                what: format!("signing request '{name}'"),
                reason: e.to_string(),
            }
        })?;
        let approved = self
            .api
            .replace_subresource("approval", name, &PostParams::default(), body)
            .await
            .map_err(|e| map_error(Operation::Approve, name, e))?;
        Ok(to_record(approved))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        debug!(request = %name, "DELETE certificatesigningrequest");
        let params = DeleteParams {
            grace_period_seconds: Some(0),
            ..Default::default()
        };
        self.api
            .delete(name, &params)
            .await
            .map_err(|e| map_error(Operation::Delete, name, e))?;
        Ok(())
    }
}

/// Translate a client error into the domain taxonomy.
///
/// Approval failures of any API status count as a rejection, including a
/// request that vanished in the meantime.
fn map_error(operation: Operation, name: &str, err: kube::Error) -> KonfigError {
    let name = name.to_string();
    match err {
        kube::Error::Api(ae) if operation == Operation::Approve => KonfigError::ApprovalRejected {
            name,
            reason: format!("{} ({})", ae.message, ae.reason),
        },
        kube::Error::Api(ae) if ae.code == 404 => KonfigError::NotFound {
            name,
            operation: operation.to_string(),
        },
        kube::Error::Api(ae) if operation == Operation::Create && ae.code == 409 => {
            KonfigError::AlreadyExists { name }
        }
        kube::Error::Api(ae) if operation == Operation::Create => KonfigError::SubmissionRejected {
            name,
            reason: format!("{} ({})", ae.message, ae.reason),
        },
        other => KonfigError::Remote {
            operation: capitalize(operation),
            name,
            reason: other.to_string(),
        },
    }
}

fn capitalize(operation: Operation) -> String {
    let text = operation.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

/// The resource konfig submits for a fresh request.
fn pending_resource(
    name: &str,
    identity: &Identity,
    request_pem: &[u8],
    settings: &GatewaySettings,
) -> CertificateSigningRequest {
    CertificateSigningRequest {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            annotations: Some(BTreeMap::from([(
                CREATOR_ANNOTATION.to_string(),
                CREATOR.to_string(),
            )])),
            ..Default::default()
        },
        spec: CertificateSigningRequestSpec {
            request: ByteString(request_pem.to_vec()),
            signer_name: settings.signer_name.clone(),
            usages: Some(vec![CLIENT_AUTH_USAGE.to_string()]),
            username: Some(identity.common_name().to_string()),
            groups: Some(identity.groups().to_vec()),
            expiration_seconds: settings.expiration_seconds,
            ..Default::default()
        },
        status: None,
    }
}

fn to_record(csr: CertificateSigningRequest) -> SigningRequestRecord {
    let status = csr.status.unwrap_or_default();
    SigningRequestRecord {
        name: csr.metadata.name.unwrap_or_default(),
        username: csr.spec.username.unwrap_or_default(),
        groups: csr.spec.groups.unwrap_or_default(),
        request: csr.spec.request.0,
        signer_name: csr.spec.signer_name,
        usages: csr.spec.usages.unwrap_or_default(),
        expiration_seconds: csr.spec.expiration_seconds,
        resource_version: csr.metadata.resource_version,
        conditions: status
            .conditions
            .unwrap_or_default()
            .into_iter()
            .map(|c| RequestCondition {
                type_: c.type_,
                status: c.status,
                reason: c.reason,
                message: c.message,
            })
            .collect(),
        certificate: status.certificate.map(|c| c.0),
    }
}

/// The full resource for a record, as sent on approval.
fn to_resource(record: &SigningRequestRecord) -> CertificateSigningRequest {
    let conditions = record
        .conditions
        .iter()
        .map(|c| CertificateSigningRequestCondition {
            type_: c.type_.clone(),
            status: c.status.clone(),
            reason: c.reason.clone(),
            message: c.message.clone(),
            ..Default::default()
        })
        .collect();

    CertificateSigningRequest {
        metadata: ObjectMeta {
            name: Some(record.name.clone()),
            resource_version: record.resource_version.clone(),
            ..Default::default()
        },
        spec: CertificateSigningRequestSpec {
            request: ByteString(record.request.clone()),
            signer_name: record.signer_name.clone(),
            usages: Some(record.usages.clone()),
            username: Some(record.username.clone()),
            groups: Some(record.groups.clone()),
            expiration_seconds: record.expiration_seconds,
            ..Default::default()
        },
        status: Some(CertificateSigningRequestStatus {
            conditions: Some(conditions),
            certificate: record.certificate.clone().map(ByteString),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::signing_request::{APPROVAL_MESSAGE, APPROVAL_REASON};

    fn settings() -> GatewaySettings {
        GatewaySettings {
            signer_name: DEFAULT_SIGNER_NAME.into(),
            expiration_seconds: Some(DEFAULT_EXPIRATION_SECONDS),
        }
    }

    fn alice() -> Identity {
        Identity::new("alice", vec!["dev".into(), "ops".into()]).unwrap()
    }

    fn api_error(code: u16, reason: &str) -> kube::Error {
        let response: kube::core::ErrorResponse = serde_json::from_value(serde_json::json!({
            "status": "Failure",
            "message": format!("certificatesigningrequests \"alice:dev:ops\" {reason}"),
            "reason": reason,
            "code": code,
        }))
        .unwrap();
        kube::Error::Api(response)
    }

    #[test]
    fn pending_resource_matches_submission_contract() {
        let csr = pending_resource(
            "alice:dev:ops",
            &alice(),
            b"-----BEGIN CERTIFICATE REQUEST-----",
            &settings(),
        );

        assert_eq!(csr.metadata.name.as_deref(), Some("alice:dev:ops"));
        assert_eq!(
            csr.metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get("creator"))
                .map(String::as_str),
            Some("konfig.local.io")
        );
        assert_eq!(csr.spec.signer_name, DEFAULT_SIGNER_NAME);
        assert_eq!(csr.spec.usages, Some(vec!["client auth".to_string()]));
        assert_eq!(csr.spec.username.as_deref(), Some("alice"));
        assert_eq!(
            csr.spec.groups,
            Some(vec!["dev".to_string(), "ops".to_string()])
        );
        assert_eq!(csr.spec.expiration_seconds, Some(DEFAULT_EXPIRATION_SECONDS));
        assert!(csr.status.is_none());
    }

    #[test]
    fn record_round_trips_through_resource() {
        let created = pending_resource(
            "alice:dev:ops",
            &alice(),
            b"request",
            &settings(),
        );
        let mut record = to_record(created);
        record.resource_version = Some("4242".into());
        record.approve();

        let resource = to_resource(&record);
        assert_eq!(resource.metadata.resource_version.as_deref(), Some("4242"));
        let conditions = resource
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].type_, "Approved");
        assert_eq!(conditions[0].status, "True");
        assert_eq!(conditions[0].reason.as_deref(), Some(APPROVAL_REASON));
        assert_eq!(conditions[0].message.as_deref(), Some(APPROVAL_MESSAGE));

        assert_eq!(to_record(resource), record);
    }

    #[test]
    fn issued_certificate_is_read_from_status() {
        let mut csr = pending_resource("alice:dev", &alice(), b"req", &settings());
        csr.status = Some(CertificateSigningRequestStatus {
            certificate: Some(ByteString(b"-----BEGIN CERTIFICATE-----".to_vec())),
            conditions: None,
        });

        let record = to_record(csr);
        assert_eq!(
            record.issued_certificate(),
            Some(&b"-----BEGIN CERTIFICATE-----"[..])
        );
    }

    #[test]
    fn approval_body_serializes_as_csr_object() {
        let mut record = to_record(pending_resource(
            "alice:dev",
            &alice(),
            b"req",
            &settings(),
        ));
        record.approve();

        let body: serde_json::Value = serde_json::to_value(to_resource(&record)).unwrap();
        assert_eq!(body["apiVersion"], "certificates.k8s.io/v1");
        assert_eq!(body["kind"], "CertificateSigningRequest");
        assert_eq!(body["status"]["conditions"][0]["type"], "Approved");
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let err = map_error(Operation::Get, "alice:dev:ops", api_error(404, "NotFound"));
        assert!(err.is_not_found());

        let err = map_error(Operation::Delete, "alice:dev:ops", api_error(404, "NotFound"));
        assert!(err.is_not_found());
    }

    #[test]
    fn create_conflict_maps_to_already_exists() {
        let err = map_error(
            Operation::Create,
            "alice:dev:ops",
            api_error(409, "AlreadyExists"),
        );
        assert!(matches!(err, KonfigError::AlreadyExists { .. }));
    }

    #[test]
    fn create_refusal_maps_to_submission_rejected() {
        let err = map_error(Operation::Create, "alice:dev:ops", api_error(422, "Invalid"));
        assert!(matches!(err, KonfigError::SubmissionRejected { .. }));
    }

    #[test]
    fn any_approval_failure_is_a_rejection() {
        for (code, reason) in [(403, "Forbidden"), (404, "NotFound"), (409, "Conflict")] {
            let err = map_error(Operation::Approve, "alice:dev:ops", api_error(code, reason));
            assert!(
                matches!(err, KonfigError::ApprovalRejected { .. }),
                "{code} should be a rejection"
            );
        }
    }

    #[test]
    fn other_statuses_are_remote_failures() {
        let err = map_error(Operation::Delete, "alice:dev:ops", api_error(403, "Forbidden"));
        match err {
            KonfigError::Remote { operation, name, .. } => {
                assert_eq!(operation, "Delete");
                assert_eq!(name, "alice:dev:ops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
