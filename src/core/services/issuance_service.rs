use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::core::errors::{KonfigError, Result};
use crate::core::models::credential_bundle::CredentialBundle;
use crate::core::models::identity::Identity;
use crate::core::models::key_material::KeyMaterial;
use crate::core::models::pem_envelope::{self, CERTIFICATE_LABEL};
use crate::core::models::signing_request::SigningRequestRecord;
use crate::core::services::bundle_assembler::BundleAssembler;
use crate::core::traits::bundle_sink::BundleSink;
use crate::core::traits::connection_store::ConnectionStore;
use crate::core::traits::gateway::SigningRequestGateway;
use crate::core::traits::request_generator::RequestGenerator;

/// Steps of one issuance run, in order. Any step may end the run in
/// failure instead of advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStage {
    Start,
    Purging,
    Submitting,
    Approving,
    FetchingCertificate,
    AssemblingBundle,
    CleaningUp,
    Done,
}

impl fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssuanceStage::Start => "start",
            IssuanceStage::Purging => "purging",
            IssuanceStage::Submitting => "submitting",
            IssuanceStage::Approving => "approving",
            IssuanceStage::FetchingCertificate => "fetching-certificate",
            IssuanceStage::AssemblingBundle => "assembling-bundle",
            IssuanceStage::CleaningUp => "cleaning-up",
            IssuanceStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Timing knobs for the certificate wait.
#[derive(Debug, Clone)]
pub struct IssuanceSettings {
    /// How long to wait for the signer after approval. Zero means the
    /// certificate must come back with the approval response. A timeout
    /// too large to represent as a deadline means no deadline.
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

/// Outcome of removing the signing request after delivery.
#[derive(Debug)]
pub enum Cleanup {
    Removed,
    /// Always a `CleanupFailed` error.
    Failed(KonfigError),
}

/// A delivered credential. The bundle has already been handed to the sink;
/// `cleanup` tells whether the remote request was removed afterwards.
#[derive(Debug)]
pub struct Issuance {
    pub request_name: String,
    pub bundle: CredentialBundle,
    pub cleanup: Cleanup,
}

impl Issuance {
    pub fn context_name(&self) -> &str {
        &self.bundle.current_context
    }
}

/// Drives one signing request from submission to a delivered kubeconfig.
///
/// Purge a stale request of the same name, submit a fresh one, approve it,
/// wait for the certificate, assemble and deliver the bundle, then delete
/// the request. Once this run has created a request, every failure path
/// deletes it again before returning the error.
pub struct IssuanceService<R: RequestGenerator, G: SigningRequestGateway, S: ConnectionStore> {
    pub generator: R,
    pub gateway: G,
    pub store: S,
    pub assembler: BundleAssembler,
    pub settings: IssuanceSettings,
}

impl<R: RequestGenerator, G: SigningRequestGateway, S: ConnectionStore> IssuanceService<R, G, S> {
    /// Issue a credential for `identity` and deliver it through `sink`.
    pub async fn issue(&self, identity: &Identity, sink: &dyn BundleSink) -> Result<Issuance> {
        let name = identity.request_name();
        enter(&name, IssuanceStage::Start);

        self.purge_stale(&name).await;

        enter(&name, IssuanceStage::Submitting);
        let (key, request) = self.generator.generate(identity)?;
        debug!(request = %name, der_bytes = request.der().len(), "generated certificate request");
        let record = self
            .gateway
            .create(&name, identity, request.pem().as_bytes())
            .await?;
        info!(request = %name, "submitted signing request for {identity}");

        match self.deliver(&name, identity, record, &key, sink).await {
            Ok(bundle) => {
                enter(&name, IssuanceStage::CleaningUp);
                let cleanup = match self.remove(&name).await {
                    Ok(()) => Cleanup::Removed,
                    Err(e) => Cleanup::Failed(KonfigError::CleanupFailed {
                        name: name.clone(),
                        reason: e.to_string(),
                    }),
                };
                enter(&name, IssuanceStage::Done);
                Ok(Issuance {
                    request_name: name,
                    bundle,
                    cleanup,
                })
            }
            Err(err) => {
                self.teardown(&name).await;
                Err(err)
            }
        }
    }

    /// Remove a request left behind by an earlier run. Failures here are
    /// logged only; a real conflict surfaces on create as `AlreadyExists`.
    async fn purge_stale(&self, name: &str) {
        enter(name, IssuanceStage::Purging);
        match self.gateway.get(name).await {
            Ok(_) => {
                info!(request = %name, "removing stale signing request");
                if let Err(e) = self.remove(name).await {
                    warn!(request = %name, "could not remove stale signing request: {e}");
                }
            }
            Err(e) if e.is_not_found() => debug!(request = %name, "no stale signing request"),
            Err(e) => warn!(request = %name, "could not look up stale signing request: {e}"),
        }
    }

    async fn deliver(
        &self,
        name: &str,
        identity: &Identity,
        mut record: SigningRequestRecord,
        key: &KeyMaterial,
        sink: &dyn BundleSink,
    ) -> Result<CredentialBundle> {
        enter(name, IssuanceStage::Approving);
        record.approve();
        let approved = self.gateway.approve(name, &record).await?;
        info!(request = %name, "approved signing request");

        enter(name, IssuanceStage::FetchingCertificate);
        let certificate = self.await_certificate(name, approved).await?;
        pem_envelope::decode_pem(CERTIFICATE_LABEL, &certificate)?;

        enter(name, IssuanceStage::AssemblingBundle);
        let current = self.store.current_context()?;
        debug!(
            request = %name,
            context = %current.context_name,
            cluster = %current.cluster_name,
            "resolved current context"
        );
        let bundle = self
            .assembler
            .build(&current, identity.common_name(), &certificate, key);
        sink.deliver(&bundle.to_yaml()?)?;
        info!(
            request = %name,
            context = %bundle.current_context,
            "kubeconfig written to {}",
            sink.describe()
        );

        Ok(bundle)
    }

    /// Return the issued certificate, polling until `wait_timeout` if the
    /// approval response did not carry it yet.
    async fn await_certificate(&self, name: &str, approved: SigningRequestRecord) -> Result<Vec<u8>> {
        let deadline = Instant::now().checked_add(self.settings.wait_timeout);
        let mut record = approved;

        loop {
            if let Some(condition) = record.rejection() {
                return Err(KonfigError::ApprovalRejected {
                    name: name.to_string(),
                    reason: format!(
                        "{} ({})",
                        condition.type_,
                        condition
                            .message
                            .as_deref()
                            .or(condition.reason.as_deref())
                            .unwrap_or("no reason given")
                    ),
                });
            }
            if let Some(certificate) = record.issued_certificate() {
                return Ok(certificate.to_vec());
            }

            let mut pause = self.settings.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(KonfigError::CertificateNotIssued {
                        name: name.to_string(),
                        waited_secs: self.settings.wait_timeout.as_secs(),
                    });
                }
                pause = pause.min(deadline - now);
            }

            debug!(request = %name, state = ?record.state(), "certificate not issued yet, polling");
            tokio::time::sleep(pause).await;
            record = self.gateway.get(name).await?;
        }
    }

    /// Delete the request, counting an already-missing request as removed.
    async fn remove(&self, name: &str) -> Result<()> {
        match self.gateway.delete(name).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Best-effort delete after a failure; never masks the original error.
    async fn teardown(&self, name: &str) {
        match self.remove(name).await {
            Ok(()) => debug!(request = %name, "removed signing request after failure"),
            Err(e) => warn!(request = %name, "could not remove signing request after failure: {e}"),
        }
    }
}

fn enter(name: &str, stage: IssuanceStage) {
    debug!(request = %name, %stage, "issuance stage");
}
