/// Condition type the authority uses to mark a request approved.
pub const APPROVED: &str = "Approved";
/// Condition type for a request an approver refused.
pub const DENIED: &str = "Denied";
/// Condition type for a request the signer could not sign.
pub const FAILED: &str = "Failed";

/// Reason attached to the approval condition written by konfig.
pub const APPROVAL_REASON: &str = "KonfigCertApprove";
/// Message attached to the approval condition written by konfig.
pub const APPROVAL_MESSAGE: &str = "This CSR was approved by konfig cert approve.";

/// Where a signing request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Approved,
    Issued,
    /// Denied or failed; no certificate will follow.
    Rejected,
}

/// One entry of the request's condition list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCondition {
    pub type_: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl RequestCondition {
    /// The approval condition konfig attaches to its own requests.
    pub fn approval() -> Self {
        Self {
            type_: APPROVED.into(),
            status: "True".into(),
            reason: Some(APPROVAL_REASON.into()),
            message: Some(APPROVAL_MESSAGE.into()),
        }
    }

    fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Local view of the remote signing request resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequestRecord {
    pub name: String,
    pub username: String,
    pub groups: Vec<String>,
    /// PEM-encoded PKCS#10 request as submitted.
    pub request: Vec<u8>,
    pub signer_name: String,
    pub usages: Vec<String>,
    pub expiration_seconds: Option<i32>,
    /// Opaque version token, echoed back on approval.
    pub resource_version: Option<String>,
    pub conditions: Vec<RequestCondition>,
    /// PEM-encoded certificate once the signer has issued it.
    pub certificate: Option<Vec<u8>>,
}

impl SigningRequestRecord {
    /// Replace any approval condition with konfig's own.
    ///
    /// Afterwards the condition list holds exactly one `Approved` entry.
    pub fn approve(&mut self) {
        self.conditions.retain(|c| c.type_ != APPROVED);
        self.conditions.push(RequestCondition::approval());
    }

    /// The issued certificate, if the signer has populated it.
    pub fn issued_certificate(&self) -> Option<&[u8]> {
        self.certificate.as_deref().filter(|c| !c.is_empty())
    }

    /// The first `Denied` or `Failed` condition, if any.
    pub fn rejection(&self) -> Option<&RequestCondition> {
        self.conditions
            .iter()
            .find(|c| (c.type_ == DENIED || c.type_ == FAILED) && c.is_true())
    }

    pub fn state(&self) -> RequestState {
        if self.rejection().is_some() {
            RequestState::Rejected
        } else if self.issued_certificate().is_some() {
            RequestState::Issued
        } else if self
            .conditions
            .iter()
            .any(|c| c.type_ == APPROVED && c.is_true())
        {
            RequestState::Approved
        } else {
            RequestState::Pending
        }
    }
}
