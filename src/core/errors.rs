use std::path::PathBuf;

/// All domain errors for konfig.
///
/// Remote failures carry the request name and the operation that was
/// attempted, so the message printed on stderr is enough to find the
/// offending resource with `kubectl get csr <name>`.
#[derive(Debug, thiserror::Error)]
pub enum KonfigError {
    #[error("Key or request generation failed: {reason}")]
    GenerationFailed { reason: String },

    #[error(
        "Signing request '{name}' already exists\n\n  \
         Another issuance for the same user and groups is in progress,\n  \
         or a previous run left the request behind and it could not be purged.\n\n  \
         Solutions:\n    \
         → Wait for the other run to finish, then try again\n    \
         → Remove it manually: kubectl delete csr {name}"
    )]
    AlreadyExists { name: String },

    #[error("Signing request '{name}' was rejected on create: {reason}")]
    SubmissionRejected { name: String, reason: String },

    #[error(
        "Approval of signing request '{name}' was rejected: {reason}\n\n  \
         Approving requests needs the 'approve' verb on the signer, and\n  \
         'update' on certificatesigningrequests/approval.\n  \
         Check your permissions: kubectl auth can-i update certificatesigningrequests/approval"
    )]
    ApprovalRejected { name: String, reason: String },

    #[error("Signing request '{name}' not found during {operation}")]
    NotFound { name: String, operation: String },

    #[error(
        "No usable current context in the connection configuration: {detail}\n\n  \
         Select one first: kubectl config use-context <name>\n  \
         Or pass --context <name>."
    )]
    MissingCurrentContext { detail: String },

    #[error(
        "The credential was delivered, but signing request '{name}' could not be removed: {reason}\n\n  \
         Remove it manually: kubectl delete csr {name}"
    )]
    CleanupFailed { name: String, reason: String },

    #[error(
        "Signing request '{name}' was approved but no certificate was issued within {waited_secs}s\n\n  \
         Is a signer running for this signer name?\n  \
         Raise the limit with --wait-timeout <seconds>."
    )]
    CertificateNotIssued { name: String, waited_secs: u64 },

    #[error("Malformed {label} PEM: {reason}")]
    MalformedPem { label: String, reason: String },

    #[error("Invalid identity: {detail}")]
    InvalidIdentity { detail: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("{operation} of signing request '{name}' failed: {reason}")]
    Remote {
        operation: String,
        name: String,
        reason: String,
    },

    #[error("Could not query the API server: {reason}")]
    ApiServer { reason: String },

    #[error("Failed to serialize {what}: {reason}")]
    Serialization { what: String, reason: String },

    #[error("Failed to write {}: {reason}", path.display())]
    OutputFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KonfigError {
    /// True for the "resource is gone" case, which purge and cleanup
    /// treat as success.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KonfigError::NotFound { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KonfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected() {
        let err = KonfigError::NotFound {
            name: "alice:dev".into(),
            operation: "delete".into(),
        };
        assert!(err.is_not_found());

        let err = KonfigError::AlreadyExists {
            name: "alice:dev".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn messages_name_the_request() {
        let err = KonfigError::CleanupFailed {
            name: "alice:dev:ops".into(),
            reason: "forbidden".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("alice:dev:ops"));
        assert!(msg.contains("kubectl delete csr alice:dev:ops"));
    }
}
