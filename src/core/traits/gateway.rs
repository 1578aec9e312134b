use std::future::Future;

use crate::core::errors::Result;
use crate::core::models::identity::Identity;
use crate::core::models::signing_request::SigningRequestRecord;

/// Port for the remote authority that stores signing requests by name.
///
/// Every call is one round trip. Implementations do not cache or retry;
/// retry policy belongs to the caller.
pub trait SigningRequestGateway: Send + Sync {
    /// Look up a request. Fails with `NotFound` if there is none.
    fn get(&self, name: &str) -> impl Future<Output = Result<SigningRequestRecord>> + Send;

    /// Register a new pending request.
    ///
    /// Fails with `AlreadyExists` on a name collision and with
    /// `SubmissionRejected` if the authority refuses the request.
    fn create(
        &self,
        name: &str,
        identity: &Identity,
        request_pem: &[u8],
    ) -> impl Future<Output = Result<SigningRequestRecord>> + Send;

    /// Commit the record's approval condition.
    ///
    /// Fails with `ApprovalRejected` if the authority refuses the approval
    /// or the request no longer exists.
    fn approve(
        &self,
        name: &str,
        record: &SigningRequestRecord,
    ) -> impl Future<Output = Result<SigningRequestRecord>> + Send;

    /// Remove a request. Fails with `NotFound` if it was already gone.
    fn delete(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}
