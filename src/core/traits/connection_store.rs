use crate::core::errors::Result;
use crate::core::models::credential_bundle::CurrentContext;

/// Port for the persisted connection configuration (a kubeconfig).
///
/// Read-only: konfig never writes back to the store.
pub trait ConnectionStore: Send + Sync {
    /// Resolve the selected context and its cluster entry.
    ///
    /// Fails with `MissingCurrentContext` if no context is selected or the
    /// selected context points at a cluster that is not defined.
    fn current_context(&self) -> Result<CurrentContext>;
}
