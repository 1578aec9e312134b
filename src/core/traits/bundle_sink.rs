use crate::core::errors::Result;

/// Port for delivering the rendered credential bundle.
pub trait BundleSink: Send + Sync {
    /// Write the complete bundle text. Called at most once per run.
    fn deliver(&self, content: &str) -> Result<()>;

    /// Where the bundle goes, for status messages (e.g. a path or "stdout").
    fn describe(&self) -> String;
}
