use std::io::Write;

use crate::core::errors::Result;
use crate::core::traits::bundle_sink::BundleSink;

/// Writes the bundle to standard output so it can be piped or redirected.
/// Status messages go to stderr and never mix with it.
pub struct StdoutSink;

impl BundleSink for StdoutSink {
    fn deliver(&self, content: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(content.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        "stdout".into()
    }
}
