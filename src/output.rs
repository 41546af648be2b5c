//! File helpers shared by both pipelines.

use chrono::Local;
use std::path::Path;
use tracing::debug;

use crate::error::{ExportError, Result};

/// Local time in ISO-8601 form, written into generated file headers.
pub fn generation_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Overwrites `path` with `content`.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| ExportError::io(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "Wrote file");
    Ok(())
}

/// Reads a UTF-8 file.
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))
}
