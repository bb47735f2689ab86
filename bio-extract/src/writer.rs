//! JSON output of extracted profiles.

use std::fs;
use std::path::Path;

use bio_extract_core::profile::ProfileRecord;

use crate::errors::PipelineError;

/// Renders profiles as a pretty-printed JSON array.
///
/// Two-space indentation, non-ASCII kept literal, no trailing newline.
pub fn render_profiles(profiles: &[ProfileRecord]) -> Result<String, PipelineError> {
    Ok(serde_json::to_string_pretty(profiles)?)
}

/// Writes profiles to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns `PipelineError::Output` if the file cannot be written.
pub fn write_profiles(path: impl AsRef<Path>, profiles: &[ProfileRecord]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let body = render_profiles(profiles)?;
    fs::write(path, body).map_err(|source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    })
}
