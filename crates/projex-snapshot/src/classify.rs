//! Binary detection and text decoding for captured files.

use crate::FileContent;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::warn;

/// Number of leading bytes inspected for a NUL byte.
pub const BINARY_PROBE_LEN: usize = 2048;

/// Whether a file prefix looks binary.
///
/// Only the first [`BINARY_PROBE_LEN`] bytes are considered. Formats without
/// NUL bytes in that window are treated as text.
pub fn is_binary(prefix: &[u8]) -> bool {
    prefix.iter().take(BINARY_PROBE_LEN).any(|&byte| byte == 0)
}

/// Capture a file's content.
///
/// Never fails: open or read errors become [`FileContent::Unreadable`].
pub fn classify(path: &Path) -> FileContent {
    match read_content(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unable to read file");
            FileContent::Unreadable(e.to_string())
        }
    }
}

fn read_content(path: &Path) -> io::Result<FileContent> {
    let mut file = File::open(path)?;

    let mut bytes = Vec::with_capacity(BINARY_PROBE_LEN);
    (&mut file)
        .take(BINARY_PROBE_LEN as u64)
        .read_to_end(&mut bytes)?;
    if is_binary(&bytes) {
        return Ok(FileContent::Binary);
    }

    file.read_to_end(&mut bytes)?;
    Ok(FileContent::Text(decode_lossy(bytes)))
}

fn decode_lossy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
