pub mod types;

pub use types::*;

use std::fs;
use std::io;
use std::path::Path;

/// Read a C# source file from disk and normalize line endings (CRLF → LF).
///
/// Generated text always uses LF, and diagnostics report columns on LF-only content.
pub fn read_source_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let content = fs::read_to_string(path)?;
    if content.contains('\r') {
        Ok(content.replace("\r\n", "\n"))
    } else {
        Ok(content)
    }
}
