use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Readers never observe a half-written ledger.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Read a file, treating a missing file as empty.
pub fn read_or_empty(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Append text to a file, creating it (and its parents) if needed.
pub fn append_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    f.write_all(text.as_bytes())?;
    Ok(())
}

/// Outcome of [`upsert_marked_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockUpdate {
    Replaced,
    Appended,
}

/// Put `body` between `start_marker` and `end_marker` in the file at `path`.
///
/// If both markers are present, everything from the start of `start_marker`
/// through the end of `end_marker` is replaced. Otherwise the marked block is
/// appended (creating the file if needed), separated from existing content by
/// a blank line.
pub fn upsert_marked_block(
    path: &Path,
    start_marker: &str,
    end_marker: &str,
    body: &str,
) -> Result<BlockUpdate> {
    let content = read_or_empty(path)?;
    let block = format!("{start_marker}\n{}\n{end_marker}", body.trim_end());

    if let Some(start_pos) = content.find(start_marker) {
        let search_from = start_pos + start_marker.len();
        if let Some(end_offset) = content[search_from..].find(end_marker) {
            let end_pos = search_from + end_offset + end_marker.len();
            let mut updated = String::with_capacity(content.len() + block.len());
            updated.push_str(&content[..start_pos]);
            updated.push_str(&block);
            updated.push_str(&content[end_pos..]);
            atomic_write(path, updated.as_bytes())?;
            return Ok(BlockUpdate::Replaced);
        }
    }

    let sep = if content.is_empty() || content.ends_with("\n\n") {
        ""
    } else if content.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    let mut updated = content;
    updated.push_str(sep);
    updated.push_str(&block);
    updated.push('\n');
    atomic_write(path, updated.as_bytes())?;
    Ok(BlockUpdate::Appended)
}
