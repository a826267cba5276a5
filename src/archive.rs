//! Zip container access for .capx files
//!
//! The container format is append-oriented, so updating one entry rebuilds
//! the whole archive: every other entry is copied raw into a sibling temp
//! file (preserving the archive comment), the replacement is appended
//! deflated, and the temp file is swapped over the original. A failure
//! before the swap leaves the original archive untouched.

use crate::errors::ArchiveError;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Read one named entry out of the archive as UTF-8 text.
pub fn read_entry(path: &Path, entry: &str) -> Result<String, ArchiveError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry_file = match archive.by_name(entry) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => {
            return Err(ArchiveError::MissingEntry {
                entry: entry.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    entry_file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Replace one entry, leaving all other entries and the archive comment
/// unchanged.
pub fn replace_entry(path: &Path, entry: &str, data: &[u8]) -> Result<(), ArchiveError> {
    let mut reader = ZipArchive::new(File::open(path)?)?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = ZipWriter::new(tmp.reopen()?);
    writer.set_raw_comment(reader.comment().to_vec());

    for i in 0..reader.len() {
        let item = reader.by_index_raw(i)?;
        if item.name() != entry {
            writer.raw_copy_file(item)?;
        }
    }

    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(entry, options)?;
    writer.write_all(data)?;
    writer.finish()?;

    log::debug!("replacing entry '{}' in {}", entry, path.display());
    tmp.persist(path).map_err(|e| ArchiveError::Io(e.error))?;
    Ok(())
}
