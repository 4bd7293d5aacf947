//! DICOM file discovery

use crate::error::Result;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively lists the DICOM files under `root`, sorted
///
/// Files ending in `.dcm` or `.dicom` are taken as is; files without an
/// extension are kept if they carry the DICOM header. Unreadable
/// directory entries are skipped with a warning.
///
/// # Errors
///
/// Returns an error if `root` itself cannot be read
pub fn collect_dicom_files(root: &Path) -> Result<Vec<PathBuf>> {
    std::fs::metadata(root)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error accessing entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") => {
                files.push(path.to_path_buf());
            }
            Some(_) => {}
            None => {
                if is_dicom_file(path) {
                    debug!("Found headerless DICOM file: {}", path.display());
                    files.push(path.to_path_buf());
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Checks for the `DICM` magic after the 128-byte preamble
pub fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}
