//! Build an encrypted vault tree from a local directory.
//!
//! The inverse of browsing: the output directory can be served by any static
//! host (or opened directly with the filesystem transport).
//!
//! ## Mapping
//!
//! ```text
//! source/                      dest/
//! ├── description.txt          (skipped at the root)
//! ├── notes.txt           →    ├── 0-0.enc                file 0, one part
//! ├── movie.mp4           →    ├── 1-0.enc, 1-1.enc, ...  file 1, split by part_size
//! └── trips/              →    ├── 2/                     sub-vault 2
//!     ├── description.txt      │   └── index.vault        "trips" + its description
//!     └── ...                  └── index.vault
//! ```
//!
//! Entries are visited in sorted path order and get ids from a per-directory
//! counter starting at 0, which ends up as the index's `IdCounter`. Hidden
//! entries (leading `.`) are skipped. Parts are encrypted in parallel.

use super::{FileRecord, INDEX_FILE, VaultIndex, VaultRecord};
use crate::crypto::CryptoError;
use crate::crypto::vault::seal_blob;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Per-directory description file, read into the parent's vault record.
pub const DESCRIPTION_FILE: &str = "description.txt";

#[derive(Error, Debug)]
pub enum PackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encryption error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("part size must be non-zero")]
    InvalidPartSize,
    #[error("output {} is inside the source directory {}", dest.display(), source_dir.display())]
    DestInsideSource { source_dir: PathBuf, dest: PathBuf },
}

#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Largest plaintext slice per part, in bytes.
    pub part_size: u64,
    /// Stored as `DateArchived` on every file.
    pub date_archived: String,
}

impl PackOptions {
    /// Options stamped with today's local date.
    pub fn today(part_size: u64) -> Self {
        Self {
            part_size,
            date_archived: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Totals for one pack run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSummary {
    /// Vault directories written, including the root.
    pub vaults: usize,
    pub files: usize,
    pub parts: usize,
    /// Plaintext bytes packed.
    pub bytes: u64,
}

/// Pack `source` into an encrypted vault at `dest`.
pub fn pack(
    source: &Path,
    dest: &Path,
    password: &str,
    options: &PackOptions,
) -> Result<PackSummary, PackError> {
    if !source.is_dir() {
        return Err(PackError::NotADirectory(source.to_path_buf()));
    }
    let part_size = usize::try_from(options.part_size).unwrap_or(usize::MAX);
    if part_size == 0 {
        return Err(PackError::InvalidPartSize);
    }
    let source_abs = fs::canonicalize(source)?;
    let dest_abs = resolve_path(dest)?;
    if dest_abs.starts_with(&source_abs) {
        return Err(PackError::DestInsideSource {
            source_dir: source_abs,
            dest: dest_abs,
        });
    }

    let mut summary = PackSummary::default();
    pack_dir(source, dest, password, part_size, options, &mut summary)?;
    info!(
        source = %source.display(),
        dest = %dest.display(),
        vaults = summary.vaults,
        files = summary.files,
        parts = summary.parts,
        "packed vault"
    );
    Ok(summary)
}

/// Absolute form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the missing tail appended.
fn resolve_path(path: &Path) -> Result<PathBuf, PackError> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    while !existing.exists() {
        let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
            break;
        };
        tail.push(name.to_os_string());
        existing = parent;
    }
    let mut resolved = fs::canonicalize(existing)?;
    resolved.extend(tail.iter().rev());
    Ok(resolved)
}

fn collect_entries(path: &Path) -> Result<Vec<PathBuf>, PackError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            !name.starts_with('.') && name != DESCRIPTION_FILE
        })
        .collect();
    entries.sort();
    Ok(entries)
}

fn read_description(dir: &Path) -> Result<String, PackError> {
    let path = dir.join(DESCRIPTION_FILE);
    if !path.exists() {
        return Ok(String::new());
    }
    Ok(fs::read_to_string(path)?.trim().to_string())
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn pack_dir(
    source: &Path,
    dest: &Path,
    password: &str,
    part_size: usize,
    options: &PackOptions,
    summary: &mut PackSummary,
) -> Result<(), PackError> {
    fs::create_dir_all(dest)?;
    let mut index = VaultIndex {
        files: BTreeMap::new(),
        vaults: BTreeMap::new(),
        id_counter: 0,
    };

    for path in collect_entries(source)? {
        let id = index.id_counter.to_string();
        index.id_counter += 1;
        let name = entry_name(&path);

        if path.is_dir() {
            pack_dir(&path, &dest.join(&id), password, part_size, options, summary)?;
            index.vaults.insert(
                id,
                VaultRecord {
                    name,
                    description: read_description(&path)?,
                },
            );
        } else {
            let record = pack_file(&path, dest, &id, name, password, part_size, options)?;
            summary.files += 1;
            summary.parts += record.encrypted_file_paths.len();
            summary.bytes += fs::metadata(&path)?.len();
            index.files.insert(id, record);
        }
    }

    let json = serde_json::to_vec(&index)?;
    fs::write(dest.join(INDEX_FILE), seal_blob(&json, password)?)?;
    summary.vaults += 1;
    Ok(())
}

fn pack_file(
    path: &Path,
    dest: &Path,
    id: &str,
    name: String,
    password: &str,
    part_size: usize,
    options: &PackOptions,
) -> Result<FileRecord, PackError> {
    let bytes = fs::read(path)?;
    // An empty file still gets one (empty) part.
    let chunks: Vec<&[u8]> = if bytes.is_empty() {
        vec![bytes.as_slice()]
    } else {
        bytes.chunks(part_size).collect()
    };

    let sealed = chunks
        .par_iter()
        .map(|chunk| seal_blob(chunk, password))
        .collect::<Result<Vec<_>, _>>()?;

    let mut part_paths = Vec::with_capacity(sealed.len());
    for (n, blob) in sealed.iter().enumerate() {
        let part = format!("{id}-{n}.enc");
        fs::write(dest.join(&part), blob)?;
        part_paths.push(part);
    }
    debug!(file = %path.display(), parts = part_paths.len(), "sealed");

    Ok(FileRecord {
        name,
        description: String::new(),
        date_archived: options.date_archived.clone(),
        encrypted_file_paths: part_paths,
    })
}
