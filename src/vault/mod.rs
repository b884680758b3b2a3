//! Encrypted vault browsing.
//!
//! A vault is a directory on a static host. Each directory holds an encrypted
//! `index.vault` manifest plus the encrypted parts of its files; sub-vaults
//! are subdirectories named by their id.
//!
//! ```text
//! <root>/
//! ├── index.vault            # {"Files": {...}, "Vaults": {...}, "IdCounter": n}
//! ├── 0-0.enc                # part 0 of file 0
//! ├── 0-1.enc                # part 1 of file 0
//! └── 1/                     # sub-vault with id 1
//!     ├── index.vault
//!     └── ...
//! ```
//!
//! Every blob uses the [`crate::crypto::vault`] scheme with the same password.
//! Indexes are fetched fresh on every navigation and never cached.
//!
//! ## Navigation
//!
//! [`Vault::open_root`] and [`Vault::open`] return a [`VaultView`]. From a view:
//! [`Vault::enter`] opens a sub-vault, [`Vault::up`] opens the parent, and
//! [`Vault::fetch_file`] assembles a file from its parts. Navigation never
//! leaves the root the vault was created with: `up` at the root is
//! [`VaultError::AtRoot`].
//!
//! ## Entry order
//!
//! Index maps list ids the way a JavaScript object iterates them: canonical
//! array-index ids (`"0"`, `"1"`, `"10"`) in numeric order first, then every
//! other id in lexicographic order.

pub mod pack;
pub mod transport;

use crate::crypto::vault::open_blob;
use crate::filetype::{self, FOLDER_ICON, UP_ICON, ViewType};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use transport::{Transport, TransportError};
use zeroize::Zeroizing;

/// Manifest file name in every vault directory.
pub const INDEX_FILE: &str = "index.vault";

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Network error: {0}")]
    Network(#[from] TransportError),
    #[error("Failed to decrypt {location}. Check password or data integrity.")]
    Decrypt { location: String },
    #[error("Invalid vault data at {location}: {reason}")]
    Format { location: String, reason: String },
    #[error("Already at the top of the vault")]
    AtRoot,
    #[error("No entry with id '{0}' in this vault")]
    UnknownEntry(String),
    #[error("File name '{0}' has no usable final component")]
    UnsafeName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decrypted `index.vault` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VaultIndex {
    pub files: BTreeMap<String, FileRecord>,
    pub vaults: BTreeMap<String, VaultRecord>,
    /// Next free id. Written by the packer, ignored when browsing.
    #[serde(default)]
    pub id_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date_archived: String,
    /// Part paths relative to the vault directory, in concatenation order.
    pub encrypted_file_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VaultRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `Some(n)` when `id` is a canonical JavaScript array index.
fn array_index(id: &str) -> Option<u32> {
    let n: u32 = id.parse().ok()?;
    (n != u32::MAX && n.to_string() == id).then_some(n)
}

/// Map entries in JavaScript object iteration order.
pub fn ordered<V>(map: &BTreeMap<String, V>) -> Vec<(&str, &V)> {
    let mut entries: Vec<(&str, &V)> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    // stable: non-index ids keep BTreeMap's lexicographic order
    entries.sort_by_key(|(id, _)| match array_index(id) {
        Some(n) => (0, n),
        None => (1, 0),
    });
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Up,
    Vault,
    File,
}

/// One line of a vault listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    /// Id within the index; empty for [`EntryKind::Up`].
    pub id: String,
    pub name: String,
    pub icon: &'static str,
    pub description: String,
    pub date_archived: String,
}

/// An opened vault directory.
#[derive(Debug, Clone)]
pub struct VaultView {
    pub location: String,
    pub index: VaultIndex,
    is_root: bool,
}

impl VaultView {
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn sub_vaults(&self) -> Vec<(&str, &VaultRecord)> {
        ordered(&self.index.vaults)
    }

    pub fn files(&self) -> Vec<(&str, &FileRecord)> {
        ordered(&self.index.files)
    }

    /// Full listing: the synthetic up entry, sub-vaults, then files.
    pub fn entries(&self) -> Vec<Entry> {
        let up = Entry {
            kind: EntryKind::Up,
            id: String::new(),
            name: String::new(),
            icon: UP_ICON,
            description: String::new(),
            date_archived: String::new(),
        };
        let vaults = self.sub_vaults().into_iter().map(|(id, v)| Entry {
            kind: EntryKind::Vault,
            id: id.to_string(),
            name: v.name.clone(),
            icon: FOLDER_ICON,
            description: v.description.clone(),
            date_archived: String::new(),
        });
        let files = self.files().into_iter().map(|(id, f)| Entry {
            kind: EntryKind::File,
            id: id.to_string(),
            name: f.name.clone(),
            icon: filetype::icon(&f.name),
            description: f.description.clone(),
            date_archived: f.date_archived.clone(),
        });
        std::iter::once(up).chain(vaults).chain(files).collect()
    }
}

/// A file reassembled from its decrypted parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFile {
    pub name: String,
    pub description: String,
    pub date_archived: String,
    pub view_type: ViewType,
    pub bytes: Vec<u8>,
}

impl AssembledFile {
    pub fn icon(&self) -> &'static str {
        filetype::icon(&self.name)
    }

    /// Local file name to save under when no destination is given.
    ///
    /// `Name` comes from the remote index, so only its last path component
    /// is used: `../x` and `/tmp/x` both become `x`.
    pub fn local_name(&self) -> Result<PathBuf, VaultError> {
        Path::new(&self.name)
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| VaultError::UnsafeName(self.name.clone()))
    }

    /// Contents as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Join a vault location and a relative path with `/`.
pub fn join_location(base: &str, relative: &str) -> String {
    format!("{base}/{relative}")
}

/// Password-bound handle on a vault tree.
pub struct Vault<T> {
    transport: T,
    root: String,
    password: Zeroizing<String>,
}

impl<T: Transport> Vault<T> {
    /// `root` is the location of the top-level vault directory. Trailing `/`
    /// are ignored.
    pub fn new(transport: T, root: &str, password: &str) -> Self {
        Self {
            transport,
            root: root.trim_end_matches('/').to_string(),
            password: Zeroizing::new(password.to_string()),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Fetch and decrypt one blob.
    fn fetch_blob(&self, location: &str) -> Result<Vec<u8>, VaultError> {
        let blob = self.transport.fetch(location)?;
        debug!(location, bytes = blob.len(), "decrypting");
        open_blob(&blob, &self.password).map_err(|_| VaultError::Decrypt {
            location: location.to_string(),
        })
    }

    /// Fetch, decrypt and parse the index at `location`.
    pub fn open(&self, location: &str) -> Result<VaultView, VaultError> {
        let location = location.trim_end_matches('/').to_string();
        let index_location = join_location(&location, INDEX_FILE);
        let plaintext = self.fetch_blob(&index_location)?;
        let index: VaultIndex =
            serde_json::from_slice(&plaintext).map_err(|e| VaultError::Format {
                location: index_location.clone(),
                reason: e.to_string(),
            })?;
        info!(
            location = %location,
            vaults = index.vaults.len(),
            files = index.files.len(),
            "opened vault"
        );
        Ok(VaultView {
            is_root: location == self.root,
            location,
            index,
        })
    }

    pub fn open_root(&self) -> Result<VaultView, VaultError> {
        self.open(&self.root)
    }

    /// Parent of `location`, never above the root.
    fn parent_of<'a>(&self, location: &'a str) -> Option<&'a str> {
        if location == self.root {
            return None;
        }
        let (parent, _) = location.rsplit_once('/')?;
        (parent.len() >= self.root.len() && parent.starts_with(self.root.as_str()))
            .then_some(parent)
    }

    /// Open the parent of `view`. At the root this is [`VaultError::AtRoot`].
    pub fn up(&self, view: &VaultView) -> Result<VaultView, VaultError> {
        let parent = self.parent_of(&view.location).ok_or(VaultError::AtRoot)?;
        self.open(parent)
    }

    /// Open the sub-vault `id` of `view`.
    pub fn enter(&self, view: &VaultView, id: &str) -> Result<VaultView, VaultError> {
        if !view.index.vaults.contains_key(id) {
            return Err(VaultError::UnknownEntry(id.to_string()));
        }
        self.open(&join_location(&view.location, id))
    }

    /// Fetch every part of file `id`, decrypt each, and concatenate them in
    /// listed order.
    ///
    /// Parts are fetched in parallel on the rayon pool; completion order does
    /// not affect the result.
    pub fn fetch_file(&self, view: &VaultView, id: &str) -> Result<AssembledFile, VaultError> {
        let record = view
            .index
            .files
            .get(id)
            .ok_or_else(|| VaultError::UnknownEntry(id.to_string()))?;
        if record.encrypted_file_paths.is_empty() {
            return Err(VaultError::Format {
                location: join_location(&view.location, INDEX_FILE),
                reason: format!("file '{}' lists no encrypted parts", record.name),
            });
        }

        let parts = record
            .encrypted_file_paths
            .par_iter()
            .map(|path| self.fetch_blob(&join_location(&view.location, path)))
            .collect::<Result<Vec<_>, _>>()?;
        let bytes = parts.concat();
        info!(
            name = %record.name,
            parts = parts.len(),
            bytes = bytes.len(),
            "assembled file"
        );

        Ok(AssembledFile {
            name: record.name.clone(),
            description: record.description.clone(),
            date_archived: record.date_archived.clone(),
            view_type: filetype::view_type(&record.name),
            bytes,
        })
    }
}
