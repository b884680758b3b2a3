//! Shared test utilities for the melon-tools test suite.
//!
//! Provides an in-memory [`Transport`] and builders for encrypted vault trees
//! so vault tests never touch the network or the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let transport = MemoryTransport::default();
//! let mut index = empty_index();
//! add_file(&mut index, "0", "notes.txt", &["0-0.enc"]);
//! transport.insert_index("vault", &index, "pw");
//! transport.insert_sealed("vault/0-0.enc", b"hello", "pw");
//!
//! let vault = Vault::new(&transport, "vault", "pw");
//! let root = vault.open_root().unwrap();
//! assert_eq!(transport.fetched(), vec!["vault/index.vault"]);
//! ```

use crate::crypto::vault::seal_blob;
use crate::vault::transport::{Transport, TransportError};
use crate::vault::{FileRecord, INDEX_FILE, VaultIndex, VaultRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

// =========================================================================
// MemoryTransport
// =========================================================================

/// Transport backed by a map of location → bytes.
/// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
#[derive(Default)]
pub struct MemoryTransport {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    delays: Mutex<HashMap<String, Duration>>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryTransport {
    /// Store raw bytes at `location`.
    pub fn insert(&self, location: &str, bytes: Vec<u8>) {
        self.blobs
            .lock()
            .unwrap()
            .insert(location.to_string(), bytes);
    }

    /// Encrypt `plaintext` with the vault scheme and store it.
    pub fn insert_sealed(&self, location: &str, plaintext: &[u8], password: &str) {
        self.insert(location, seal_blob(plaintext, password).unwrap());
    }

    /// Serialize and encrypt an index as `<vault>/index.vault`.
    pub fn insert_index(&self, vault: &str, index: &VaultIndex, password: &str) {
        let json = serde_json::to_vec(index).unwrap();
        self.insert_sealed(&format!("{vault}/{INDEX_FILE}"), &json, password);
    }

    /// Make fetches of `location` sleep before returning.
    pub fn delay(&self, location: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(location.to_string(), delay);
    }

    /// Locations requested so far, in request order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Transport for MemoryTransport {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, TransportError> {
        self.fetched.lock().unwrap().push(location.to_string());
        let delay = self.delays.lock().unwrap().get(location).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.blobs
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                location: location.to_string(),
                status: 404,
            })
    }
}

// =========================================================================
// Index builders
// =========================================================================

pub fn empty_index() -> VaultIndex {
    VaultIndex {
        files: BTreeMap::new(),
        vaults: BTreeMap::new(),
        id_counter: 0,
    }
}

pub fn add_file(index: &mut VaultIndex, id: &str, name: &str, parts: &[&str]) {
    index.files.insert(
        id.to_string(),
        FileRecord {
            name: name.to_string(),
            description: format!("about {name}"),
            date_archived: "2024-01-31".to_string(),
            encrypted_file_paths: parts.iter().map(|p| p.to_string()).collect(),
        },
    );
    index.id_counter += 1;
}

pub fn add_vault(index: &mut VaultIndex, id: &str, name: &str) {
    index.vaults.insert(
        id.to_string(),
        VaultRecord {
            name: name.to_string(),
            description: String::new(),
        },
    );
    index.id_counter += 1;
}
