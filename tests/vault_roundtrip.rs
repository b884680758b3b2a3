//! Pack a directory into an encrypted vault on disk, then browse it back
//! through the public API with the filesystem transport.
//!
//! Run with: `cargo test --test vault_roundtrip`

use melon_tools::vault::pack::{PackOptions, pack};
use melon_tools::vault::transport::FsTransport;
use melon_tools::vault::{EntryKind, Vault, VaultError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PASSWORD: &str = "correct horse";

fn source_tree(root: &Path) {
    fs::write(root.join("notes.txt"), "pack me\nand read me back\n").unwrap();
    fs::write(root.join("photo.jpg"), (0..=255u8).cycle().take(5000).collect::<Vec<_>>()).unwrap();
    fs::write(root.join(".hidden"), "skipped").unwrap();
    let sub = root.join("summer");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("description.txt"), "Beach week\n").unwrap();
    fs::write(sub.join("song.mp3"), b"ID3 not really").unwrap();
}

fn packed() -> (TempDir, String) {
    let src = TempDir::new().unwrap();
    source_tree(src.path());
    let out = TempDir::new().unwrap();
    let options = PackOptions {
        part_size: 1024,
        date_archived: "2024-06-01".to_string(),
    };
    let summary = pack(src.path(), out.path(), PASSWORD, &options).unwrap();
    assert_eq!(summary.vaults, 2);
    assert_eq!(summary.files, 3);
    // notes (1) + photo (5) + song (1)
    assert_eq!(summary.parts, 7);
    let root = out.path().to_string_lossy().into_owned();
    (out, root)
}

#[test]
fn root_listing_matches_source() {
    let (_out, root) = packed();
    let vault = Vault::new(FsTransport, &root, PASSWORD);
    let view = vault.open_root().unwrap();
    assert!(view.is_root());

    let entries = view.entries();
    let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EntryKind::Up, EntryKind::Vault, EntryKind::File, EntryKind::File]
    );
    let names: Vec<_> = entries.iter().skip(1).map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["summer", "notes.txt", "photo.jpg"]);
    assert_eq!(entries[1].description, "Beach week");
    assert_eq!(entries[2].date_archived, "2024-06-01");
}

#[test]
fn multi_part_file_reassembles_byte_for_byte() {
    let (_out, root) = packed();
    let vault = Vault::new(FsTransport, &root, PASSWORD);
    let view = vault.open_root().unwrap();

    let (photo_id, _) = view
        .files()
        .into_iter()
        .find(|(_, f)| f.name == "photo.jpg")
        .unwrap();
    let file = vault.fetch_file(&view, photo_id).unwrap();
    let expected: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
    assert_eq!(file.bytes, expected);
}

#[test]
fn enter_and_leave_sub_vault() {
    let (_out, root) = packed();
    let vault = Vault::new(FsTransport, &root, PASSWORD);
    let top = vault.open_root().unwrap();
    let (sub_id, _) = top.sub_vaults()[0];

    let inner = vault.enter(&top, sub_id).unwrap();
    assert!(!inner.is_root());
    let (song_id, _) = inner.files()[0];
    let song = vault.fetch_file(&inner, song_id).unwrap();
    assert_eq!(song.bytes, b"ID3 not really");

    let back = vault.up(&inner).unwrap();
    assert!(back.is_root());
    assert!(matches!(vault.up(&back), Err(VaultError::AtRoot)));
}

#[test]
fn wrong_password_fails_to_open() {
    let (_out, root) = packed();
    let vault = Vault::new(FsTransport, &root, "wrong");
    // CBC has no tag: usually a padding failure, rarely garbage JSON
    assert!(matches!(
        vault.open_root(),
        Err(VaultError::Decrypt { .. } | VaultError::Format { .. })
    ));
}

#[test]
fn missing_vault_is_a_network_error() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("nowhere").to_string_lossy().into_owned();
    let vault = Vault::new(FsTransport, &root, PASSWORD);
    assert!(matches!(vault.open_root(), Err(VaultError::Network(_))));
}
