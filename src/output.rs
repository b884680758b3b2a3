//! CLI output formatting for every subcommand.
//!
//! Each result has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Diagnostics go through
//! `tracing` on stderr; only results are printed here.
//!
//! # Output Format
//!
//! ## Vault listing
//!
//! ```text
//! vault/2
//! 🔙 ..
//! 📁 [3] Trips
//!     Summer 2023
//! 📸 [0] dawn.jpg (2024-01-31)
//!     First light over the ridge
//! ```
//!
//! ## Markers
//!
//! ```text
//! 001 (28.5, 32) #eeff00
//! 002 (30.5, 32) #eeff00 "2"
//! ```
//!
//! ## Render / pack
//!
//! ```text
//! formation.svg (1920x1920, 12 markers)
//! Packed 3 files in 2 vaults (7 parts, 24 bytes) → out/
//! ```

use crate::formation::Marker;
use crate::svg::fmt_num;
use crate::vault::pack::PackSummary;
use crate::vault::{AssembledFile, EntryKind, VaultView};
use std::path::Path;

const MAX_DESCRIPTION: usize = 60;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// First line of a possibly multi-line description.
fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

// ============================================================================
// Vault
// ============================================================================

/// Format a vault listing: location header, then one line per entry with
/// its description indented underneath.
pub fn format_vault_listing(view: &VaultView) -> Vec<String> {
    let mut lines = vec![view.location.clone()];
    for entry in view.entries() {
        let line = match entry.kind {
            EntryKind::Up => format!("{} ..", entry.icon),
            EntryKind::Vault => format!("{} [{}] {}", entry.icon, entry.id, entry.name),
            EntryKind::File if entry.date_archived.is_empty() => {
                format!("{} [{}] {}", entry.icon, entry.id, entry.name)
            }
            EntryKind::File => format!(
                "{} [{}] {} ({})",
                entry.icon, entry.id, entry.name, entry.date_archived
            ),
        };
        lines.push(line);
        let desc = first_line(&entry.description);
        if !desc.is_empty() {
            lines.push(format!("{}{}", indent(1), truncate_desc(desc, MAX_DESCRIPTION)));
        }
    }
    lines
}

pub fn print_vault_listing(view: &VaultView) {
    for line in format_vault_listing(view) {
        println!("{}", line);
    }
}

/// Format the result of fetching a file: what it is and where it went.
///
/// ```text
/// 📄 story.txt (16 bytes, code) → out/story.txt
/// ```
pub fn format_file_saved(file: &AssembledFile, dest: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({} bytes, {}) → {}",
        file.icon(),
        file.name,
        file.bytes.len(),
        file.view_type.name(),
        dest.display()
    )];
    let desc = first_line(&file.description);
    if !desc.is_empty() {
        lines.push(format!("{}{}", indent(1), truncate_desc(desc, MAX_DESCRIPTION)));
    }
    lines
}

pub fn print_file_saved(file: &AssembledFile, dest: &Path) {
    for line in format_file_saved(file, dest) {
        println!("{}", line);
    }
}

/// One-line pack summary.
pub fn format_pack_summary(summary: &PackSummary, dest: &Path) -> Vec<String> {
    vec![format!(
        "Packed {} files in {} vaults ({} parts, {} bytes) → {}",
        summary.files,
        summary.vaults,
        summary.parts,
        summary.bytes,
        dest.display()
    )]
}

pub fn print_pack_summary(summary: &PackSummary, dest: &Path) {
    for line in format_pack_summary(summary, dest) {
        println!("{}", line);
    }
}

// ============================================================================
// Formation
// ============================================================================

/// One line per marker in drawing order, grid-cell coordinates.
pub fn format_markers(markers: &[Marker]) -> Vec<String> {
    markers
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let base = format!(
                "{} ({}, {}) {}",
                format_index(i + 1),
                fmt_num(m.x),
                fmt_num(m.y),
                m.color
            );
            match &m.label {
                Some(label) => format!("{base} \"{label}\""),
                None => base,
            }
        })
        .collect()
}

pub fn print_markers(markers: &[Marker]) {
    for line in format_markers(markers) {
        println!("{}", line);
    }
}

/// Summary after writing an SVG.
pub fn format_render_output(path: &Path, size: (u64, u64), markers: usize) -> Vec<String> {
    vec![format!(
        "{} ({}x{}, {} markers)",
        path.display(),
        size.0,
        size.1,
        markers
    )]
}

pub fn print_render_output(path: &Path, size: (u64, u64), markers: usize) {
    for line in format_render_output(path, size, markers) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filetype::ViewType;
    use crate::test_helpers::*;
    use crate::vault::Vault;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_padding() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn truncate_desc_short_and_exact() {
        assert_eq!(truncate_desc("short", 10), "short");
        assert_eq!(truncate_desc("12345", 5), "12345");
        assert_eq!(truncate_desc("", 5), "");
    }

    #[test]
    fn truncate_desc_long() {
        assert_eq!(truncate_desc("abcdefgh", 3), "abc...");
    }

    #[test]
    fn truncate_desc_multibyte_safe() {
        assert_eq!(truncate_desc("ééééé", 2), "éé...");
    }

    // =========================================================================
    // Vault
    // =========================================================================

    #[test]
    fn vault_listing_lines() {
        let transport = MemoryTransport::default();
        let mut index = empty_index();
        add_file(&mut index, "0", "dawn.jpg", &["0-0.enc"]);
        add_vault(&mut index, "1", "Trips");
        transport.insert_index("v", &index, "pw");

        let vault = Vault::new(&transport, "v", "pw");
        let lines = format_vault_listing(&vault.open_root().unwrap());
        assert_eq!(
            lines,
            vec![
                "v",
                "🔙 ..",
                "📁 [1] Trips",
                "📸 [0] dawn.jpg (2024-01-31)",
                "    about dawn.jpg",
            ]
        );
    }

    #[test]
    fn file_saved_line() {
        let file = AssembledFile {
            name: "story.txt".into(),
            description: String::new(),
            date_archived: String::new(),
            view_type: ViewType::Code,
            bytes: vec![0; 16],
        };
        let lines = format_file_saved(&file, Path::new("out/story.txt"));
        assert_eq!(lines, vec!["📄 story.txt (16 bytes, code) → out/story.txt"]);
    }

    #[test]
    fn pack_summary_line() {
        let summary = PackSummary {
            vaults: 2,
            files: 3,
            parts: 7,
            bytes: 24,
        };
        assert_eq!(
            format_pack_summary(&summary, Path::new("out")),
            vec!["Packed 3 files in 2 vaults (7 parts, 24 bytes) → out"]
        );
    }

    // =========================================================================
    // Formation
    // =========================================================================

    #[test]
    fn markers_numbered_with_labels() {
        let mut labeled = Marker::new(30.5, 32.0, "#eeff00");
        labeled.label = Some("2".into());
        let lines = format_markers(&[Marker::new(28.5, 32.0, "#eeff00"), labeled]);
        assert_eq!(
            lines,
            vec!["001 (28.5, 32) #eeff00", "002 (30.5, 32) #eeff00 \"2\""]
        );
    }

    #[test]
    fn render_output_line() {
        assert_eq!(
            format_render_output(Path::new("formation.svg"), (1920, 1920), 12),
            vec!["formation.svg (1920x1920, 12 markers)"]
        );
    }
}
