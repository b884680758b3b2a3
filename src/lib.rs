//! # Melon Tools
//!
//! Three small, independent utilities behind one binary (`melon`):
//!
//! - **Formation diagrams**: parametric marker layouts (block, star, wedge,
//!   heart, silent wave, saturn, ring) drawn over a chunked tile grid and
//!   written as SVG.
//! - **Vault browser**: opens a password-encrypted directory tree served from
//!   a static host (or local disk), lists its contents, reassembles multi-part
//!   files and renders previews. A packer builds such trees from a directory.
//! - **Text encryptor**: password-based authenticated encryption of short
//!   text into a single printable `salt.iv.ciphertext` bundle.
//!
//! None of them share runtime state. Each CLI invocation recomputes its
//! output from scratch and replaces the previous result.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`formation`] | Marker coordinate generators and the static patterns |
//! | [`svg`] | Grid + marker rendering with Maud, XML serialization |
//! | [`config`] | Layered `melon.toml` loading, `--set` overrides, validation |
//! | [`crypto`] | Vault blob scheme (AES-CBC) and text scheme (PBKDF2 + AES-GCM) |
//! | [`vault`] | Index parsing, navigation, parallel multi-part assembly, packing |
//! | [`filetype`] | Extension → icon / viewer table |
//! | [`preview`] | Self-contained HTML page for an assembled file |
//! | [`shell`] | Line-oriented interactive vault browser |
//! | [`output`] | CLI output formatting: pure `format_*` plus `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## Two Crypto Schemes, Never Mixed
//!
//! Vault blobs use an unsalted SHA-256 key with AES-256-CBC because that is
//! the format existing vaults are stored in. Text bundles use PBKDF2 with a
//! per-bundle salt and AES-256-GCM. The two live in separate modules with
//! separate error paths so a vault blob can never be fed to the text decoder
//! or vice versa.
//!
//! ## Blocking I/O + Rayon
//!
//! Vault parts are fetched with a blocking HTTP client on rayon workers.
//! There is no async runtime: the only concurrency is "fetch N parts at once
//! and keep them in order", which `par_iter().collect()` expresses directly.
//! The pool size comes from `[vault] max_fetches`.
//!
//! ## Maud for SVG and HTML
//!
//! Both the diagram and the preview page are built with Maud. Interpolated
//! values are escaped and elements are always closed, so the SVG output is
//! valid XML without a dedicated writer.

pub mod config;
pub mod crypto;
pub mod filetype;
pub mod formation;
pub mod output;
pub mod preview;
pub mod shell;
pub mod svg;
pub mod vault;

#[cfg(test)]
pub(crate) mod test_helpers;
