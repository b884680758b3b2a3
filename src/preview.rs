//! Standalone HTML preview of an assembled vault file.
//!
//! The page is a single self-contained document: media is embedded as a
//! base64 data URI, text is escaped into a `<pre>`. Layout:
//!
//! ```text
//! <h2>name</h2>
//! <img> | <video controls> | <audio controls> | <pre class="code-block"> | notice + <pre>
//! <p>description</p>
//! ```
//!
//! Rendering uses maud, so every interpolated value is HTML-escaped.

use crate::filetype::ViewType;
use crate::vault::AssembledFile;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

pub const UNAVAILABLE_NOTICE: &str =
    "Preview not available for this file type. Please download to view.";

const STYLE: &str = "\
body{font-family:sans-serif;margin:2rem;max-width:60rem}\
img,video,audio{max-width:100%}\
pre{background:#f4f4f4;padding:1rem;overflow:auto;white-space:pre-wrap}\
.meta{color:#666}";

/// `data:` URI for the file's bytes with its view type's MIME.
pub fn data_uri(file: &AssembledFile) -> String {
    format!(
        "data:{};base64,{}",
        file.view_type.mime(),
        STANDARD.encode(&file.bytes)
    )
}

fn media(file: &AssembledFile) -> Markup {
    match file.view_type {
        ViewType::Image => html! { img src=(data_uri(file)) alt=(file.name); },
        ViewType::Video => html! { video controls src=(data_uri(file)) {} },
        ViewType::Audio => html! { audio controls src=(data_uri(file)) {} },
        ViewType::Code => html! { pre class="code-block" { (file.text()) } },
        ViewType::Unknown => html! {
            p { (UNAVAILABLE_NOTICE) }
            pre { (file.text()) }
        },
    }
}

/// Body content for one file, without the surrounding document.
pub fn render_content(file: &AssembledFile) -> Markup {
    html! {
        h2 { (file.name) }
        (media(file))
        p { (file.description) }
        @if !file.date_archived.is_empty() {
            p class="meta" { "Archived " (file.date_archived) }
        }
    }
}

/// Complete HTML page for one file.
pub fn render_page(file: &AssembledFile) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (file.name) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                (render_content(file))
            }
        }
    }
}

/// Render and write the preview page to `path`.
pub fn write_page(file: &AssembledFile, path: &Path) -> std::io::Result<()> {
    fs::write(path, render_page(file).into_string())
}
