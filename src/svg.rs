//! SVG rendering of the formation grid and markers.
//!
//! Uses [maud](https://maud.lambda.xyz/) the same way the HTML preview does.
//! Every element is written with an explicit (possibly empty) body, so the
//! output is well-formed XML as well as valid SVG.
//!
//! ## Layout
//!
//! ```text
//! <svg version="1.1" viewBox="0 0 W H" xmlns=...>
//!   <g id="Grid">                  one <rect> per cell, chunk by chunk
//!   <g id="Marker_{px}_{py}">      per marker: two crossing <line>s + optional <text>
//! </svg>
//! ```
//!
//! Marker coordinates arrive in grid cells and are multiplied by
//! `tile_size` here. Output is deterministic for a given config.

use crate::config::{GridConfig, ToolConfig};
use crate::formation::{self, Marker};
use maud::{Markup, html};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" standalone=\"no\"?>\r\n";
/// File name used when no output path is given.
pub const DEFAULT_OUTPUT: &str = "formation.svg";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shortest round-trip form of a coordinate, as a browser writes numbers into
/// attributes. `8.0` → `8`, `-0.0` → `0`, `1e21` → `1e+21`, `1e-7` → `1e-7`.
///
/// Magnitudes in `[1e-6, 1e21)` are plain decimals; anything outside uses an
/// exponent with an explicit sign.
pub fn fmt_num(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if (1e-6..1e21).contains(&value.abs()) {
        return format!("{value}");
    }
    let sci = format!("{value:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => sci,
    }
}

/// Pixel size of the full diagram: `(width, height)`.
pub fn canvas_size(grid: &GridConfig) -> (u64, u64) {
    let chunk_px = u64::from(grid.chunk_size) * u64::from(grid.tile_size);
    (
        chunk_px * u64::from(grid.chunks_x),
        chunk_px * u64::from(grid.chunks_y),
    )
}

fn cell_fill(grid: &GridConfig, chunk_x: u32, local_x: u32, local_y: u32) -> &str {
    let edge = grid.chunk_size.saturating_sub(1);
    let border = local_x == 0 || local_x == edge || local_y == 0 || local_y == edge;
    if border {
        grid.border_color.as_str()
    } else if grid.alt_chunk_columns.contains(&chunk_x) {
        grid.chunk_color_alt.as_str()
    } else {
        grid.chunk_color.as_str()
    }
}

fn cell(x: u64, y: u64, size: u32, fill: &str) -> Markup {
    html! {
        rect x=(x) y=(y) width=(size) height=(size)
            transform="matrix(1, 0, 0, 1, 0, 0)"
            fill=(fill) fill-opacity="1"
            stroke="#000000" stroke-width="1"
            stroke-dasharray="1 2" opacity="1"
            id=(format!("Rectangle_{x}_{y}")) {}
    }
}

/// Background grid: chunk columns, then chunk rows, then cells column-major.
pub fn render_grid(grid: &GridConfig) -> Markup {
    let tile = u64::from(grid.tile_size);
    let size = u64::from(grid.chunk_size);
    html! {
        g id="Grid" {
            @for chunk_x in 0..grid.chunks_x {
                @for chunk_y in 0..grid.chunks_y {
                    @for local_x in 0..grid.chunk_size {
                        @for local_y in 0..grid.chunk_size {
                            (cell(
                                (u64::from(chunk_x) * size + u64::from(local_x)) * tile,
                                (u64::from(chunk_y) * size + u64::from(local_y)) * tile,
                                grid.tile_size,
                                cell_fill(grid, chunk_x, local_x, local_y),
                            ))
                        }
                    }
                }
            }
        }
    }
}

/// One "X" marker at the marker's pixel position.
pub fn render_marker(grid: &GridConfig, marker: &Marker) -> Markup {
    let tile = f64::from(grid.tile_size);
    let (px, py) = (marker.x * tile, marker.y * tile);
    let half = tile * grid.marker_scale / 2.0;
    let stroke_width = fmt_num(grid.stroke_width);
    html! {
        g id=(format!("Marker_{}_{}", fmt_num(px), fmt_num(py))) {
            line x1=(fmt_num(px - half)) y1=(fmt_num(py - half))
                x2=(fmt_num(px + half)) y2=(fmt_num(py + half))
                stroke=(marker.color) stroke-width=(stroke_width) {}
            line x1=(fmt_num(px + half)) y1=(fmt_num(py - half))
                x2=(fmt_num(px - half)) y2=(fmt_num(py + half))
                stroke=(marker.color) stroke-width=(stroke_width) {}
            @if let Some(label) = &marker.label {
                text x=(fmt_num(px)) y=(fmt_num(py)) fill="#000000"
                    font-family="sans-serif" font-size="10"
                    text-anchor="middle" dominant-baseline="middle" { (label) }
            }
        }
    }
}

/// Full SVG document: grid first, markers drawn over it in order.
pub fn render_svg(grid: &GridConfig, markers: &[Marker]) -> Markup {
    let (width, height) = canvas_size(grid);
    html! {
        svg version="1.1" viewBox=(format!("0 0 {width} {height}")) xmlns=(SVG_NS) {
            (render_grid(grid))
            @for marker in markers {
                (render_marker(grid, marker))
            }
        }
    }
}

/// Prepend the XML declaration to rendered markup.
pub fn serialize_svg(svg: Markup) -> String {
    format!("{XML_DECLARATION}{}", svg.into_string())
}

/// Compute markers for every visible formation and render the document.
pub fn render_formations(config: &ToolConfig) -> (Vec<Marker>, String) {
    let markers = formation::collect_markers(config);
    let svg = serialize_svg(render_svg(&config.grid, &markers));
    (markers, svg)
}

/// Write a serialized document, replacing any previous file.
pub fn write_svg(path: &Path, document: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, document)?;
    Ok(())
}
