//! Formation coordinate engine.
//!
//! Turns a formation's parameters into an ordered list of [`Marker`]s in
//! grid-cell units. Pixel conversion happens later, in [`crate::svg`].
//!
//! ## Formation kinds
//!
//! - **Pattern formations** ([`pattern_markers`]): a list of relative offsets
//!   scaled by a gap multiplier and translated to the midpoint. Patterns are
//!   static ([`BLOCK`], [`WEDGE`], [`HEART`]) or generated ([`star`]).
//! - **Silent wave** ([`silent_wave`]): a horizontal line centered on the
//!   midpoint.
//! - **Saturn** ([`saturn`]): two columns either side of the midpoint, climbing
//!   one gap every second marker.
//! - **Ring** ([`ring`]): evenly spaced points on a circle.
//!
//! No input is bounds-checked. Negative or zero gaps go straight into the
//! arithmetic and produce degenerate but well-defined layouts.

use crate::config::ToolConfig;
use std::f64::consts::TAU;

/// A relative or absolute position in grid-cell units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One marker to draw: grid position, color and optional centered label.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub label: Option<String>,
}

impl Marker {
    pub fn new(x: f64, y: f64, color: &str) -> Self {
        Self {
            x,
            y,
            color: color.to_string(),
            label: None,
        }
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// 4 × 3 rectangular block, growing upward from the origin row.
pub const BLOCK: &[Point] = &[
    Point::new(0.0, 0.0),
    Point::new(1.0, 0.0),
    Point::new(2.0, 0.0),
    Point::new(3.0, 0.0),
    Point::new(0.0, -1.0),
    Point::new(1.0, -1.0),
    Point::new(2.0, -1.0),
    Point::new(3.0, -1.0),
    Point::new(0.0, -2.0),
    Point::new(1.0, -2.0),
    Point::new(2.0, -2.0),
    Point::new(3.0, -2.0),
];

/// Upward-opening wedge: a point at the origin fanning out over four rows.
pub const WEDGE: &[Point] = &[
    Point::new(0.0, 0.0),
    Point::new(-1.0, -1.0),
    Point::new(1.0, -1.0),
    Point::new(-2.0, -2.0),
    Point::new(0.0, -2.0),
    Point::new(2.0, -2.0),
    Point::new(-1.0, -3.0),
    Point::new(1.0, -3.0),
    Point::new(-3.0, -3.0),
    Point::new(3.0, -3.0),
    Point::new(-2.0, -4.0),
    Point::new(2.0, -4.0),
];

/// Heart outline plus one inner point, point-down.
pub const HEART: &[Point] = &[
    Point::new(-6.0, -3.0),
    Point::new(-12.0, -8.0),
    Point::new(-18.0, -3.0),
    Point::new(-12.0, 2.0),
    Point::new(-6.0, 7.0),
    Point::new(0.0, 12.0),
    Point::new(6.0, 7.0),
    Point::new(12.0, 2.0),
    Point::new(18.0, -3.0),
    Point::new(12.0, -8.0),
    Point::new(6.0, -3.0),
    Point::new(0.0, 4.0),
];

/// Eight-point star: an outer diamond with diagonal shoulders, plus an inner
/// cross at `inner` spacing.
pub fn star(inner: f64, outer: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, -outer * 2.0),
        Point::new(outer, -outer),
        Point::new(outer * 2.0, 0.0),
        Point::new(outer, outer),
        Point::new(0.0, outer * 2.0),
        Point::new(-outer, outer),
        Point::new(-outer * 2.0, 0.0),
        Point::new(-outer, -outer),
        Point::new(-inner, 0.0),
        Point::new(inner, 0.0),
        Point::new(0.0, -inner),
        Point::new(0.0, inner),
    ]
}

// ============================================================================
// Coordinate generators
// ============================================================================

/// Bounding-box midpoint of a pattern: `((min_x+max_x)/2, (min_y+max_y)/2)`.
///
/// Returns `None` for an empty pattern.
pub fn bounding_midpoint(points: &[Point]) -> Option<Point> {
    let first = points.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Some(Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
}

/// Place a pattern at `mid`, scaled by `gap_multiplier`.
///
/// With `center` set, the pattern's bounding-box midpoint is subtracted first
/// so the formation sits centered on `mid` instead of anchored at its origin.
pub fn pattern_markers(
    mid: Point,
    pattern: &[Point],
    gap_multiplier: f64,
    color: &str,
    center: bool,
) -> Vec<Marker> {
    let offset = match (center, bounding_midpoint(pattern)) {
        (true, Some(m)) => Point::new(-m.x, -m.y),
        (_, None) => return Vec::new(),
        (false, Some(_)) => Point::new(0.0, 0.0),
    };

    pattern
        .iter()
        .map(|p| {
            Marker::new(
                mid.x + (p.x + offset.x) * gap_multiplier,
                mid.y + (p.y + offset.y) * gap_multiplier,
                color,
            )
        })
        .collect()
}

/// `total_men` markers on a horizontal line centered on `mid`, `gap` apart.
pub fn silent_wave(mid: Point, gap: f64, total_men: u32, color: &str) -> Vec<Marker> {
    let n = f64::from(total_men);
    (0..total_men)
        .map(|i| {
            let x = mid.x - (n - 1.0) * gap / 2.0 + f64::from(i) * gap;
            Marker::new(x, mid.y, color)
        })
        .collect()
}

/// Two alternating columns `throw_gap` apart, rising by `gap` every pair.
///
/// Even-indexed markers go left and advance the row; odd-indexed markers go
/// right on the same row.
pub fn saturn(mid: Point, throw_gap: f64, gap: f64, total_men: u32, color: &str) -> Vec<Marker> {
    let mut y_offset = 0.0;
    (0..total_men)
        .map(|i| {
            let x = if i % 2 == 0 {
                y_offset -= gap;
                mid.x - throw_gap / 2.0
            } else {
                mid.x + throw_gap / 2.0
            };
            Marker::new(x, mid.y + y_offset, color)
        })
        .collect()
}

/// `total_men` markers evenly spaced on a circle of `radius` around `mid`,
/// starting at angle 0 and turning clockwise in screen space. With
/// `with_center`, a marker at `mid` comes first.
pub fn ring(mid: Point, radius: f64, total_men: u32, with_center: bool, color: &str) -> Vec<Marker> {
    let mut markers = Vec::with_capacity(total_men as usize + 1);
    if with_center {
        markers.push(Marker::new(mid.x, mid.y, color));
    }
    let n = f64::from(total_men);
    markers.extend((0..total_men).map(|i| {
        let angle = TAU * f64::from(i) / n;
        Marker::new(
            mid.x + radius * angle.cos(),
            mid.y + radius * angle.sin(),
            color,
        )
    }));
    markers
}

/// Label markers `1..=n` in order.
pub fn numbered(mut markers: Vec<Marker>) -> Vec<Marker> {
    for (i, marker) in markers.iter_mut().enumerate() {
        marker.label = Some((i + 1).to_string());
    }
    markers
}

/// Collect markers from every visible formation, in drawing order:
/// block, star, wedge, heart, silent wave, saturn, ring.
pub fn collect_markers(config: &ToolConfig) -> Vec<Marker> {
    let mut all = Vec::new();

    let mut push = |markers: Vec<Marker>, number: bool| {
        all.extend(if number { numbered(markers) } else { markers });
    };

    let star_placement = config.star.placement();
    let patterns = [
        (&config.block, BLOCK.to_vec()),
        (&star_placement, star(config.star.inner_gap, config.star.outer_gap)),
        (&config.wedge, WEDGE.to_vec()),
        (&config.heart, HEART.to_vec()),
    ];
    for (f, pattern) in patterns {
        if f.visible {
            push(
                pattern_markers(f.mid(), &pattern, f.gap, &f.color, f.center),
                f.numbered,
            );
        }
    }

    let sw = &config.silent_wave;
    if sw.visible {
        push(silent_wave(sw.mid(), sw.gap, sw.total_men, &sw.color), sw.numbered);
    }

    let sat = &config.saturn;
    if sat.visible {
        push(
            saturn(sat.mid(), sat.throw_gap, sat.gap, sat.total_men, &sat.color),
            sat.numbered,
        );
    }

    let r = &config.ring;
    if r.visible {
        push(
            ring(r.mid(), r.radius, r.total_men, r.with_center, &r.color),
            r.numbered,
        );
    }

    all
}
