//! Tool configuration module.
//!
//! Handles loading, validating, and merging `melon.toml`. Configuration is
//! layered: stock defaults, then the config file, then `--set key=value`
//! overrides from the command line, each overriding the one before.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [grid]
//! tile_size = 32                 # Pixels per grid cell
//! chunks_x = 3                   # Chunks across
//! chunks_y = 3                   # Chunks down
//! chunk_size = 20                # Cells per chunk side
//! chunk_color = "#a89ea9"
//! chunk_color_alt = "#8e98a5"
//! border_color = "#cececf"
//! alt_chunk_columns = [2]        # Chunk columns drawn in chunk_color_alt
//! marker_scale = 0.75            # Marker size relative to tile_size
//! stroke_width = 4.0
//!
//! [block]                        # Also [wedge] and [heart]
//! visible = true
//! mid_x = 30.0
//! mid_y = 30.0
//! gap = 2.0                      # Gap multiplier applied to the pattern
//! color = "#eeff00"
//! center = true                  # Center the pattern on (mid_x, mid_y)
//! numbered = false               # Label markers 1..n
//!
//! [star]                         # Pattern keys plus:
//! inner_gap = 1.0
//! outer_gap = 2.0
//!
//! [silent_wave]
//! total_men = 12
//! gap = 3.5
//!
//! [saturn]
//! total_men = 12
//! throw_gap = 3.0
//! gap = 3.0
//!
//! [ring]
//! total_men = 11
//! radius = 4.0
//! with_center = true
//!
//! [vault]
//! part_size = 8388608            # Max bytes per encrypted part when packing
//! max_fetches = 4                # Parallel part fetches (omit for auto)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [silent_wave]
//! visible = true
//! total_men = 8
//! ```
//!
//! Unknown keys are rejected to catch typos early. Formation numbers are not
//! range-checked: zero and negative gaps are legal and simply produce
//! degenerate layouts.

use crate::formation::Point;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "melon.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid override '{0}': expected key.path=value")]
    Override(String),
}

/// Full tool configuration loaded from `melon.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Background grid geometry and colors.
    pub grid: GridConfig,
    pub block: PatternFormation,
    pub star: StarFormation,
    pub wedge: PatternFormation,
    pub heart: PatternFormation,
    pub silent_wave: WaveFormation,
    pub saturn: SaturnFormation,
    pub ring: RingFormation,
    /// Vault browsing and packing settings.
    pub vault: VaultConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            block: PatternFormation::styled(true, 2.0, "#eeff00"),
            star: StarFormation::default(),
            wedge: PatternFormation::styled(false, 2.0, "#ff7b00"),
            heart: PatternFormation::styled(false, 0.5, "#ff0000"),
            silent_wave: WaveFormation::default(),
            saturn: SaturnFormation::default(),
            ring: RingFormation::default(),
            vault: VaultConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Reject values the renderer or packer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.grid;
        if g.tile_size == 0 || g.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "grid.tile_size and grid.chunk_size must be non-zero".into(),
            ));
        }
        if g.chunks_x == 0 || g.chunks_y == 0 {
            return Err(ConfigError::Validation(
                "grid.chunks_x and grid.chunks_y must be non-zero".into(),
            ));
        }
        if self.vault.part_size == 0 {
            return Err(ConfigError::Validation(
                "vault.part_size must be non-zero".into(),
            ));
        }
        let colors = [
            ("grid.chunk_color", &g.chunk_color),
            ("grid.chunk_color_alt", &g.chunk_color_alt),
            ("grid.border_color", &g.border_color),
            ("block.color", &self.block.color),
            ("star.color", &self.star.color),
            ("wedge.color", &self.wedge.color),
            ("heart.color", &self.heart.color),
            ("silent_wave.color", &self.silent_wave.color),
            ("saturn.color", &self.saturn.color),
            ("ring.color", &self.ring.color),
        ];
        if let Some((key, _)) = colors.iter().find(|(_, c)| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
        Ok(())
    }
}

/// Background grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Pixels per grid cell.
    pub tile_size: u32,
    pub chunks_x: u32,
    pub chunks_y: u32,
    /// Cells per chunk side.
    pub chunk_size: u32,
    /// Interior cell color.
    pub chunk_color: String,
    /// Interior cell color for chunk columns listed in `alt_chunk_columns`.
    pub chunk_color_alt: String,
    /// Color of the outermost ring of cells in every chunk.
    pub border_color: String,
    pub alt_chunk_columns: Vec<u32>,
    /// Marker edge length as a fraction of `tile_size`.
    pub marker_scale: f64,
    pub stroke_width: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            chunks_x: 3,
            chunks_y: 3,
            chunk_size: 20,
            chunk_color: "#a89ea9".to_string(),
            chunk_color_alt: "#8e98a5".to_string(),
            border_color: "#cececf".to_string(),
            alt_chunk_columns: vec![2],
            marker_scale: 0.75,
            stroke_width: 4.0,
        }
    }
}

/// A static-pattern formation (block, wedge, heart).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternFormation {
    pub visible: bool,
    pub mid_x: f64,
    pub mid_y: f64,
    /// Gap multiplier applied to every pattern offset.
    pub gap: f64,
    pub color: String,
    /// Center the pattern's bounding box on the midpoint.
    pub center: bool,
    pub numbered: bool,
}

impl PatternFormation {
    fn styled(visible: bool, gap: f64, color: &str) -> Self {
        Self {
            visible,
            mid_x: 30.0,
            mid_y: 30.0,
            gap,
            color: color.to_string(),
            center: true,
            numbered: false,
        }
    }

    pub fn mid(&self) -> Point {
        Point::new(self.mid_x, self.mid_y)
    }
}

impl Default for PatternFormation {
    fn default() -> Self {
        Self::styled(false, 1.0, "#000000")
    }
}

/// The parametric star: pattern settings plus inner and outer spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StarFormation {
    pub visible: bool,
    pub mid_x: f64,
    pub mid_y: f64,
    pub gap: f64,
    pub color: String,
    pub center: bool,
    pub numbered: bool,
    /// Arm length of the inner cross.
    pub inner_gap: f64,
    /// Spacing of the outer diamond.
    pub outer_gap: f64,
}

impl StarFormation {
    /// Pattern placement settings without the star-specific spacing.
    pub fn placement(&self) -> PatternFormation {
        PatternFormation {
            visible: self.visible,
            mid_x: self.mid_x,
            mid_y: self.mid_y,
            gap: self.gap,
            color: self.color.clone(),
            center: self.center,
            numbered: self.numbered,
        }
    }
}

impl Default for StarFormation {
    fn default() -> Self {
        Self {
            visible: false,
            mid_x: 30.0,
            mid_y: 30.0,
            gap: 1.0,
            color: "#0022ff".to_string(),
            center: true,
            numbered: false,
            inner_gap: 1.0,
            outer_gap: 2.0,
        }
    }
}

/// Horizontal line of markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveFormation {
    pub visible: bool,
    pub mid_x: f64,
    pub mid_y: f64,
    pub gap: f64,
    pub total_men: u32,
    pub color: String,
    pub numbered: bool,
}

impl WaveFormation {
    pub fn mid(&self) -> Point {
        Point::new(self.mid_x, self.mid_y)
    }
}

impl Default for WaveFormation {
    fn default() -> Self {
        Self {
            visible: false,
            mid_x: 30.0,
            mid_y: 42.0,
            gap: 3.5,
            total_men: 12,
            color: "#00ff8c".to_string(),
            numbered: false,
        }
    }
}

/// Two alternating columns climbing upward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaturnFormation {
    pub visible: bool,
    pub mid_x: f64,
    pub mid_y: f64,
    /// Horizontal distance between the two columns.
    pub throw_gap: f64,
    /// Vertical distance between rows.
    pub gap: f64,
    pub total_men: u32,
    pub color: String,
    pub numbered: bool,
}

impl SaturnFormation {
    pub fn mid(&self) -> Point {
        Point::new(self.mid_x, self.mid_y)
    }
}

impl Default for SaturnFormation {
    fn default() -> Self {
        Self {
            visible: false,
            mid_x: 30.0,
            mid_y: 30.0,
            throw_gap: 3.0,
            gap: 3.0,
            total_men: 12,
            color: "#8c00ff".to_string(),
            numbered: false,
        }
    }
}

/// Evenly spaced circle of markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingFormation {
    pub visible: bool,
    pub mid_x: f64,
    pub mid_y: f64,
    pub radius: f64,
    pub total_men: u32,
    /// Put an extra marker on the midpoint.
    pub with_center: bool,
    pub color: String,
    pub numbered: bool,
}

impl RingFormation {
    pub fn mid(&self) -> Point {
        Point::new(self.mid_x, self.mid_y)
    }
}

impl Default for RingFormation {
    fn default() -> Self {
        Self {
            visible: false,
            mid_x: 30.0,
            mid_y: 30.0,
            radius: 4.0,
            total_men: 11,
            with_center: true,
            color: "#ff006f".to_string(),
            numbered: false,
        }
    }
}

/// Vault browsing and packing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Maximum parallel part fetches. `None` means one per CPU core.
    /// Values larger than the core count are clamped down.
    pub max_fetches: Option<usize>,
    /// Largest plaintext slice per encrypted part when packing, in bytes.
    pub part_size: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_fetches: None,
            part_size: 8 * 1024 * 1024,
        }
    }
}

/// Resolve the effective fetch worker count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &VaultConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_fetches
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer for merging the config file and overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).unwrap_or_else(|_| toml::Value::Table(Default::default()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Parse a `--set` override like `block.mid_x=12` into a nested table.
///
/// The value is read as a TOML value; if that fails it is taken as a bare
/// string, so `star.color=#ff0000` works without quoting.
pub fn parse_override(assignment: &str) -> Result<toml::Value, ConfigError> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::Override(assignment.to_string()))?;
    let keys: Vec<&str> = path.trim().split('.').map(str::trim).collect();
    if keys.iter().any(|k| k.is_empty()) {
        return Err(ConfigError::Override(assignment.to_string()));
    }

    let raw = raw.trim();
    let mut value = toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()));

    for key in keys.iter().rev() {
        let mut table = toml::Table::new();
        table.insert((*key).to_string(), value);
        value = toml::Value::Table(table);
    }
    Ok(value)
}

/// Deserialize a fully merged value and validate it.
pub fn resolve_config(merged: toml::Value) -> Result<ToolConfig, ConfigError> {
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config: stock defaults, then `path` if it exists, then overrides.
pub fn load_config(path: &Path, overrides: &[String]) -> Result<ToolConfig, ConfigError> {
    let mut merged = stock_defaults_value();
    if let Some(file) = load_raw_config(path)? {
        merged = merge_toml(merged, file);
    }
    for assignment in overrides {
        merged = merge_toml(merged, parse_override(assignment)?);
    }
    resolve_config(merged)
}

/// Returns a fully-commented stock `melon.toml` with all keys and explanations.
///
/// Used by the `formation gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# melon configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Any key can also be set for a single run:
#   melon formation render --set block.mid_x=12 --set star.visible=true

# ---------------------------------------------------------------------------
# Background grid
# ---------------------------------------------------------------------------
[grid]
# Pixels per grid cell. Marker coordinates are multiplied by this.
tile_size = 32
# Number of chunks across and down.
chunks_x = 3
chunks_y = 3
# Cells per chunk side. The outer ring of each chunk uses border_color.
chunk_size = 20
chunk_color = "#a89ea9"
chunk_color_alt = "#8e98a5"
border_color = "#cececf"
# Chunk columns (0-based) whose interior uses chunk_color_alt.
alt_chunk_columns = [2]
# Marker "X" size as a fraction of tile_size, and its line width in pixels.
marker_scale = 0.75
stroke_width = 4.0

# ---------------------------------------------------------------------------
# Pattern formations: block (4x3), wedge, heart
# ---------------------------------------------------------------------------
# gap multiplies every pattern offset. center = true centers the pattern's
# bounding box on (mid_x, mid_y); false anchors the pattern origin there.
# numbered = true labels markers 1..n.
[block]
visible = true
mid_x = 30.0
mid_y = 30.0
gap = 2.0
color = "#eeff00"
center = true
numbered = false

[wedge]
visible = false
mid_x = 30.0
mid_y = 30.0
gap = 2.0
color = "#ff7b00"
center = true
numbered = false

[heart]
visible = false
mid_x = 30.0
mid_y = 30.0
gap = 0.5
color = "#ff0000"
center = true
numbered = false

# ---------------------------------------------------------------------------
# Star: outer diamond at outer_gap spacing, inner cross at inner_gap
# ---------------------------------------------------------------------------
[star]
visible = false
mid_x = 30.0
mid_y = 30.0
gap = 1.0
color = "#0022ff"
center = true
numbered = false
inner_gap = 1.0
outer_gap = 2.0

# ---------------------------------------------------------------------------
# Silent wave: total_men in a horizontal line, gap apart
# ---------------------------------------------------------------------------
[silent_wave]
visible = false
mid_x = 30.0
mid_y = 42.0
gap = 3.5
total_men = 12
color = "#00ff8c"
numbered = false

# ---------------------------------------------------------------------------
# Saturn: two columns throw_gap apart, climbing gap every pair
# ---------------------------------------------------------------------------
[saturn]
visible = false
mid_x = 30.0
mid_y = 30.0
throw_gap = 3.0
gap = 3.0
total_men = 12
color = "#8c00ff"
numbered = false

# ---------------------------------------------------------------------------
# Ring: total_men evenly spaced on a circle
# ---------------------------------------------------------------------------
[ring]
visible = false
mid_x = 30.0
mid_y = 30.0
radius = 4.0
total_men = 11
with_center = true
color = "#ff006f"
numbered = false

# ---------------------------------------------------------------------------
# Vault
# ---------------------------------------------------------------------------
[vault]
# Largest plaintext slice per encrypted part when packing (bytes).
part_size = 8388608
# Parallel part fetches when opening multi-part files.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_fetches = 4
"##
}
