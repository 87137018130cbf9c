//! `key=value` text persistence for [`GenerationParams`].

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::noise::NoiseMode;
use crate::terrain::GenerationParams;

/// Format revision written on the `version=` line.
pub const CONFIG_VERSION: u32 = 2;

const HEADER: &str = "# dunegen config";

/// Errors that can occur while reading or writing a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of applying a config text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries that set a field.
    pub applied: usize,
    /// Entries skipped for an unknown key or an unparsable value.
    pub ignored: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryError {
    UnknownKey,
    BadValue,
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Every persisted field in file order.
fn entries(p: &GenerationParams) -> Vec<(&'static str, String)> {
    let v = &p.view;
    vec![
        ("octaves", p.octaves.to_string()),
        ("lacunarity", p.lacunarity.to_string()),
        ("gain", p.gain.to_string()),
        ("freq", p.freq.to_string()),
        ("amp", p.amp.to_string()),
        ("warpAmp", p.warp_amp.to_string()),
        ("warpFreq", p.warp_freq.to_string()),
        ("stretchX", p.stretch_x.to_string()),
        ("stretchY", p.stretch_y.to_string()),
        ("rotationDeg", p.rotation_deg.to_string()),
        ("ridgeBias", p.ridge_bias.to_string()),
        ("ridgePow", p.ridge_pow.to_string()),
        ("ridgeGain", p.ridge_gain.to_string()),
        ("ridgeLacunarity", p.ridge_lacunarity.to_string()),
        ("ridgeOctaves", p.ridge_octaves.to_string()),
        ("ridgeAttenuation", p.ridge_attenuation.to_string()),
        ("noiseOffsetX", p.noise_offset_x.to_string()),
        ("noiseOffsetY", p.noise_offset_y.to_string()),
        ("noiseZoom", p.noise_zoom.to_string()),
        ("cropLeft", v.crop_left.to_string()),
        ("cropRight", v.crop_right.to_string()),
        ("cropTop", v.crop_top.to_string()),
        ("cropBottom", v.crop_bottom.to_string()),
        ("gridW", p.grid_width.to_string()),
        ("gridH", p.grid_height.to_string()),
        ("terrainWidth", p.terrain_width.to_string()),
        ("terrainLength", p.terrain_length.to_string()),
        ("chunkCols", p.chunk_cols.to_string()),
        ("chunkRows", p.chunk_rows.to_string()),
        ("chunkGapVisual", p.chunk_gap_visual.to_string()),
        ("filled", flag(v.filled)),
        ("invertZ", flag(p.invert_z)),
        ("ridgedMode", flag(p.noise_mode.is_ridged())),
        ("warpEnabled", flag(p.warp_enabled)),
        ("camRotX", v.cam_rot_x.to_string()),
        ("camRotY", v.cam_rot_y.to_string()),
        ("camZoom", v.cam_zoom.to_string()),
        ("camPanX", v.cam_pan_x.to_string()),
        ("camPanY", v.cam_pan_y.to_string()),
        ("crestSmoothing", p.crest_smoothing.to_string()),
        ("crestSharpen", p.crest_sharpen.to_string()),
        ("crestWidth", p.crest_width.to_string()),
    ]
}

/// Serializes `params` to config text.
pub fn to_kv_string(params: &GenerationParams) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(&format!("version={}\n", CONFIG_VERSION));
    for (key, value) in entries(params) {
        out.push_str(key);
        out.push('=');
        out.push_str(&value);
        out.push('\n');
    }
    out
}

fn parse_int(s: &str) -> Result<i64, EntryError> {
    s.trim().parse::<i64>().map_err(|_| EntryError::BadValue)
}

/// Unsigned fields accept negative input and clamp it to zero.
fn parse_u32(s: &str) -> Result<u32, EntryError> {
    parse_int(s).map(|v| v.clamp(0, u32::MAX as i64) as u32)
}

fn parse_f32(s: &str) -> Result<f32, EntryError> {
    s.trim().parse::<f32>().map_err(|_| EntryError::BadValue)
}

fn parse_bool(s: &str) -> Result<bool, EntryError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EntryError::BadValue),
    }
}

fn apply_entry(p: &mut GenerationParams, key: &str, val: &str) -> Result<(), EntryError> {
    match key {
        "octaves" => p.octaves = parse_u32(val)?,
        "lacunarity" => p.lacunarity = parse_f32(val)?,
        "gain" => p.gain = parse_f32(val)?,
        "freq" => p.freq = parse_f32(val)?,
        "amp" => p.amp = parse_f32(val)?,

        "warpAmp" => p.warp_amp = parse_f32(val)?,
        "warpFreq" => p.warp_freq = parse_f32(val)?,

        "stretchX" => p.stretch_x = parse_f32(val)?,
        "stretchY" => p.stretch_y = parse_f32(val)?,
        "rotationDeg" => p.rotation_deg = parse_f32(val)?,

        "ridgeBias" => p.ridge_bias = parse_f32(val)?,
        "ridgePow" => p.ridge_pow = parse_f32(val)?,
        "ridgeGain" => p.ridge_gain = parse_f32(val)?,
        "ridgeLacunarity" => p.ridge_lacunarity = parse_f32(val)?,
        "ridgeOctaves" => p.ridge_octaves = parse_u32(val)?,
        "ridgeAttenuation" => p.ridge_attenuation = parse_f32(val)?,

        "noiseOffsetX" => p.noise_offset_x = parse_f32(val)?,
        "noiseOffsetY" => p.noise_offset_y = parse_f32(val)?,
        "noiseZoom" => p.noise_zoom = parse_f32(val)?,

        "cropLeft" => p.view.crop_left = parse_u32(val)?,
        "cropRight" => p.view.crop_right = parse_u32(val)?,
        "cropTop" => p.view.crop_top = parse_u32(val)?,
        "cropBottom" => p.view.crop_bottom = parse_u32(val)?,

        "gridW" => p.grid_width = parse_u32(val)?,
        "gridH" => p.grid_height = parse_u32(val)?,

        "terrainWidth" => p.terrain_width = parse_f32(val)?,
        "terrainLength" => p.terrain_length = parse_f32(val)?,

        "chunkCols" => p.chunk_cols = parse_u32(val)?,
        "chunkRows" => p.chunk_rows = parse_u32(val)?,
        "chunkGapVisual" => p.chunk_gap_visual = parse_f32(val)?,

        "filled" => p.view.filled = parse_bool(val)?,
        "invertZ" => p.invert_z = parse_bool(val)?,
        "ridgedMode" => {
            p.noise_mode = if parse_bool(val)? {
                NoiseMode::Ridged
            } else {
                NoiseMode::Fbm
            }
        }
        "warpEnabled" => p.warp_enabled = parse_bool(val)?,

        "camRotX" => p.view.cam_rot_x = parse_f32(val)?,
        "camRotY" => p.view.cam_rot_y = parse_f32(val)?,
        "camZoom" => p.view.cam_zoom = parse_f32(val)?,
        "camPanX" => p.view.cam_pan_x = parse_f32(val)?,
        "camPanY" => p.view.cam_pan_y = parse_f32(val)?,

        "crestSmoothing" => p.crest_smoothing = parse_f32(val)?,
        "crestSharpen" => p.crest_sharpen = parse_f32(val)?,
        "crestWidth" => p.crest_width = parse_f32(val)?,

        _ => return Err(EntryError::UnknownKey),
    }
    Ok(())
}

/// Applies config text onto `params`, then clamps it.
///
/// Keys missing from `text` keep their current value. Unknown keys and values
/// that fail to parse are skipped with a warning.
pub fn apply_kv(params: &mut GenerationParams, text: &str) -> LoadReport {
    let mut report = LoadReport::default();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key == "version" {
            continue;
        }

        match apply_entry(params, key, value) {
            Ok(()) => report.applied += 1,
            Err(EntryError::UnknownKey) => {
                tracing::warn!(line = line_no + 1, key, "ignoring unknown config key");
                report.ignored += 1;
            }
            Err(EntryError::BadValue) => {
                tracing::warn!(line = line_no + 1, key, value, "ignoring unparsable config value");
                report.ignored += 1;
            }
        }
    }

    params.clamp_safety();
    report
}

/// Writes `params` to `path`.
pub fn save_params(params: &GenerationParams, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_kv_string(params))?;
    tracing::info!(path = %path.display(), "saved config");
    Ok(())
}

/// Reads `path` and applies it onto `params`.
pub fn load_params_into(params: &mut GenerationParams, path: &Path) -> Result<LoadReport, ConfigError> {
    let text = fs::read_to_string(path)?;
    let report = apply_kv(params, &text);
    tracing::info!(
        path = %path.display(),
        applied = report.applied,
        ignored = report.ignored,
        "loaded config"
    );
    Ok(report)
}

/// Reads `path` on top of the default parameters.
pub fn load_params(path: &Path) -> Result<GenerationParams, ConfigError> {
    let mut params = GenerationParams::default();
    load_params_into(&mut params, path)?;
    Ok(params)
}
