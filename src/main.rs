//! Dunegen CLI - procedural dune height-field generator.
//!
//! Generates chunked height fields from a seed and a key=value config, and
//! exports them as grayscale heightmaps.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dunegen::config::{load_params, save_params, DEFAULT_CONFIG_FILE};
use dunegen::export::{
    chunk_atlas_rgba8, export_all_chunks_png, export_atlas_png, export_pgm, export_png,
    timestamped_filename, BitDepth, PngExportOptions,
};
use dunegen::noise::{NoiseMode, DEFAULT_SEED};
use dunegen::terrain::{generate_chunk_grid, GenerationParams};
use dunegen::init_noise;

/// Atlas gap used by `generate --atlas` and the `info` size estimate.
const DEFAULT_ATLAS_GAP: u32 = 2;

/// Largest accepted chunk resolution per axis.
const MAX_RESOLUTION: u32 = 8192;

/// Largest accepted atlas gap, in pixels.
const MAX_ATLAS_GAP: u32 = 8192;

/// Procedural dune height-field generator.
#[derive(Parser)]
#[command(name = "dunegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the chunk grid and export heightmaps.
    Generate {
        /// Config file to start from (defaults are used when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed of the noise permutation table.
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u32,

        /// Vertices per chunk along X.
        #[arg(long)]
        width: Option<u32>,

        /// Vertices per chunk along Y.
        #[arg(long)]
        height: Option<u32>,

        /// Chunk columns.
        #[arg(long)]
        cols: Option<u32>,

        /// Chunk rows.
        #[arg(long)]
        rows: Option<u32>,

        /// Fractal flavor.
        #[arg(long)]
        mode: Option<ModeArg>,

        /// Disable domain warping.
        #[arg(long)]
        no_warp: bool,

        /// Negate heights.
        #[arg(long)]
        invert: bool,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "heightmap")]
        name: String,

        /// Export format for chunk [0, 0].
        #[arg(short, long, default_value = "png")]
        format: ExportFormat,

        /// Also export every chunk as a separate PNG.
        #[arg(long)]
        all_chunks: bool,

        /// Also export an atlas of all chunks.
        #[arg(long)]
        atlas: bool,

        /// Gap between chunks in the atlas, in pixels.
        #[arg(long, default_value_t = DEFAULT_ATLAS_GAP)]
        atlas_gap: u32,

        /// Append a local timestamp to output names.
        #[arg(long)]
        timestamp: bool,
    },

    /// Write the default configuration file.
    InitConfig {
        /// Destination path.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },

    /// Print the resolved parameters and grid sizes.
    Info {
        /// Config file to inspect (defaults are used when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Smooth fractal Brownian motion.
    Fbm,
    /// Ridged fractal noise with sharp crests.
    Ridged,
}

impl From<ModeArg> for NoiseMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fbm => NoiseMode::Fbm,
            ModeArg::Ridged => NoiseMode::Ridged,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// 8-bit grayscale PNG.
    Png,
    /// 16-bit grayscale PNG.
    Png16,
    /// 8-bit binary PGM.
    Pgm,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            seed,
            width,
            height,
            cols,
            rows,
            mode,
            no_warp,
            invert,
            output,
            name,
            format,
            all_chunks,
            atlas,
            atlas_gap,
            timestamp,
        } => {
            let mut params = load_or_default(config.as_deref());
            if let Some(w) = width {
                params.grid_width = w;
            }
            if let Some(h) = height {
                params.grid_height = h;
            }
            if let Some(c) = cols {
                params.chunk_cols = c;
            }
            if let Some(r) = rows {
                params.chunk_rows = r;
            }
            if let Some(m) = mode {
                params.noise_mode = m.into();
            }
            if no_warp {
                params.warp_enabled = false;
            }
            if invert {
                params.invert_z = true;
            }

            let options = GenerateOptions {
                output,
                name,
                format,
                all_chunks,
                atlas,
                atlas_gap,
                timestamp,
            };
            run_generate(seed, params, &options);
        }
        Commands::InitConfig { output } => {
            run_init_config(&output);
        }
        Commands::Info { config } => {
            run_info(config.as_deref());
        }
    }
}

struct GenerateOptions {
    output: PathBuf,
    name: String,
    format: ExportFormat,
    all_chunks: bool,
    atlas: bool,
    atlas_gap: u32,
    timestamp: bool,
}

impl GenerateOptions {
    fn file_name(&self, stem: &str, ext: &str) -> String {
        if self.timestamp {
            timestamped_filename(stem, ext)
        } else {
            format!("{}.{}", stem, ext)
        }
    }
}

fn load_or_default(config: Option<&Path>) -> GenerationParams {
    match config {
        Some(path) => load_params(path).unwrap_or_else(|e| {
            eprintln!("Error loading config {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => GenerationParams::default(),
    }
}

/// Rejects requests too large to generate or export.
fn check_limits(params: &GenerationParams, atlas_gap: u32) -> Result<(), String> {
    if params.grid_width > MAX_RESOLUTION || params.grid_height > MAX_RESOLUTION {
        return Err(format!(
            "Chunk resolution must be at most {} per axis",
            MAX_RESOLUTION
        ));
    }
    if atlas_gap > MAX_ATLAS_GAP {
        return Err(format!("Atlas gap must be at most {} pixels", MAX_ATLAS_GAP));
    }
    Ok(())
}

fn run_generate(seed: u32, mut params: GenerationParams, options: &GenerateOptions) {
    if let Err(msg) = check_limits(&params, options.atlas_gap) {
        eprintln!("Error: {}", msg);
        std::process::exit(1);
    }
    params.clamp_safety();

    println!("Dunegen - Procedural Dune Generator");
    println!("===================================");
    println!("Seed: {}", seed);
    println!(
        "Chunks: {}x{} of {}x{} vertices ({} x {} world units each)",
        params.chunk_cols,
        params.chunk_rows,
        params.grid_width,
        params.grid_height,
        params.terrain_width,
        params.terrain_length
    );
    println!(
        "Noise: {} (octaves={}, lacunarity={}, gain={}, freq={}, amp={})",
        params.noise_mode.name(),
        params.octaves,
        params.lacunarity,
        params.gain,
        params.freq,
        params.amp
    );
    println!("Warp: {}", if params.warp_enabled { "on" } else { "off" });
    println!("Output: {}", options.output.display());

    let start = Instant::now();

    println!("\nGenerating...");
    let table = init_noise(seed);
    let grid = generate_chunk_grid(&table, &params);

    let gen_time = start.elapsed();
    println!("Generation completed in {:.2?}", gen_time);

    let (min_h, max_h) = grid.height_range();
    println!("Height range: [{:.4}, {:.4}]", min_h, max_h);

    println!("\nExporting heightmaps...");
    let export_start = Instant::now();

    std::fs::create_dir_all(&options.output).unwrap_or_else(|e| {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    });

    let Some(primary) = grid.primary() else {
        eprintln!("Error: No chunk generated");
        std::process::exit(1);
    };
    let (w, h) = (grid.chunk_width(), grid.chunk_height());
    let stem = format!("{}_chunk_r0_c0", options.name);

    match options.format {
        ExportFormat::Png | ExportFormat::Png16 => {
            let png_options = PngExportOptions {
                bit_depth: match options.format {
                    ExportFormat::Png16 => BitDepth::Sixteen,
                    _ => BitDepth::Eight,
                },
                ..Default::default()
            };
            let path = options.output.join(options.file_name(&stem, "png"));
            export_png(primary, w, h, &path, &png_options).unwrap_or_else(|e| {
                eprintln!("Error exporting PNG: {}", e);
                std::process::exit(1);
            });
            println!("  Exported chunk [0, 0]: {}", path.display());
        }
        ExportFormat::Pgm => {
            let path = options.output.join(options.file_name(&stem, "pgm"));
            export_pgm(primary, w, h, &path).unwrap_or_else(|e| {
                eprintln!("Error exporting PGM: {}", e);
                std::process::exit(1);
            });
            println!("  Exported chunk [0, 0]: {}", path.display());
        }
    }

    if options.all_chunks {
        let prefix = if options.timestamp {
            let stamped = timestamped_filename(&format!("{}_chunks", options.name), "png");
            stamped.trim_end_matches(".png").to_string()
        } else {
            format!("{}_chunks", options.name)
        };
        let summary =
            export_all_chunks_png(&grid, &options.output, &prefix, &PngExportOptions::default())
                .unwrap_or_else(|e| {
                    eprintln!("Error exporting chunks: {}", e);
                    std::process::exit(1);
                });
        println!("  Exported chunk PNGs: {} ({}_r*_c*.png)", summary, prefix);
        if !summary.is_complete() {
            eprintln!("Error: Some chunks failed to export");
            std::process::exit(1);
        }
    }

    if options.atlas {
        let atlas = chunk_atlas_rgba8(&grid, options.atlas_gap).unwrap_or_else(|e| {
            eprintln!("Error building atlas: {}", e);
            std::process::exit(1);
        });
        let path = options
            .output
            .join(options.file_name(&format!("{}_atlas", options.name), "png"));
        export_atlas_png(&atlas, &path).unwrap_or_else(|e| {
            eprintln!("Error exporting atlas: {}", e);
            std::process::exit(1);
        });
        println!(
            "  Exported atlas {}x{}: {}",
            atlas.width,
            atlas.height,
            path.display()
        );
    }

    let export_time = export_start.elapsed();
    let total_time = start.elapsed();

    println!("Export completed in {:.2?}", export_time);
    println!("\nTotal time: {:.2?}", total_time);
    println!("Done!");
}

fn run_init_config(output: &Path) {
    save_params(&GenerationParams::default(), output).unwrap_or_else(|e| {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    });
    println!("Wrote default config to {}", output.display());
}

fn run_info(config: Option<&Path>) {
    let mut params = load_or_default(config);
    params.clamp_safety();

    let per_chunk = params.vertices_per_chunk() as u64;
    let chunks = params.chunk_count() as u64;
    let total = per_chunk * chunks;
    let bytes_heights = total * 4; // f32
    let bytes_png8 = per_chunk * chunks;
    let bytes_atlas = atlas_bytes(&params, DEFAULT_ATLAS_GAP);

    println!("Dunegen - Configuration Info");
    println!("============================");
    println!();
    match serde_json::to_string_pretty(&params) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing parameters: {}", e),
    }
    println!();
    println!("Vertex counts:");
    println!("  Per chunk: {:>12}", per_chunk);
    println!("  Chunks:    {:>12}", chunks);
    println!("  Total:     {:>12}", total);
    println!();
    println!("Memory usage (in-memory):");
    println!(
        "  Heights:   {:>12} bytes ({:.2} MB)",
        bytes_heights,
        to_mb(bytes_heights)
    );
    println!();
    println!("Export sizes (uncompressed):");
    println!(
        "  Chunk PNGs (8-bit): {:>10} bytes ({:.2} MB) - {} files",
        bytes_png8,
        to_mb(bytes_png8),
        chunks
    );
    println!(
        "  Atlas (RGBA):       {:>10} bytes ({:.2} MB)",
        bytes_atlas,
        to_mb(bytes_atlas)
    );
}

fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// Uncompressed RGBA size of the chunk atlas.
fn atlas_bytes(params: &GenerationParams, gap: u32) -> u64 {
    let cols = params.chunk_cols.max(1) as u64;
    let rows = params.chunk_rows.max(1) as u64;
    let gap = gap as u64;
    let aw = cols * params.grid_width as u64 + (cols - 1) * gap;
    let ah = rows * params.grid_height as u64 + (rows - 1) * gap;
    aw * ah * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atlas_gap_flag_default() {
        let cli = Cli::parse_from(["dunegen", "generate", "--atlas"]);
        match cli.command {
            Commands::Generate { atlas_gap, atlas, .. } => {
                assert!(atlas);
                assert_eq!(atlas_gap, DEFAULT_ATLAS_GAP);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_atlas_bytes_matches_atlas_image() {
        let params = GenerationParams {
            grid_width: 4,
            grid_height: 3,
            chunk_cols: 3,
            chunk_rows: 2,
            ..Default::default()
        };
        let grid = generate_chunk_grid(&init_noise(1), &params);
        let atlas = chunk_atlas_rgba8(&grid, DEFAULT_ATLAS_GAP).unwrap();
        assert_eq!(atlas_bytes(&params, DEFAULT_ATLAS_GAP), atlas.rgba.len() as u64);
    }

    #[test]
    fn test_check_limits() {
        let params = GenerationParams::default();
        assert!(check_limits(&params, DEFAULT_ATLAS_GAP).is_ok());
        assert!(check_limits(&params, MAX_ATLAS_GAP + 1).is_err());

        let huge = GenerationParams {
            grid_width: MAX_RESOLUTION + 1,
            ..Default::default()
        };
        assert!(check_limits(&huge, 0).is_err());
    }

    #[test]
    fn test_non_positive_zoom_is_clamped_before_generation() {
        for zoom in [0.0, -3.0, f32::NAN] {
            let params = GenerationParams {
                noise_zoom: zoom,
                ..Default::default()
            }
            .sanitized();
            assert!(params.noise_zoom > 0.0, "zoom {} stayed non-positive", zoom);
        }
    }
}
