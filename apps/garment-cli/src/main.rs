use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use garment_assets::{AssetSource, ModelCache, TARGET_MODEL_SIZE, import_cached, load_model};
use garment_canvas::{TILE_LINE_WIDTH, TILE_SIZE, TILE_SPACING, tile_texture};
use garment_common::ViewerConfig;
use garment_persist::{SESSION_SCHEMA_VERSION, SessionStore, export_png};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "garment-cli", about = "Command-line tools for garment paint")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default settings
    Info,
    /// Download a model into the viewer's cache and print its summary
    Fetch {
        /// Model URL
        url: String,
        /// Cache directory (defaults to the viewer's)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Import a model (URL or local path) and print its summary
    Inspect {
        /// Model URL or .glb/.gltf path
        source: String,
        /// Cache directory for remote models (defaults to the viewer's)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Rescale so the largest dimension matches this size
        #[arg(long, default_value_t = TARGET_MODEL_SIZE)]
        target_size: f32,
    },
    /// Write the skybox tile texture as PNG
    Tiles {
        /// Output PNG path
        #[arg(short, long, default_value = "tiles.png")]
        out: PathBuf,
        /// Texture size in pixels
        #[arg(long, default_value_t = TILE_SIZE)]
        size: u32,
        /// Distance between grid lines
        #[arg(long, default_value_t = TILE_SPACING)]
        spacing: u32,
    },
    /// Export the paint layer of the latest saved session as PNG
    Export {
        /// Session directory
        #[arg(long, default_value = "session_data")]
        session_dir: PathBuf,
        /// Output PNG path (defaults to the session's exports folder)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check every saved session against the integrity manifest
    Verify {
        /// Session directory
        #[arg(long, default_value = "session_data")]
        session_dir: PathBuf,
    },
}

/// The cache the desktop viewer reads unless told otherwise.
fn model_cache(dir: Option<PathBuf>) -> ModelCache {
    ModelCache::new(dir.unwrap_or_else(|| ViewerConfig::default().cache_dir))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            let config = ViewerConfig::default();
            println!("garment-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("default model: {}", config.model);
            println!("model cache: {}", config.cache_dir.display());
            println!(
                "canvas: {0}x{0}, pencil width {1}, eraser radius {2}",
                config.canvas_size, config.line_width, config.eraser_radius
            );
            println!("model target size: {TARGET_MODEL_SIZE}");
            println!("session schema: v{SESSION_SCHEMA_VERSION}");
        }
        Commands::Fetch { url, cache_dir } => {
            let source = AssetSource::parse(&url);
            let AssetSource::Url(url) = source else {
                bail!("fetch expects an http(s) URL, got {url}");
            };
            let cache = model_cache(cache_dir);
            tracing::info!("fetching {url} into {}", cache.dir().display());
            let name = AssetSource::Url(url.clone()).display_name();
            let model = import_cached(&cache, &url, &name)?;
            println!("cached at {}", cache.path_for(&url).display());
            println!("{}", model.summary());
        }
        Commands::Inspect {
            source,
            cache_dir,
            target_size,
        } => {
            let source = AssetSource::parse(&source);
            let cache = model_cache(cache_dir);
            let model = load_model(&source, Some(&cache), target_size)
                .with_context(|| format!("failed to load {source}"))?;
            println!("{}", model.summary());
            for mesh in &model.meshes {
                println!(
                    "  {}: vertices={} triangles={} uvs={}",
                    mesh.name,
                    mesh.vertex_count(),
                    mesh.triangle_count(),
                    if mesh.is_paintable() { "yes" } else { "no" }
                );
            }
            if !model.is_paintable() {
                println!("warning: no mesh has texture coordinates, nothing can be painted");
            }
        }
        Commands::Tiles { out, size, spacing } => {
            let texture = tile_texture(size, spacing, TILE_LINE_WIDTH)?;
            export_png(&texture, &out)?;
            println!("wrote {size}x{size} tile texture to {}", out.display());
        }
        Commands::Export { session_dir, out } => {
            let store = SessionStore::open(&session_dir)?;
            let session = store.load_latest()?;
            let canvas = session.restore_canvas()?;
            let out = out.unwrap_or_else(|| store.next_export_path());
            export_png(&canvas, &out)?;
            println!(
                "exported {}x{} paint layer to {}",
                session.canvas_width,
                session.canvas_height,
                out.display()
            );
        }
        Commands::Verify { session_dir } => {
            let store = SessionStore::open(&session_dir)?;
            tracing::debug!("verifying {} manifest entries", store.manifest().entries.len());
            store.verify_integrity()?;
            println!(
                "session store OK: {} snapshot(s), schema v{}",
                store.meta().snapshot_count,
                store.meta().session_schema_version
            );
        }
    }

    Ok(())
}
