//! Render command - generate the tiles covering a viewport.

use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tileforge::config::EngineConfig;
use tileforge::coord::GeoPoint;
use tileforge::engine::MapEngine;
use tileforge::logging::{default_log_dir, default_log_file, init_logging};
use tileforge::render::{RenderSink, TileArtifact};
use tileforge::source::MemorySourceFactory;
use tileforge::theme::{BuiltinThemeProvider, ThemeId};
use tileforge::tile::{GenerateError, TileJob};
use tracing::info;

use crate::error::CliError;

/// How long to wait for the whole batch before giving up.
const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Latitude of the view center in decimal degrees
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude of the view center in decimal degrees
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,

    /// Zoom level (defaults to the source's start zoom)
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Viewport width in pixels
    #[arg(long, default_value = "1024")]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value = "768")]
    pub height: u32,

    /// Number of tile workers (defaults to one per core)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Render theme (built-in name or theme file path)
    #[arg(long)]
    pub theme: Option<String>,

    /// Directory the tiles are written to
    #[arg(long, default_value = "tiles")]
    pub output: PathBuf,
}

/// Sink buffering artifacts and signalling per-job progress.
struct FileSink {
    artifacts: Mutex<Vec<TileArtifact>>,
    failures: AtomicUsize,
    progress: Mutex<Sender<()>>,
}

impl RenderSink for FileSink {
    fn tile_ready(&self, artifact: TileArtifact) {
        self.artifacts.lock().unwrap().push(artifact);
        let _ = self.progress.lock().unwrap().send(());
    }

    fn tile_failed(&self, _job: &TileJob, _error: &GenerateError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        let _ = self.progress.lock().unwrap().send(());
    }

    fn request_redraw(&self) {
        // The command submits its own batch; redraws need no reaction here
    }
}

/// Run the render command.
pub fn run(args: RenderArgs) -> Result<(), CliError> {
    let _logging = init_logging(Path::new(default_log_dir()), default_log_file())
        .map_err(CliError::LoggingInit)?;

    let mut config = EngineConfig::load()?;
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(theme) = &args.theme {
        config = config.with_default_theme(ThemeId::parse(theme));
    }

    let (progress_tx, progress_rx) = mpsc::channel();
    let sink = Arc::new(FileSink {
        artifacts: Mutex::new(Vec::new()),
        failures: AtomicUsize::new(0),
        progress: Mutex::new(progress_tx),
    });

    let engine = MapEngine::new(
        config,
        &MemorySourceFactory::new(),
        Arc::new(BuiltinThemeProvider::new()),
        sink.clone(),
    );
    info!("render command started");

    engine.resize(args.width, args.height);
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let zoom = args.zoom.unwrap_or(engine.position().zoom);
        engine.set_position(GeoPoint::new(lat, lon), zoom);
    } else if let Some(zoom) = args.zoom {
        engine.set_zoom(zoom);
    }

    let position = engine.position();
    let tiles = engine.view().visible_tiles();
    let source = engine.source_ref();
    let expected = tiles.len();

    println!("Rendering {} tiles around {}", expected, position);
    println!("  Viewport: {}x{}", args.width, args.height);
    println!("  Workers:  {}", engine.worker_count());

    let start = Instant::now();
    engine.submit_jobs(Some(
        tiles
            .into_iter()
            .map(|tile| TileJob::new(tile, source.clone()))
            .collect(),
    ));

    // Every job reports back exactly once, finished or failed
    let deadline = start + RENDER_TIMEOUT;
    let mut completed = 0;
    while completed < expected {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        match progress_rx.recv_timeout(deadline - now) {
            Ok(()) => completed += 1,
            Err(_) => break,
        }
    }
    let elapsed = start.elapsed();

    std::fs::create_dir_all(&args.output).map_err(|error| CliError::FileWrite {
        path: args.output.display().to_string(),
        error,
    })?;

    let artifacts = sink.artifacts.lock().unwrap().clone();
    for artifact in &artifacts {
        let tile = artifact.tile();
        let path = args
            .output
            .join(format!("{}_{}_{}.tile", tile.zoom, tile.x, tile.y));
        std::fs::write(&path, artifact.data()).map_err(|error| CliError::FileWrite {
            path: path.display().to_string(),
            error,
        })?;
    }

    let failures = sink.failures.load(Ordering::SeqCst);
    println!();
    println!(
        "Rendered {} tiles in {:.2}s",
        artifacts.len(),
        elapsed.as_secs_f64()
    );
    if failures > 0 {
        println!("  Failed: {}", failures);
    }
    if completed < expected {
        println!("  Timed out waiting for {} jobs", expected - completed);
    }
    println!("Saved to: {}", args.output.display());

    info!("render command finished");
    engine.destroy()?;
    Ok(())
}
