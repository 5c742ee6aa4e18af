//! waste_sorter - classify waste from images or a camera and keep a local log

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

use waste_sorter::config::SorterConfig;
use waste_sorter::error::validate_threshold;
use waste_sorter::sink::FrameOutput;
use waste_sorter::{
    load_backend, open_camera, AnimationSet, CaptureGuard, ConsoleSink, Dashboard,
    DetectionAdapter, Frame, HttpAnimationSource, LiveLoop, LiveSettings, Pipeline,
    PresentationSink, SorterError, SqliteWasteLogStore, Status, StopReason, StopToken,
    UnavailableWasteLogStore, Verdict, WasteLogStore,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the waste log database (overrides config).
    #[arg(long, global = true)]
    db: Option<String>,
    /// Detection model path, or stub://labels for a scripted detector.
    #[arg(long, global = true)]
    model: Option<String>,
    /// Camera device: /dev/videoN, dir://<path> or stub://<name>.
    #[arg(long, global = true)]
    camera: Option<String>,
    /// Write annotated frames into this directory.
    #[arg(long, global = true, value_name = "DIR")]
    out_dir: Option<PathBuf>,
    /// Skip fetching verdict animations.
    #[arg(long, global = true)]
    no_animations: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, global = true, default_value = "auto", value_name = "MODE")]
    ui: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a JPG/PNG image file.
    Upload {
        image: PathBuf,
        /// Detection sensitivity in [0, 1].
        #[arg(long, env = "WASTE_SORTER_UPLOAD_CONF")]
        confidence: Option<f32>,
    },
    /// Capture one frame from the camera and classify it.
    Snapshot {
        /// Detection sensitivity in [0, 1].
        #[arg(long)]
        confidence: Option<f32>,
    },
    /// Classify camera frames continuously until Ctrl-C.
    Live {
        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<u64>,
        /// Classify without appending to the waste log.
        #[arg(long)]
        no_log: bool,
        /// Overwrite this file with the latest annotated frame.
        #[arg(long, value_name = "FILE")]
        preview: Option<PathBuf>,
    },
    /// Show per-item counts of everything logged so far.
    Dashboard,
    /// List logged detections.
    History {
        /// Only the most recent N entries.
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let mut cfg = SorterConfig::load()?;
    if let Some(db) = &args.db {
        cfg.db_path = db.clone();
    }
    if let Some(model) = &args.model {
        cfg.model.path = model.clone();
    }
    if let Some(camera) = &args.camera {
        cfg.camera.device = camera.clone();
    }
    if args.no_animations {
        cfg.animations.enabled = false;
    }

    match args.command {
        Command::Dashboard => {
            let store = open_store(&ui, &cfg)?;
            let dashboard = Dashboard::load(&store)?;
            ConsoleSink::default().show_dashboard(&dashboard);
            Ok(())
        }
        Command::History { limit, json } => print_history(&open_store(&ui, &cfg)?, limit, json),
        Command::Upload { image, confidence } => {
            let threshold = validate_threshold(confidence.unwrap_or(cfg.upload_confidence))?;
            let frame = Frame::open(&image)?;
            let mut adapter = load_detector(&ui, &cfg)?;
            let animations = load_animations(&ui, &cfg);
            let mut sink = ConsoleSink::new(frame_output(args.out_dir, None));
            let mut store = open_store_or_unavailable(&ui, &cfg, &mut sink);
            Pipeline::new(&mut adapter, store.as_mut(), &mut sink)
                .with_animations(&animations)
                .process_image(&frame, threshold)?;
            Ok(())
        }
        Command::Snapshot { confidence } => {
            let threshold = validate_threshold(confidence.unwrap_or(cfg.upload_confidence))?;
            let mut adapter = load_detector(&ui, &cfg)?;
            let animations = load_animations(&ui, &cfg);
            let frame = {
                let _stage = ui.stage("Capture snapshot");
                let mut camera =
                    open_camera(&cfg.camera.device, cfg.camera.width, cfg.camera.height)?;
                let mut guard = CaptureGuard::acquire(camera.as_mut())?;
                guard.read_frame()?
            };
            let mut sink = ConsoleSink::new(frame_output(args.out_dir, None));
            let mut store = open_store_or_unavailable(&ui, &cfg, &mut sink);
            Pipeline::new(&mut adapter, store.as_mut(), &mut sink)
                .with_animations(&animations)
                .process_image(&frame, threshold)?;
            Ok(())
        }
        Command::Live {
            max_frames,
            no_log,
            preview,
        } => {
            let mut adapter = load_detector(&ui, &cfg)?;
            let mut camera = open_camera(&cfg.camera.device, cfg.camera.width, cfg.camera.height)?;

            let stop = StopToken::new();
            let handler_stop = stop.clone();
            ctrlc::set_handler(move || {
                log::info!("stop requested");
                handler_stop.request_stop();
            })
            .context("error setting Ctrl-C handler")?;

            let settings = LiveSettings {
                confidence_threshold: cfg.live_confidence,
                max_frames,
            };
            let report = {
                let ticker = ui.ticker("live");
                let mut sink = LiveSink {
                    console: ConsoleSink::new(frame_output(args.out_dir, preview)),
                    ticker: &ticker,
                };
                let mut store = open_store_or_unavailable(&ui, &cfg, &mut sink);
                let pipeline =
                    Pipeline::new(&mut adapter, store.as_mut(), &mut sink).with_logging(!no_log);
                LiveLoop::new(pipeline, settings).run(camera.as_mut(), &stop)
            };

            eprintln!(
                "live: {} frames, {} classified, {} logged",
                report.frames_processed, report.items_classified, report.items_logged
            );
            match report.stop_reason {
                StopReason::StopRequested | StopReason::FrameLimit => Ok(()),
                StopReason::CaptureFailed(message) => {
                    Err(SorterError::CaptureFailure(message).into())
                }
                StopReason::DetectionFailed(message) => Err(anyhow!(message)),
            }
        }
    }
}

fn open_store(ui: &ui::Ui, cfg: &SorterConfig) -> Result<SqliteWasteLogStore> {
    let _stage = ui.stage("Open waste log");
    SqliteWasteLogStore::open(&cfg.db_path)
}

/// Classifying modes keep going without a log; each append then reports a
/// storage warning.
fn open_store_or_unavailable(
    ui: &ui::Ui,
    cfg: &SorterConfig,
    sink: &mut dyn PresentationSink,
) -> Box<dyn WasteLogStore> {
    match open_store(ui, cfg) {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("could not open waste log {}: {:#}", cfg.db_path, e);
            sink.show_status(&Status::Warning(format!("Waste log unavailable: {:#}", e)));
            Box::new(UnavailableWasteLogStore::new(format!("{:#}", e)))
        }
    }
}

fn load_detector(ui: &ui::Ui, cfg: &SorterConfig) -> Result<DetectionAdapter> {
    let _stage = ui.stage("Load detection model");
    let backend = load_backend(&cfg.model_spec()).map_err(|e| {
        log::error!("could not load model: {:#}", e);
        e
    })?;
    let adapter = DetectionAdapter::from_boxed(backend);
    log::info!("detector backend: {}", adapter.backend_name());
    Ok(adapter)
}

fn load_animations(ui: &ui::Ui, cfg: &SorterConfig) -> AnimationSet {
    if !cfg.animations.enabled {
        return AnimationSet::empty();
    }
    let _stage = ui.stage("Fetch animations");
    AnimationSet::load(
        &HttpAnimationSource::new(cfg.animations.timeout),
        &cfg.animations.biodegradable_url,
        &cfg.animations.non_biodegradable_url,
    )
}

fn frame_output(out_dir: Option<PathBuf>, preview: Option<PathBuf>) -> FrameOutput {
    match (preview, out_dir) {
        (Some(path), _) => FrameOutput::Latest(path),
        (None, Some(dir)) => FrameOutput::Sequence(dir),
        (None, None) => FrameOutput::Discard,
    }
}

fn print_history(store: &dyn WasteLogStore, limit: Option<usize>, json: bool) -> Result<()> {
    let all = store.read_all()?;
    let skip = limit.map_or(0, |n| all.len().saturating_sub(n));
    let entries = &all[skip..];

    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if all.is_empty() {
        println!("No data yet. Start detecting!");
        return Ok(());
    }
    for entry in entries {
        println!(
            "#{:<5} {}  {:<16} {:<18} {:.2}",
            entry.id(),
            entry.timestamp(),
            entry.class_name(),
            entry.waste_type(),
            entry.confidence()
        );
    }
    Ok(())
}

/// Console sink that routes live status lines to the frame ticker when one is shown.
struct LiveSink<'t> {
    console: ConsoleSink,
    ticker: &'t ui::Ticker,
}

impl PresentationSink for LiveSink<'_> {
    fn show_frame(&mut self, frame: &Frame, caption: &str) {
        self.ticker.frame();
        self.console.show_frame(frame, caption);
    }

    fn show_verdict(&mut self, verdict: &Verdict) {
        self.console.show_verdict(verdict);
    }

    fn show_status(&mut self, status: &Status) {
        if self.ticker.is_pretty() && !status.is_error() {
            self.ticker.status(status.message());
        } else {
            self.console.show_status(status);
        }
    }

    fn show_dashboard(&mut self, dashboard: &Dashboard) {
        self.console.show_dashboard(dashboard);
    }
}
