use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::{LevelFilter, error, info};
use simplelog::{Config, WriteLogger};

use mangaview::event_source::KeyboardEventSource;
use mangaview::panic_handler::{initialize_panic_handler, restore_terminal};
use mangaview::pdf::{DEFAULT_WORKERS, FitMode, MupdfEngine};
use mangaview::reader::{PassOutcome, SelectedFile, ViewportMetrics};
use mangaview::settings::{FileStore, KeyValueStore, MemoryStore, ReadingDirection, ViewMode};
use mangaview::{Viewer, ViewerConfig, run_with_event_source, settle};

const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Single,
    Spread,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    Ltr,
    Rtl,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FitArg {
    Page,
    Width,
    Height,
}

/// Page-by-page manga and comic PDF viewer
#[derive(Parser, Debug)]
#[command(name = "mangaview")]
#[command(about = "Render manga/comic PDF pages with spreads and right-to-left reading", long_about = None)]
struct Args {
    /// PDF file to open
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Page to show (1-based, clamped to the document)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Page layout; persisted like any other setting change
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Reading direction; persisted
    #[arg(long, value_enum)]
    direction: Option<DirectionArg>,

    /// Show the first page alone in spread mode; persisted
    #[arg(long)]
    cover: Option<bool>,

    /// Fit mode used for the render
    #[arg(long, value_enum)]
    fit: Option<FitArg>,

    /// Absolute zoom scale, overrides --fit
    #[arg(long)]
    zoom: Option<f32>,

    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Viewport height in CSS pixels
    #[arg(long, default_value_t = 800.0)]
    height: f32,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Write the rendered view to this PNG file
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Keep running and read keys from the terminal
    #[arg(long, short)]
    interactive: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Log file path
    #[arg(long, default_value = "mangaview.log")]
    log_file: PathBuf,

    /// Keep settings in memory instead of the config directory
    #[arg(long)]
    no_persist: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        args.log_level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("creating log file {}", args.log_file.display()))?,
    )?;
    initialize_panic_handler();
    info!("Starting mangaview with {}", args.file.display());

    let store = if args.no_persist {
        None
    } else {
        FileStore::in_config_dir()
    };
    let result = match store {
        Some(store) => run(&args, store),
        None => run(&args, MemoryStore::new()),
    };
    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

fn run<S: KeyValueStore>(args: &Args, store: S) -> Result<()> {
    let config = ViewerConfig {
        viewport: ViewportMetrics {
            width: args.width,
            height: args.height,
            device_pixel_ratio: args.dpr,
        },
        ..ViewerConfig::default()
    };
    let mut viewer = Viewer::with_config(store, Box::new(MupdfEngine::new(DEFAULT_WORKERS)), config);

    if let Some(mode) = args.mode {
        viewer.set_view_mode(match mode {
            ModeArg::Single => ViewMode::Single,
            ModeArg::Spread => ViewMode::Spread,
        });
    }
    if let Some(direction) = args.direction {
        viewer.set_reading_direction(match direction {
            DirectionArg::Ltr => ReadingDirection::Ltr,
            DirectionArg::Rtl => ReadingDirection::Rtl,
        });
    }
    if let Some(cover) = args.cover {
        viewer.set_treat_first_page_as_cover(cover);
    }

    let file = SelectedFile::from_path(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let now = Instant::now();
    if let Err(e) = viewer.load_file(file, now) {
        bail!("{}", e.user_message());
    }
    viewer.go_to_page(args.page, now);

    match (args.zoom, args.fit) {
        (Some(scale), _) => viewer.set_custom_scale(scale),
        (None, Some(fit)) => viewer.set_fit_mode(match fit {
            FitArg::Page => FitMode::Page,
            FitArg::Width => FitMode::Width,
            FitArg::Height => FitMode::Height,
        }),
        (None, None) => {}
    }

    match settle(&mut viewer, RENDER_TIMEOUT)? {
        Some(PassOutcome::Failed(message)) => bail!("{message}"),
        _ => write_snapshot(&viewer, args)?,
    }
    eprintln!(
        "{}: page {} of {}",
        viewer.title().unwrap_or("document"),
        viewer.page_indicator(),
        viewer.num_pages().unwrap_or(0)
    );

    if args.interactive {
        enable_raw_mode()?;
        let mut source = KeyboardEventSource;
        let result = run_with_event_source(&mut viewer, &mut source, |viewer| {
            write_snapshot(viewer, args)?;
            eprint!(
                "\rpage {} of {}  ",
                viewer.page_indicator(),
                viewer.num_pages().unwrap_or(0)
            );
            Ok(())
        });
        disable_raw_mode()?;
        restore_terminal();
        result?;
    } else {
        viewer.dispose();
    }
    Ok(())
}

fn write_snapshot<S: KeyValueStore>(viewer: &Viewer<S>, args: &Args) -> Result<()> {
    let Some(out) = &args.out else {
        return Ok(());
    };
    let Some(image) = viewer.snapshot() else {
        bail!("nothing was rendered");
    };
    image
        .save(out)
        .with_context(|| format!("writing {}", out.display()))?;
    info!("Wrote {}x{} view to {}", image.width(), image.height(), out.display());
    Ok(())
}
