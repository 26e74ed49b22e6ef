mod logger;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_viewer::engines::lopdf::LopdfEngine;
use pdf_viewer::*;
use std::path::PathBuf;

use crate::logger::CliLogger;

#[derive(Parser)]
#[command(name = "pdfv", about = "Page through a PDF from the command line", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a document, run a sequence of viewer commands and report the state
    View(ViewArgs),

    /// Print page count and page sizes
    Info {
        /// Input PDF file
        file: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Input PDF file; overrides the source from --config
    file: Option<PathBuf>,

    /// Load viewer options from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective viewer options to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Zoom change per step, in percent
    #[arg(long)]
    zoom_step: Option<u32>,

    /// Lowest allowed zoom, in percent
    #[arg(long)]
    min_zoom: Option<u32>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Jump to this page before running the steps
    #[arg(long)]
    page: Option<u32>,

    /// Commands to run, comma separated
    #[arg(long, value_enum, value_delimiter = ',')]
    steps: Vec<StepArg>,

    /// Wait for each render to finish before the next step
    #[arg(long)]
    settle: bool,

    /// Save the final frame as an image (format from the extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print one JSON snapshot per line instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct EngineArgs {
    /// Rendering engine
    #[arg(long, default_value = "outline", value_enum)]
    engine: EngineArg,

    /// Directory holding the Pdfium library
    #[arg(long)]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    /// Page outlines from the document structure, no content
    Outline,
    /// Full rasterization through Pdfium
    Pdfium,
}

#[derive(Clone, Copy, ValueEnum)]
enum StepArg {
    Next,
    Prev,
    ZoomIn,
    ZoomOut,
    RotateRight,
    RotateLeft,
}

impl StepArg {
    fn name(self) -> &'static str {
        match self {
            StepArg::Next => "next",
            StepArg::Prev => "prev",
            StepArg::ZoomIn => "zoom-in",
            StepArg::ZoomOut => "zoom-out",
            StepArg::RotateRight => "rotate-right",
            StepArg::RotateLeft => "rotate-left",
        }
    }

    fn apply<V: Clone>(self, viewer: &mut ViewerController<V>) -> bool {
        match self {
            StepArg::Next => viewer.next_page(),
            StepArg::Prev => viewer.prev_page(),
            StepArg::ZoomIn => viewer.increase_zoom(),
            StepArg::ZoomOut => viewer.decrease_zoom(),
            StepArg::RotateRight => viewer.rotate_right(),
            StepArg::RotateLeft => viewer.rotate_left(),
        }
    }
}

#[cfg(feature = "pdfium")]
fn pdfium_engine(args: &EngineArgs) -> Result<pdf_viewer::engines::pdfium::PdfiumEngine> {
    use pdf_viewer::engines::pdfium::{PdfiumConfig, PdfiumEngine};

    let config = match &args.pdfium_lib {
        Some(dir) => PdfiumConfig {
            library_dir: Some(dir.clone()),
        },
        None => PdfiumConfig::vendored(),
    };
    PdfiumEngine::init(config).context("Failed to load the Pdfium library")
}

#[cfg(not(feature = "pdfium"))]
fn pdfium_engine(_args: &EngineArgs) -> Result<LopdfEngine> {
    bail!("pdfv was built without Pdfium support; rebuild with --features pdfium")
}

async fn load_options(args: &ViewArgs) -> Result<ViewerOptions> {
    let mut options = match (&args.config, &args.file) {
        (Some(config), _) => ViewerOptions::load(config)
            .await
            .with_context(|| format!("Failed to load {}", config.display()))?,
        (None, Some(file)) => ViewerOptions::new(file.clone()),
        (None, None) => bail!("Provide a PDF file or --config"),
    };

    if let Some(file) = &args.file {
        options.src = file.clone().into();
    }
    if let Some(zoom_step) = args.zoom_step {
        options.zoom_step = zoom_step;
    }
    if let Some(min_zoom) = args.min_zoom {
        options.min_zoom = min_zoom;
    }

    options.validate()?;
    Ok(options)
}

fn report(label: &str, snapshot: &ViewSnapshot, json: bool) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(snapshot)?;
        value["step"] = label.into();
        println!("{}", value);
        return Ok(());
    }

    let mut line = format!(
        "{:<13} page {}/{}  zoom {}%  rotation {}°",
        label,
        snapshot.current_page,
        snapshot.total_pages,
        snapshot.zoom_percent,
        snapshot.rotation_degrees
    );
    if snapshot.loading {
        line.push_str("  (rendering)");
    }
    if !snapshot.last_error.is_empty() {
        line.push_str(&format!("  error: {}", snapshot.last_error));
    }
    println!("{}", line);
    Ok(())
}

async fn view<E: RenderEngine>(engine: E, options: ViewerOptions, args: &ViewArgs) -> Result<()> {
    log::info!("Opening {}", options.src.describe());

    let mut viewer = ViewerController::new(options, engine, PixelSurface::default())?;
    let view = viewer.view();

    viewer.wait_idle().await;
    report("open", &viewer.snapshot(), args.json)?;

    if let Some(page) = args.page {
        if !viewer.go_to_page(page) {
            log::warn!("Cannot go to page {}", page);
        }
        if args.settle {
            viewer.wait_idle().await;
        }
        report("page", &viewer.snapshot(), args.json)?;
    }

    for step in &args.steps {
        if !step.apply(&mut viewer) {
            log::info!("Step {} had no effect", step.name());
        }
        if args.settle {
            viewer.wait_idle().await;
        }
        report(step.name(), &viewer.snapshot(), args.json)?;
    }

    viewer.wait_idle().await;
    let snapshot = viewer.snapshot();
    // With --settle every line above already shows a finished render
    if !args.settle {
        report("final", &snapshot, args.json)?;
    }

    if let Some(output) = &args.output {
        let Some(frame) = view.latest() else {
            bail!("No page was rendered, nothing to write");
        };
        frame
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::info!("Wrote {}x{} frame to {}", frame.width(), frame.height(), output.display());
    }

    viewer.dispose().await;

    if !snapshot.last_error.is_empty() {
        bail!("{}", snapshot.last_error);
    }
    Ok(())
}

async fn info<E: RenderEngine>(engine: E, file: PathBuf, json: bool) -> Result<()> {
    let source = DocumentSource::path(file);
    let document = engine
        .open(&source)
        .await
        .with_context(|| format!("Failed to open {}", source.describe()))?;

    let mut sizes = Vec::new();
    for page_number in 1..=document.page_count() {
        let page = document.get_page(page_number).await?;
        let viewport = page.compute_viewport(1.0, 0);
        sizes.push((viewport.width, viewport.height));
    }
    document.release();

    if json {
        let pages: Vec<_> = sizes
            .iter()
            .map(|(width, height)| serde_json::json!({ "width": width, "height": height }))
            .collect();
        let value = serde_json::json!({
            "source": source.describe(),
            "page_count": sizes.len(),
            "pages": pages,
        });
        println!("{}", value);
        return Ok(());
    }

    println!("{}: {} pages", source.describe(), sizes.len());
    for (index, (width, height)) in sizes.iter().enumerate() {
        println!("  page {:>4}: {} x {} pt", index + 1, width, height);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::View(args) => {
            let options = load_options(&args).await?;
            if let Some(path) = &args.save_config {
                options.save(path).await?;
                log::info!("Saved options to {}", path.display());
            }

            match args.engine.engine {
                EngineArg::Outline => view(LopdfEngine::new(), options, &args).await,
                EngineArg::Pdfium => view(pdfium_engine(&args.engine)?, options, &args).await,
            }
        }

        Commands::Info { file, engine, json } => match engine.engine {
            EngineArg::Outline => info(LopdfEngine::new(), file, json).await,
            EngineArg::Pdfium => info(pdfium_engine(&engine)?, file, json).await,
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::from_verbosity(cli.verbose).init()?;

    // The render worker is spawned with spawn_local
    tokio::task::LocalSet::new().run_until(run(cli)).await
}
