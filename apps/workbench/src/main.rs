//! Headless workbench for the Printloom engine.
//!
//! Opens a design session against file-backed boundaries, performs scripted
//! edits (uploads, text), optionally exercises undo/redo, and applies the
//! design, writing `design.json` and `preview.png` to the output directory.
//!
//! Usage examples:
//!   workbench --variant variant.json -i photo.png -t "Hello" --out out/
//!   workbench --template base.png --mask mask.png -t "Gift" --undo-demo

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{info, warn};

use printloom_core::Color;
use printloom_ingest::UploadRequest;
use printloom_io::{FileFetcher, FileStore, VariantRecord};
use printloom_session::{
    EditorSession, LogTelemetry, SessionConfig, TextInput, UploadOutcome, VariantData,
    VariantLoad, AUTOSAVE_INTERVAL,
};
use printloom_render::ContainerSize;

/// Printloom headless design workbench.
///
/// Composes a design on the layered canvas without a browser host: fixed
/// layers from a variant record, user images and text on top, undo/redo,
/// then the apply step.
#[derive(Parser, Debug)]
#[command(name = "workbench", about = "Printloom headless design workbench")]
struct Args {
    /// Variant record JSON file ({"baseImage": ..., "alphaMask": ...}).
    #[arg(long, value_name = "FILE", conflicts_with_all = ["template", "mask"])]
    variant: Option<PathBuf>,

    /// Template image path (alternative to --variant, with --mask).
    #[arg(long, value_name = "IMAGE", requires = "mask")]
    template: Option<PathBuf>,

    /// Clipping mask image path.
    #[arg(long, value_name = "IMAGE", requires = "template")]
    mask: Option<PathBuf>,

    /// Image file(s) to upload onto the canvas.
    #[arg(short, long, value_name = "IMAGE", num_args = 0..)]
    image: Vec<PathBuf>,

    /// Text line(s) to place.
    #[arg(short, long, num_args = 0..)]
    text: Vec<String>,

    /// Font family for text objects.
    #[arg(long, default_value = "DejaVu Sans")]
    font: String,

    /// Font size in pixels.
    #[arg(long, default_value_t = 48.0)]
    font_size: f64,

    /// Text fill color as #rrggbb.
    #[arg(long, default_value = "#222222")]
    color: String,

    /// Product id recorded with auto-saves.
    #[arg(long, default_value = "workbench-product")]
    product: String,

    /// Output directory for design.json and preview.png.
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    /// Exercise one undo/redo cycle before applying.
    #[arg(long, default_value_t = false)]
    undo_demo: bool,

    /// Simulated mount container width in pixels.
    #[arg(long, default_value_t = 1280.0)]
    container_width: f64,

    /// Simulated mount container height in pixels.
    #[arg(long, default_value_t = 800.0)]
    container_height: f64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("workbench: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let (variant_id, record_json) = variant_from_args(&args)?;

    let store = FileStore::new(&args.out);
    let fetcher = FileFetcher::new(std::env::current_dir()?);
    let fill = Color::from_hex(&args.color)
        .ok_or_else(|| format!("invalid color {:?}, expected #rrggbb", args.color))?;

    let mut session = EditorSession::open(
        SessionConfig {
            product_id: args.product.clone(),
            container: Some(ContainerSize::new(
                args.container_width,
                args.container_height,
            )),
        },
        store,
        fetcher,
        Box::new(LogTelemetry),
        Some(VariantData {
            id: variant_id,
            record_json,
        }),
        None,
        Instant::now(),
    )?;

    if session.variant_load() != VariantLoad::Loaded {
        return Err("variant failed to load; check the template and mask paths".into());
    }
    info!(
        "surface {}x{} px, {} fixed layer(s)",
        session.surface().width,
        session.surface().height,
        session.scene().len()
    );

    for path in &args.image {
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path)?;
        let results = session.upload_files(&[UploadRequest::new(&file_name, bytes)], Instant::now());
        match results.into_iter().next().unwrap() {
            Ok(UploadOutcome::Placed(id)) => info!("placed {file_name} as {id}"),
            Ok(UploadOutcome::Duplicate) => warn!("{file_name} is a duplicate; skipped"),
            Ok(UploadOutcome::Stale) => warn!("{file_name} completed stale; skipped"),
            Err(e) => warn!("{file_name} rejected: {e}"),
        }
    }

    for line in &args.text {
        let id = session.add_text(&TextInput {
            content: line.clone(),
            font_family: args.font.clone(),
            font_size: args.font_size,
            fill,
        })?;
        info!("placed text {line:?} as {id}");
    }

    if args.undo_demo {
        println!(
            "history: can_undo={} can_redo={}",
            session.can_undo(),
            session.can_redo()
        );
        if session.undo() {
            println!(
                "after undo: {} user object(s), can_redo={}",
                session.scene().user_count(),
                session.can_redo()
            );
            session.redo();
            println!("after redo: {} user object(s)", session.scene().user_count());
        } else {
            println!("undo blocked (design would become empty)");
        }
    }

    // Let the periodic auto-save fire once before applying.
    session.tick(Instant::now() + AUTOSAVE_INTERVAL);

    println!(
        "applying design with {} user object(s)",
        session.scene().user_count()
    );
    session.apply()?;
    println!(
        "wrote {} and {}",
        args.out.join("design.json").display(),
        args.out.join("preview.png").display()
    );
    Ok(())
}

/// Resolve the variant id and record JSON from the CLI arguments.
fn variant_from_args(args: &Args) -> Result<(String, String), Box<dyn std::error::Error>> {
    if let Some(path) = &args.variant {
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "variant".to_string());
        return Ok((id, std::fs::read_to_string(path)?));
    }
    match (&args.template, &args.mask) {
        (Some(template), Some(mask)) => {
            let record = VariantRecord {
                base_image: template.display().to_string(),
                alpha_mask: mask.display().to_string(),
            };
            Ok(("inline".to_string(), serde_json::to_string(&record)?))
        }
        _ => Err("pass --variant FILE, or --template IMAGE with --mask IMAGE".into()),
    }
}
