use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use rekog::{config, media, report, storage, timeline, uploads, Pipeline};

#[derive(Parser)]
#[command(name = "rekog")]
#[command(version, about = "Face enrollment and identification against a stored gallery")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll the most prominent face of an image under a name
    Enroll {
        image: PathBuf,
        /// Identity name
        #[arg(short, long)]
        name: String,
    },
    /// Identify every face in an image
    Identify {
        image: PathBuf,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List enrolled identities
    List,
    /// Remove an enrolled identity
    Remove { name: String },
    /// Copy an image into the upload area under a fresh unique name
    Upload { file: PathBuf },
    /// Group sighting timestamps (JSON map of name to milliseconds) into intervals
    Timeline {
        file: PathBuf,
        /// Largest gap in milliseconds inside one interval
        #[arg(short, long, default_value_t = 1000.0)]
        gap: f64,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Enroll { image, name } => enroll(&cfg, &image, &name),
        Commands::Identify { image, json } => identify(&cfg, &image, json),
        Commands::List => list(&cfg),
        Commands::Remove { name } => remove(&cfg, &name),
        Commands::Upload { file } => upload(&cfg, &file),
        Commands::Timeline { file, gap } => print_timeline(&file, gap),
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn load_pipeline(cfg: &config::Config) -> Result<Pipeline> {
    Pipeline::load(
        &cfg.detector_model,
        &cfg.embedding_model,
        cfg.detect_params(),
        cfg.crop_params(),
    )
    .context("Failed to initialize face recognition pipeline")
}

fn enroll(cfg: &config::Config, image: &Path, name: &str) -> Result<()> {
    info!("Enrolling {} from {}", name, image.display());

    let img = image::open(image).with_context(|| format!("opening {}", image.display()))?;
    let mut pipeline = load_pipeline(cfg)?;
    let (face, embedding) = pipeline.best_face(&img)?;
    info!("Best face: score {:.3}", face.score);

    let path = storage::save_embedding(&cfg.embeddings_dir, name, &embedding)
        .context("Failed to save embedding")?;
    // The crop is keyed by identity name, already validated by save_embedding.
    match media::save_face(&face.image, &cfg.media_root, name) {
        Ok(p) => info!("Face crop saved to {}", p.display()),
        Err(e) => warn!("Could not save face crop: {:#}", e),
    }

    info!("✓ Enrolled {} ({}-d embedding at {})", name, embedding.dim(), path.display());
    Ok(())
}

fn identify(cfg: &config::Config, image: &Path, json: bool) -> Result<()> {
    let gallery =
        storage::load_gallery(&cfg.embeddings_dir).context("Failed to load gallery")?;
    if gallery.is_empty() {
        warn!("Gallery at {} is empty", cfg.embeddings_dir.display());
    }

    let img = image::open(image).with_context(|| format!("opening {}", image.display()))?;
    let mut pipeline = load_pipeline(cfg)?;
    let faces = pipeline.process_image(&img)?;
    info!("{} face(s) detected", faces.len());

    let reports = report::identify_faces(&faces, &gallery, &cfg.match_params());

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report);
        }
    }

    let failed = reports.iter().filter(|r| r.is_error()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} face(s) could not be matched", failed, reports.len());
    }
    Ok(())
}

fn list(cfg: &config::Config) -> Result<()> {
    let gallery =
        storage::load_gallery(&cfg.embeddings_dir).context("Failed to load gallery")?;
    for entry in &gallery {
        println!("{}\t{}", entry.name, entry.embedding.dim());
    }
    info!("{} identities", gallery.len());
    Ok(())
}

fn remove(cfg: &config::Config, name: &str) -> Result<()> {
    if storage::remove_embedding(&cfg.embeddings_dir, name)? {
        if media::remove_face(&cfg.media_root, name)? {
            info!("Removed face crop of {}", name);
        }
        info!("✓ Removed {}", name);
        Ok(())
    } else {
        anyhow::bail!("No enrolled identity named {}", name)
    }
}

fn upload(cfg: &config::Config, file: &Path) -> Result<()> {
    let original = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid file name {}", file.display()))?;
    if !media::allowed_file(original, &cfg.allowed_extensions) {
        anyhow::bail!(
            "{} is not one of the allowed types {:?}",
            original,
            cfg.allowed_extensions
        );
    }

    let dest = cfg.uploads_dir().join(uploads::unique_file_name(original));
    let body = std::fs::File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let bytes = uploads::store_upload(body, &dest)?;
    info!("Stored {} bytes at {}", bytes, dest.display());
    println!("{}", dest.file_name().and_then(|n| n.to_str()).unwrap_or_default());
    Ok(())
}

fn print_timeline(file: &Path, gap: f64) -> Result<()> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let sightings: BTreeMap<String, Vec<f64>> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
    let result = timeline::appearances(&sightings, gap);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    if !config_path.exists() {
        config::save_config(&config::Config::default(), Some(config_path))?;
    }
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
