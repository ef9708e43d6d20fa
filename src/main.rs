use clap::{Parser, Subcommand};
use downscale::config::{self, ConfigOverrides, DownscaleConfig};
use downscale::output::{self, CompressOutcome, CompressReport, DimensionsReport};
use downscale::{CompressedOutput, Downscaler, Quality, upload};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "downscale")]
#[command(about = "Shrink images to size-bounded JPEGs before upload")]
#[command(long_about = "\
Shrink images to size-bounded JPEGs before upload

Every input is decoded, scaled so its longer side is at most --max-dimension
pixels (never upscaled), and re-encoded as JPEG at --quality.

  4000x3000 photo, max 1920  →  1920x1440
   800x600 photo,  max 1920  →   800x600 (re-encoded only)

Directories are searched recursively for files with an allowed extension
(png, jpg, jpeg, gif, bmp, webp by default).

Settings are read from downscale.toml in the working directory, or from
--config. Run 'downscale gen-config' for a documented example.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./downscale.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct CompressArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory the JPEG files are written to
    #[arg(short, long, default_value = "compressed")]
    output: PathBuf,

    /// Longest side of the output in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_dimension: Option<u32>,

    /// JPEG quality, 0.0 to 1.0
    #[arg(long, value_parser = parse_quality)]
    quality: Option<f32>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Clone)]
struct DimensionsArgs {
    /// Image files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Downscale and re-encode images as JPEG
    Compress(CompressArgs),
    /// Print the natural size of images without converting them
    Dimensions(DimensionsArgs),
    /// Print a stock downscale.toml with all options documented
    GenConfig,
}

fn parse_quality(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if Quality::new(value).is_in_range() {
        Ok(value)
    } else {
        Err(format!("{value} is not between 0.0 and 1.0"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Compress(args) => {
            let overrides = ConfigOverrides {
                max_dimension: args.max_dimension,
                quality: args.quality,
            };
            let config = load_config(cli.config.as_deref(), &overrides)?;
            compress_command(&config, args).await?;
        }
        Command::Dimensions(args) => {
            let config = load_config(cli.config.as_deref(), &ConfigOverrides::default())?;
            dimensions_command(&config, args).await?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so reports on stdout stay machine-readable.
///
/// `RUST_LOG` wins when set; otherwise `-v` selects info and `-vv` debug.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<DownscaleConfig, config::ConfigError> {
    if let Some(path) = explicit {
        debug!("Loading config from {}", path.display());
    }
    config::load_config(Path::new("."), explicit, overrides)
}

/// Files read, converted, and written per worker before the next chunk starts.
const FILES_PER_WORKER: usize = 4;

async fn compress_command(
    config: &DownscaleConfig,
    args: CompressArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = config.compress.to_options();
    let files = upload::collect_inputs(&args.inputs, config.upload.allowed_extensions.as_slice());
    warn_on_name_collisions(&files, &args.output);
    tokio::fs::create_dir_all(&args.output).await?;

    let threads = config::effective_threads(&config.processing);
    let downscaler = Downscaler::new()
        .with_options(options)
        .with_threads(Some(threads));
    info!(
        "Compressing {} images (max {}px, quality {}, {} workers)",
        files.len(),
        options.max_dimension,
        options.quality.value(),
        threads
    );

    // Only one chunk of sources and outputs is held in memory at a time
    let mut reports = Vec::with_capacity(files.len());
    for chunk in files.chunks(threads * FILES_PER_WORKER) {
        reports.extend(compress_chunk(&downscaler, chunk, &args.output).await);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for line in output::format_compress_output(&reports) {
            println!("{}", line);
        }
    }

    let failures = reports
        .iter()
        .filter(|r| matches!(r.outcome, CompressOutcome::Failed { .. }))
        .count();
    if failures > 0 {
        return Err(format!("{failures} of {} images failed", reports.len()).into());
    }
    Ok(())
}

/// Read, convert, and write one chunk of files. Reports come back in
/// `files` order.
async fn compress_chunk(
    downscaler: &Downscaler,
    files: &[PathBuf],
    output_dir: &Path,
) -> Vec<CompressReport> {
    let mut reports: Vec<Option<CompressReport>> = vec![None; files.len()];

    // Unreadable files fail here and are left out of the batch
    let mut pending = Vec::with_capacity(files.len());
    let mut sources = Vec::with_capacity(files.len());
    for (i, path) in files.iter().enumerate() {
        match downscale::read_source(path).await {
            Ok(source) => {
                pending.push((i, source.len() as u64));
                sources.push(source);
            }
            Err(e) => reports[i] = Some(failed(path, e.to_string())),
        }
    }

    let results = downscaler.compress_batch(sources).await;
    for ((i, original_bytes), result) in pending.into_iter().zip(results) {
        let path = &files[i];
        reports[i] = Some(match result {
            Ok(out) => write_output(path, out, original_bytes, output_dir).await,
            Err(e) => failed(path, e.to_string()),
        });
    }

    reports.into_iter().flatten().collect()
}

async fn write_output(
    source: &Path,
    out: CompressedOutput,
    original_bytes: u64,
    output_dir: &Path,
) -> CompressReport {
    let target = upload::output_path(source, output_dir);
    let original = out.original;
    let compressed = out.dimensions;
    let compressed_bytes = out.len() as u64;

    match tokio::fs::write(&target, out.into_bytes()).await {
        Ok(()) => {
            debug!("Wrote {}", target.display());
            CompressReport {
                source: source.to_path_buf(),
                outcome: CompressOutcome::Compressed {
                    output: target,
                    original,
                    compressed,
                    original_bytes,
                    compressed_bytes,
                },
            }
        }
        Err(e) => failed(source, format!("Failed to write {}: {e}", target.display())),
    }
}

fn failed(path: &Path, error: String) -> CompressReport {
    warn!("{}: {error}", path.display());
    CompressReport {
        source: path.to_path_buf(),
        outcome: CompressOutcome::Failed { error },
    }
}

/// Inputs like `a.png` and `a.webp` map to the same `a.jpg`; the later one wins.
fn warn_on_name_collisions(files: &[PathBuf], output_dir: &Path) {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for file in files {
        let target = upload::output_path(file, output_dir);
        if let Some(previous) = seen.insert(target.clone(), file.as_path()) {
            warn!(
                "{} and {} both write {}",
                previous.display(),
                file.display(),
                target.display()
            );
        }
    }
}

async fn dimensions_command(
    config: &DownscaleConfig,
    args: DimensionsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = upload::collect_inputs(&args.inputs, config.upload.allowed_extensions.as_slice());
    let downscaler = Downscaler::new();

    let mut reports = Vec::with_capacity(files.len());
    for path in &files {
        let report = match downscale::read_source(path).await {
            Ok(source) => match downscaler.get_dimensions(&source).await {
                Ok(dims) => DimensionsReport {
                    source: path.clone(),
                    dimensions: Some(dims),
                    mime_type: source.mime_type(),
                    error: None,
                },
                Err(e) => DimensionsReport {
                    source: path.clone(),
                    dimensions: None,
                    mime_type: source.mime_type(),
                    error: Some(e.to_string()),
                },
            },
            Err(e) => DimensionsReport {
                source: path.clone(),
                dimensions: None,
                mime_type: None,
                error: Some(e.to_string()),
            },
        };
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for line in output::format_dimensions_output(&reports) {
            println!("{}", line);
        }
    }

    let failures = reports.iter().filter(|r| r.error.is_some()).count();
    if failures > 0 {
        return Err(format!("{failures} of {} images failed", reports.len()).into());
    }
    Ok(())
}
