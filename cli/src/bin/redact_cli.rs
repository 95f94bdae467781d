use clap::{Parser, Subcommand};
use cli::RedactJob;
use color_eyre::eyre::{Result, WrapErr};
use redact::{
    AsyncRegionPipeline, MergeOptions, PipelineSettings, RedactCommand, RedactManager,
    RegionPipeline, Sensitivity,
};
use redact_common::utils::{ensure_output_dir, format_file_size};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest text regions in a screenshot
    Detect {
        /// Path to the screenshot
        #[arg(short, long)]
        input: PathBuf,
        /// low, med or high
        #[arg(short, long, default_value = "med")]
        sensitivity: Sensitivity,
        /// Longest edge the image is reduced to before detection
        #[arg(long, default_value = "1280")]
        target_long_edge: u32,
        /// Padding around each region in pixels
        #[arg(long, default_value = "4.0")]
        padding: f64,
        /// IoU at which regions merge
        #[arg(long, default_value = "0.1")]
        iou: f64,
        /// Gap in pixels under which regions merge
        #[arg(long, default_value = "8.0")]
        distance: f64,
        /// Write detection candidates as JSON here instead of stdout
        #[arg(long)]
        json: Option<PathBuf>,
        /// Also write the regions as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Redact a screenshot using a job file
    Redact {
        /// Path to the TOML or JSON job file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the JSON schema of job files
    Schema {
        /// Print the manager command schema instead
        #[arg(long)]
        commands: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Detect {
            input,
            sensitivity,
            target_long_edge,
            padding,
            iou,
            distance,
            json,
            geojson,
        } => {
            let settings = PipelineSettings {
                detect: redact::DetectOptions {
                    target_long_edge: *target_long_edge,
                    sensitivity: *sensitivity,
                },
                padding_px: *padding,
                merge: MergeOptions::new(*iou, *distance),
                clip_to_image: true,
            };
            detect(input, settings, json.as_deref(), geojson.as_deref()).await?;
        }
        Commands::Redact { config } => {
            redact_job(config)?;
        }
        Commands::Schema { commands } => {
            let schema = if *commands {
                serde_json::to_string_pretty(&RedactCommand::schema())?
            } else {
                serde_json::to_string_pretty(&RedactJob::schema())?
            };
            println!("{schema}");
        }
    }

    Ok(())
}

async fn detect(
    input: &Path,
    settings: PipelineSettings,
    json_output: Option<&Path>,
    geojson_output: Option<&Path>,
) -> Result<()> {
    let image = image::open(input)
        .wrap_err_with(|| format!("failed to open {}", input.display()))?
        .to_rgba8();
    info!("Detecting regions in {:?} ({}x{})", input, image.width(), image.height());

    let pipeline = AsyncRegionPipeline::edge(settings);
    let result = pipeline.process(&image).await?;
    pipeline.dispose();

    if let Some(advisory) = &result.advisory {
        warn!("{advisory}");
    }
    info!("Found {} regions", result.regions.len());

    let candidates = serde_json::to_string_pretty(&result.candidates())?;
    match json_output {
        Some(path) => {
            ensure_output_dir(path)?;
            std::fs::write(path, candidates)?;
            info!("Candidates saved to: {:?}", path);
        }
        None => println!("{candidates}"),
    }

    if let Some(path) = geojson_output {
        ensure_output_dir(path)?;
        result.save_geojson(path)?;
        info!("GeoJSON saved to: {:?}", path);
    }

    Ok(())
}

fn redact_job(config_path: &Path) -> Result<()> {
    let job = RedactJob::from_file(config_path)?;
    job.validate()?;
    info!("Redact job: {} -> {}", job.input_path, job.output_path);

    let pipeline = RegionPipeline::builder().with_settings(job.pipeline).build();
    info!("{}", pipeline.info());

    let mut manager = RedactManager::with_pipeline(pipeline).with_params(job.params);
    manager.load_image(&job.input_path)?;

    if job.auto_detect {
        let detected = manager.execute(RedactCommand::Detect { sensitivity: None })?;
        if let Some(advisory) = &detected.advisory {
            warn!("{advisory}");
        }
        info!("Detected {} regions", detected.regions.len());
    }

    for rect in &job.regions {
        manager.execute(RedactCommand::AddRegion {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        })?;
    }

    let merge = job.pipeline.merge;
    let regions = manager.execute(RedactCommand::Merge {
        iou_thresh: merge.iou_thresh,
        distance_px: merge.distance_px,
    })?;
    if regions.is_empty() {
        warn!("No regions to redact; exporting the image unchanged");
    }

    manager.execute(RedactCommand::Apply { tool: job.tool })?;

    let output = Path::new(&job.output_path);
    ensure_output_dir(output)?;
    manager.save(output, &job.export_options())?;

    if let Some(path) = &job.geojson_path {
        let path = Path::new(path);
        ensure_output_dir(path)?;
        regions.save_geojson(path)?;
    }

    let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    info!(
        "✅ Redacted {} regions with {} -> {} ({})",
        regions.regions.len(),
        job.tool,
        job.output_path,
        format_file_size(size)
    );
    Ok(())
}
