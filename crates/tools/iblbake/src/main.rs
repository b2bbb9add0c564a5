//! iblbake - Bake image-based lighting from a cubemap strip

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ibl::{EdgeFixup, Image, LightingModel, RadianceOptions};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iblbake")]
#[command(about = "Prefilter cubemaps for image-based lighting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diffuse irradiance cubemap via spherical harmonics
    Irradiance {
        /// Input vertical strip (six faces stacked +X, -X, +Y, -Y, +Z, -Z)
        input: PathBuf,

        /// Output strip; format follows the extension
        #[arg(short, long)]
        output: PathBuf,

        /// Output face size
        #[arg(long, default_value = "32")]
        size: u32,
    },

    /// Specular radiance mip chain, one strip per mip
    Radiance {
        /// Input vertical strip (six faces stacked +X, -X, +Y, -Y, +Z, -Z)
        input: PathBuf,

        /// Output path; mips are written as <stem>_mip<N>.<ext>
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print the default radiance options as RON
    Config,
}

/// Overrides on top of the defaults or a config file
#[derive(Args)]
struct FilterArgs {
    /// RON file with radiance options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base mip face size
    #[arg(long)]
    size: Option<u32>,

    /// Number of mips (clamped to what the size allows)
    #[arg(long)]
    mips: Option<u32>,

    /// Lighting model: phong, phong-brdf, blinn, blinn-brdf
    #[arg(long)]
    model: Option<LightingModel>,

    #[arg(long)]
    gloss_scale: Option<f32>,

    #[arg(long)]
    gloss_bias: Option<f32>,

    /// Filter the base mip instead of resampling the source into it
    #[arg(long)]
    exclude_base: bool,

    /// Edge fixup: none, warp
    #[arg(long)]
    fixup: Option<EdgeFixup>,

    /// Worker threads (0 runs on the main thread)
    #[arg(long)]
    threads: Option<u32>,
}

impl FilterArgs {
    fn resolve(self) -> Result<RadianceOptions> {
        let mut options = match &self.config {
            Some(path) => RadianceOptions::from_ron_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RadianceOptions::default(),
        };

        if let Some(size) = self.size {
            options.face_size = size;
        }
        if let Some(mips) = self.mips {
            options.mip_count = mips;
        }
        if let Some(model) = self.model {
            options.lighting_model = model;
        }
        if let Some(scale) = self.gloss_scale {
            options.gloss_scale = scale;
        }
        if let Some(bias) = self.gloss_bias {
            options.gloss_bias = bias;
        }
        if self.exclude_base {
            options.exclude_base = true;
        }
        if let Some(fixup) = self.fixup {
            options.edge_fixup = fixup;
        }
        if let Some(threads) = self.threads {
            options.thread_count = threads;
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Irradiance {
            input,
            output,
            size,
        } => irradiance_command(&input, &output, size)?,
        Commands::Radiance {
            input,
            output,
            filter,
        } => radiance_command(&input, &output, filter.resolve()?)?,
        Commands::Config => {
            let text = ron::ser::to_string_pretty(
                &RadianceOptions::default(),
                ron::ser::PrettyConfig::default(),
            )?;
            println!("{text}");
        }
    }

    Ok(())
}

fn load_source(input: &Path) -> Result<Image> {
    let image =
        Image::load_strip(input).with_context(|| format!("Failed to load {}", input.display()))?;
    println!(
        "Source: {} ({}x{} per face)",
        input.display(),
        image.face_size(),
        image.face_size()
    );
    Ok(image)
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_message(message);
    Ok(progress)
}

fn irradiance_command(input: &Path, output: &Path, size: u32) -> Result<()> {
    let source = load_source(input)?;

    let progress = spinner("Projecting onto spherical harmonics...")?;
    let irradiance = match ibl::compute_irradiance(&source, size) {
        Ok(image) => {
            progress.finish_with_message("✓ Irradiance complete");
            image
        }
        Err(e) => {
            progress.finish_with_message("✗ Irradiance failed");
            return Err(e.into());
        }
    };

    irradiance
        .save_strip(0, output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    println!("Saved: {}", output.display());
    Ok(())
}

/// `<dir>/<stem>_mip<N>.<ext>` for one mip of the chain
fn mip_path(output: &Path, mip: u32) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "radiance".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{stem}_mip{mip}.{}", ext.to_string_lossy()),
        None => format!("{stem}_mip{mip}.exr"),
    };
    output.with_file_name(name)
}

fn radiance_command(input: &Path, output: &Path, options: RadianceOptions) -> Result<()> {
    tracing::debug!(?options, "resolved radiance options");
    let source = load_source(input)?;
    println!(
        "Filter: {} faces, {} mips requested, {} lighting, {} fixup, {} threads",
        options.face_size,
        options.mip_count,
        options.lighting_model,
        options.edge_fixup,
        options.thread_count
    );

    let progress = spinner("Filtering radiance mip chain...")?;
    let radiance = match ibl::compute_radiance(&source, &options) {
        Ok(image) => {
            progress.finish_with_message("✓ Radiance complete");
            image
        }
        Err(e) => {
            progress.finish_with_message("✗ Radiance failed");
            return Err(e.into());
        }
    };

    for mip in 0..radiance.mip_count() {
        let path = mip_path(output, mip);
        radiance
            .save_strip(mip, &path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        let size = radiance.mip_face_size(mip);
        println!("Saved: {} ({size}x{size})", path.display());
    }
    Ok(())
}
