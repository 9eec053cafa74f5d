//! `nexora-enhance` -- enhance one image from the command line.
//!
//! Validates and (if needed) downsizes the image, runs it through the
//! upscaler, stores the result via the Nexora backend, and prints the
//! stored URL.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default | Description                         |
//! |----------------------------|----------|---------|-------------------------------------|
//! | `ENHANCE_API_KEY`          | yes      | --      | Upscaler API key                    |
//! | `ENHANCE_BASE_URL`         | yes      | --      | Upscaler base URL                   |
//! | `BACKEND_URL`              | yes      | --      | Nexora backend base URL             |
//! | `NEXORA_SESSION_TOKEN`     | yes      | --      | Bearer token for the backend        |
//! | `ENHANCE_POLL_INTERVAL_MS` | no       | `2000`  | Delay between status reads          |
//! | `ENHANCE_TIMEOUT_SECS`     | no       | `120`   | Polling budget                      |
//! | `ENHANCE_MAX_DIMENSION`    | no       | `4096`  | Larger images are resized first     |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use image::ImageFormat;
use nexora_core::image::ImageAsset;
use nexora_enhance::config::EnhanceConfig;
use nexora_enhance::download::download_result;
use nexora_enhance::pipeline::Enhancer;
use nexora_enhance::relay::StaticToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "nexora-enhance", version, about = "Enhance an image with the Nexora upscaler")]
struct Args {
    /// Image file to enhance (JPEG, PNG, WebP, BMP or TIFF, at most 15MB).
    image: PathBuf,

    /// Show the result in the public gallery.
    #[arg(long)]
    publish: bool,

    /// Also download the enhanced image to this path.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexora_enhance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = EnhanceConfig::from_env()?;
    let token = std::env::var("NEXORA_SESSION_TOKEN")
        .context("Required environment variable 'NEXORA_SESSION_TOKEN' is not set")?;

    let data = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mime_type = ImageFormat::from_path(&args.image)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");

    tracing::info!(
        file_name = %file_name,
        mime_type,
        bytes = data.len(),
        publish = args.publish,
        base_url = %config.base_url,
        "Starting image enhancement",
    );

    let enhancer = Enhancer::from_config(&config, Arc::new(StaticToken(token)));
    let asset = ImageAsset::new(file_name, mime_type, data);

    let mut last_progress = None;
    let saved = enhancer
        .enhance(asset, args.publish, |progress| {
            if last_progress != Some(progress) {
                tracing::info!(progress, "Enhancing");
                last_progress = Some(progress);
            }
        })
        .await?;

    let stored_url = saved.content.unwrap_or_default();
    if let Some(message) = saved.message.as_deref() {
        tracing::info!(message, "Backend response");
    }
    println!("{stored_url}");

    if let Some(output) = args.output {
        download_result(&reqwest::Client::new(), &stored_url, &output).await?;
    }

    Ok(())
}
