//! Dimension probing and downscaling of input images.
//!
//! Probing parses only the image header. Full decoding and re-encoding
//! are CPU-bound and run on the blocking pool; their buffers live only
//! inside that closure and are freed on every exit path.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::error::{EncodingError, ImageFormatHint};
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use nexora_core::image::{scaled_dimensions, Dimensions, ImageAsset, RESIZE_QUALITY};

use crate::error::EnhanceError;

/// Message reported when an image cannot be decoded.
pub const UNREADABLE_IMAGE: &str = "Could not read image dimensions";

/// Message reported when a resized image still exceeds the bound.
pub const RESIZE_FAILED: &str = "Failed to resize image to acceptable dimensions";

/// Result of reading an image's pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionProbe {
    Decoded(Dimensions),
    Failed(String),
}

impl DimensionProbe {
    pub fn dimensions(&self) -> Option<Dimensions> {
        match self {
            DimensionProbe::Decoded(dims) => Some(*dims),
            DimensionProbe::Failed(_) => None,
        }
    }
}

/// Map an allowed MIME type to its encoder format.
pub fn image_format_for(mime_type: &str) -> Option<ImageFormat> {
    match mime_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/webp" => Some(ImageFormat::WebP),
        "image/bmp" => Some(ImageFormat::Bmp),
        "image/tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

/// Read the pixel dimensions of `asset` from its header.
///
/// Only the header is parsed, so this runs inline on the borrowed
/// buffer. Decode failures are reported as [`DimensionProbe::Failed`],
/// never as an error; the caller decides what to do next.
pub fn probe_dimensions(asset: &ImageAsset) -> DimensionProbe {
    match read_dimensions(&asset.data) {
        Ok(dims) => DimensionProbe::Decoded(dims),
        Err(e) => {
            tracing::debug!(file_name = %asset.file_name, error = %e, "Image decode failed");
            DimensionProbe::Failed(UNREADABLE_IMAGE.to_string())
        }
    }
}

/// Shrink `asset` so both sides are at most `max_dimension` pixels.
///
/// Probes the asset, then defers to [`shrink_to_fit`].
pub async fn resize_to_fit(
    asset: ImageAsset,
    max_dimension: u32,
) -> Result<ImageAsset, EnhanceError> {
    let original = probe_dimensions(&asset)
        .dimensions()
        .ok_or_else(|| EnhanceError::Dimension(UNREADABLE_IMAGE.to_string()))?;
    shrink_to_fit(asset, original, max_dimension).await
}

/// Shrink `asset`, whose dimensions are already known to be `original`.
///
/// An asset already in bound is returned as-is, without re-encoding.
/// Otherwise the image is scaled by one uniform factor and re-encoded in
/// its original format (JPEG and WebP lossy at [`RESIZE_QUALITY`]). The
/// result is re-probed; one still out of bound is an
/// [`EnhanceError::Dimension`]. A `max_dimension` of zero is rejected.
pub async fn shrink_to_fit(
    asset: ImageAsset,
    original: Dimensions,
    max_dimension: u32,
) -> Result<ImageAsset, EnhanceError> {
    if max_dimension == 0 {
        return Err(EnhanceError::Validation(
            "Maximum dimension must be at least 1 pixel".to_string(),
        ));
    }

    if original.fits_within(max_dimension) {
        return Ok(asset);
    }

    let target = scaled_dimensions(original, max_dimension);
    let format = image_format_for(&asset.mime_type).ok_or_else(|| {
        EnhanceError::Validation(format!("Unsupported file format: {}", asset.mime_type))
    })?;

    let ImageAsset {
        file_name,
        mime_type,
        data,
    } = asset;
    let encoded = tokio::task::spawn_blocking(move || reencode(&data, target, format))
        .await
        .map_err(|e| EnhanceError::Dimension(format!("Resize task aborted: {e}")))?
        .map_err(|e| {
            tracing::error!(error = %e, "Image resize failed");
            EnhanceError::Dimension(RESIZE_FAILED.to_string())
        })?;

    let resized = ImageAsset::new(file_name, mime_type, encoded);

    match probe_dimensions(&resized) {
        DimensionProbe::Decoded(dims) if dims.fits_within(max_dimension) => {
            tracing::info!(
                from_width = original.width,
                from_height = original.height,
                to_width = dims.width,
                to_height = dims.height,
                bytes = resized.byte_size(),
                "Resized image to fit upscaler limits",
            );
            Ok(resized)
        }
        probe => {
            tracing::error!(?probe, max_dimension, "Resized image is still out of bound");
            Err(EnhanceError::Dimension(RESIZE_FAILED.to_string()))
        }
    }
}

// ---- private helpers ----

fn read_dimensions(data: &[u8]) -> image::ImageResult<Dimensions> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(Dimensions::new(width, height))
}

fn reencode(data: &[u8], target: Dimensions, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let decoded = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;
    let resized = decoded.resize_exact(target.width, target.height, FilterType::Triangle);

    if format == ImageFormat::WebP {
        return encode_webp_lossy(&resized);
    }

    let mut out = Cursor::new(Vec::new());
    if format == ImageFormat::Jpeg {
        let encoder = JpegEncoder::new_with_quality(&mut out, RESIZE_QUALITY);
        DynamicImage::ImageRgb8(resized.to_rgb8()).write_with_encoder(encoder)?;
    } else {
        resized.write_to(&mut out, format)?;
    }
    Ok(out.into_inner())
}

fn encode_webp_lossy(img: &DynamicImage) -> image::ImageResult<Vec<u8>> {
    let quality = f32::from(RESIZE_QUALITY);
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
            .encode_simple(false, quality)
    };

    encoded.map(|memory| memory.to_vec()).map_err(|e| {
        ImageError::Encoding(EncodingError::new(
            ImageFormatHint::Exact(ImageFormat::WebP),
            format!("WebP encoding failed: {e:?}"),
        ))
    })
}
