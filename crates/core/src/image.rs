//! Image asset types and the upload policy for enhancement requests.
//!
//! Provides the allowed MIME types, file-size bounds, the maximum pixel
//! dimension accepted by the upscaler, and the arithmetic used to shrink
//! oversized images while keeping their aspect ratio.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------

/// Largest accepted file, in bytes (15 MiB).
pub const MAX_FILE_SIZE: u64 = 15 * 1024 * 1024;

/// Smallest accepted file, in bytes (1 KiB).
pub const MIN_FILE_SIZE: u64 = 1024;

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// JPEG quality used when a resized image is re-encoded (0.9 on a 0-1 scale).
pub const RESIZE_QUALITY: u8 = 90;

/// MIME types the upscaler accepts. Compared case-insensitively.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An image file as read from disk or an input device.
///
/// Never mutated in place: resizing produces a new asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageAsset {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Size of the encoded file in bytes.
    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether both sides are at most `max` pixels.
    pub fn fits_within(&self, max: u32) -> bool {
        self.width <= max && self.height <= max
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Whether `mime_type` is in [`ALLOWED_MIME_TYPES`], ignoring case.
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
}

/// Check a file's declared MIME type and size against the upload policy.
///
/// Pure; runs before any decoding or network call. The type is checked
/// first, then the upper size bound, then the lower one.
pub fn validate_image_file(mime_type: &str, byte_size: u64) -> Result<(), CoreError> {
    if !is_allowed_mime_type(mime_type) {
        return Err(CoreError::Validation(format!(
            "Unsupported file format: {mime_type}"
        )));
    }

    if byte_size > MAX_FILE_SIZE {
        let megabytes = byte_size as f64 / 1024.0 / 1024.0;
        return Err(CoreError::Validation(format!(
            "File too large: {megabytes:.1}MB. Maximum: 15MB"
        )));
    }

    if byte_size < MIN_FILE_SIZE {
        return Err(CoreError::Validation(
            "File too small. Please select a valid image file.".to_string(),
        ));
    }

    Ok(())
}

/// Validate that both sides are at most `max` pixels.
pub fn validate_dimensions(dims: Dimensions, max: u32) -> Result<(), CoreError> {
    if dims.fits_within(max) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Image too large: {}x{}. Maximum: {max}x{max}",
            dims.width, dims.height
        )))
    }
}

// ---------------------------------------------------------------------------
// Resize arithmetic
// ---------------------------------------------------------------------------

/// Target size for shrinking `dims` so that both sides fit within `max`.
///
/// Returns `dims` unchanged when already in bound. Otherwise applies one
/// uniform factor, `min(max / width, max / height)`, and floors each side.
/// A side never collapses below one pixel; a `max` of zero is treated as one.
pub fn scaled_dimensions(dims: Dimensions, max: u32) -> Dimensions {
    let max = max.max(1);
    if dims.fits_within(max) {
        return dims;
    }

    let ratio = (max as f64 / dims.width as f64).min(max as f64 / dims.height as f64);
    let width = ((dims.width as f64 * ratio).floor() as u32).clamp(1, max);
    let height = ((dims.height as f64 * ratio).floor() as u32).clamp(1, max);

    Dimensions { width, height }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- validate_image_file --

    #[test]
    fn accepts_every_allowed_type() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(validate_image_file(mime, 2048).is_ok(), "{mime} rejected");
        }
    }

    #[test]
    fn mime_check_ignores_case() {
        assert!(validate_image_file("IMAGE/PNG", 2048).is_ok());
        assert!(validate_image_file("Image/Jpeg", 2048).is_ok());
    }

    #[test]
    fn rejects_unsupported_type() {
        let err = validate_image_file("image/gif", 2048).unwrap_err();
        assert_eq!(err.message(), "Unsupported file format: image/gif");
    }

    #[test]
    fn rejects_oversized_file() {
        let err = validate_image_file("image/jpeg", 20 * 1024 * 1024).unwrap_err();
        assert_eq!(err.message(), "File too large: 20.0MB. Maximum: 15MB");
    }

    #[test]
    fn accepts_exact_size_bounds() {
        assert!(validate_image_file("image/png", MAX_FILE_SIZE).is_ok());
        assert!(validate_image_file("image/png", MIN_FILE_SIZE).is_ok());
    }

    #[test]
    fn rejects_one_byte_past_bounds() {
        assert_matches!(
            validate_image_file("image/png", MAX_FILE_SIZE + 1),
            Err(CoreError::Validation(msg)) if msg.starts_with("File too large")
        );
        assert_matches!(
            validate_image_file("image/png", MIN_FILE_SIZE - 1),
            Err(CoreError::Validation(msg)) if msg.starts_with("File too small")
        );
    }

    #[test]
    fn type_is_checked_before_size() {
        let err = validate_image_file("text/plain", 0).unwrap_err();
        assert!(err.message().starts_with("Unsupported file format"));
    }

    // -- validate_dimensions --

    #[test]
    fn dimensions_at_limit_are_valid() {
        assert!(validate_dimensions(Dimensions::new(4096, 4096), MAX_DIMENSION).is_ok());
    }

    #[test]
    fn dimensions_over_limit_report_size() {
        let err = validate_dimensions(Dimensions::new(5000, 3000), MAX_DIMENSION).unwrap_err();
        assert_eq!(err.message(), "Image too large: 5000x3000. Maximum: 4096x4096");
    }

    // -- scaled_dimensions --

    #[test]
    fn in_bound_dimensions_are_unchanged() {
        let dims = Dimensions::new(1920, 1080);
        assert_eq!(scaled_dimensions(dims, MAX_DIMENSION), dims);
    }

    #[test]
    fn landscape_is_bounded_by_width() {
        let scaled = scaled_dimensions(Dimensions::new(5000, 3000), MAX_DIMENSION);
        assert!(scaled.fits_within(MAX_DIMENSION));
        assert!(scaled.width >= 4095);
        // 3000 * 4096 / 5000 = 2457.6
        assert_eq!(scaled.height, 2457);
    }

    #[test]
    fn portrait_is_bounded_by_height() {
        let scaled = scaled_dimensions(Dimensions::new(2000, 8000), MAX_DIMENSION);
        assert!((1023..=1024).contains(&scaled.width));
        assert!((4095..=4096).contains(&scaled.height));
    }

    #[test]
    fn aspect_ratio_is_preserved_within_a_pixel() {
        for (w, h) in [(5000, 3000), (4097, 4097), (12000, 7), (6001, 4500)] {
            let scaled = scaled_dimensions(Dimensions::new(w, h), MAX_DIMENSION);
            assert!(scaled.fits_within(MAX_DIMENSION));
            let expected_height = scaled.width as f64 * h as f64 / w as f64;
            assert!(
                (scaled.height as f64 - expected_height).abs() <= 1.0,
                "{w}x{h} -> {scaled:?}"
            );
        }
    }

    #[test]
    fn extreme_aspect_keeps_at_least_one_pixel() {
        let scaled = scaled_dimensions(Dimensions::new(100_000, 2), MAX_DIMENSION);
        assert_eq!(scaled.height, 1);
        assert!(scaled.width <= MAX_DIMENSION);
    }

    #[test]
    fn zero_max_collapses_to_one_pixel_instead_of_panicking() {
        let scaled = scaled_dimensions(Dimensions::new(640, 480), 0);
        assert_eq!(scaled, Dimensions::new(1, 1));
    }
}
