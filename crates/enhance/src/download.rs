//! Saving an enhanced image to local disk.

use std::path::Path;

use crate::api::read_success_body;
use crate::error::EnhanceError;

/// Fetch `url` and write the body to `path`, returning the byte count.
///
/// The body is subject to the same transfer cap as every other response;
/// nothing is written when the request fails.
pub async fn download_result(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> Result<u64, EnhanceError> {
    let response = client.get(url).send().await?;
    let bytes = read_success_body(response).await?;
    tokio::fs::write(path, &bytes).await?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "Enhanced image downloaded");
    Ok(bytes.len() as u64)
}
