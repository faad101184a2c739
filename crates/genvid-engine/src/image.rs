//! Source image loading.
//!
//! The generation provider takes inline images only, so stored uploads
//! are re-encoded as base64 data URIs. References that are already data
//! URIs pass through untouched.

use std::path::Path;

use base64::Engine as _;

use crate::error::EngineResult;

/// Prefix of an already-inline image reference.
const DATA_URI_PREFIX: &str = "data:image";

/// Upload-path prefix stripped before resolving against the upload dir.
const UPLOADS_PREFIX: &str = "/uploads/";

/// Resolve a stored image reference to an inline data URI.
pub async fn load_image_as_data_uri(upload_dir: &str, reference: &str) -> EngineResult<String> {
    if reference.starts_with(DATA_URI_PREFIX) {
        return Ok(reference.to_string());
    }

    let relative = reference.strip_prefix(UPLOADS_PREFIX).unwrap_or(reference);
    let path = Path::new(upload_dir).join(relative);
    let data = tokio::fs::read(&path).await?;

    let mime = mime_for_extension(&path);
    let encoded = base64::engine::general_purpose::STANDARD.encode(&data);
    Ok(format!("data:{mime};base64,{encoded}"))
}

fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn data_uri_passes_through() {
        let uri = "data:image/png;base64,AAAA";
        let result = load_image_as_data_uri("uploads", uri).await.unwrap();
        assert_eq!(result, uri);
    }

    #[tokio::test]
    async fn stored_upload_is_inlined_with_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let result = load_image_as_data_uri(
            dir.path().to_str().unwrap(),
            "/uploads/product.png",
        )
        .await
        .unwrap();

        let expected = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"png-bytes")
        );
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn unknown_extension_defaults_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product.bin");
        std::fs::write(&path, b"bytes").unwrap();

        let result = load_image_as_data_uri(dir.path().to_str().unwrap(), "product.bin")
            .await
            .unwrap();
        assert!(result.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            load_image_as_data_uri(dir.path().to_str().unwrap(), "/uploads/absent.png").await;
        assert!(result.is_err());
    }
}
