//! Branding asset resolution
//!
//! Logos arrive from config as a local path, an HTTP URL, or an inline
//! `data:` URI. Resolution tries each interpretation in order; total
//! failure means "no logo", never a render error.

use std::path::{Path, PathBuf};

use base64::Engine;

/// Default brand color used when no accent color is configured or the
/// configured value does not parse (dark slate).
pub const DEFAULT_ACCENT: (f32, f32, f32) = (0.17, 0.24, 0.31);

/// Resolves logo bytes and accent colors for document rendering
#[derive(Debug, Clone)]
pub struct AssetResolver {
    assets_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    /// Resolve a logo source to raw image bytes
    ///
    /// Order: absolute local path, path under the assets dir, HTTP(S)
    /// download, inline data URI. First success wins.
    pub async fn resolve_logo(&self, source: &str) -> Option<Vec<u8>> {
        if source.is_empty() {
            return None;
        }

        let path = Path::new(source);
        if path.is_absolute() {
            match tokio::fs::read(path).await {
                Ok(bytes) => return Some(bytes),
                Err(e) => {
                    tracing::debug!(source = %source, error = %e, "Logo not readable as absolute path");
                }
            }
        }

        let local = self.assets_dir.join(source);
        if let Ok(bytes) = tokio::fs::read(&local).await {
            return Some(bytes);
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            match download(source).await {
                Ok(bytes) => return Some(bytes),
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "Logo download failed");
                }
            }
        }

        if let Some(encoded) = source.strip_prefix("data:") {
            // data:image/png;base64,<payload>
            if let Some((_, payload)) = encoded.split_once("base64,") {
                match base64::engine::general_purpose::STANDARD.decode(payload.trim()) {
                    Ok(bytes) => return Some(bytes),
                    Err(e) => {
                        tracing::warn!(error = %e, "Logo data URI is not valid base64");
                    }
                }
            }
        }

        tracing::debug!(source = %source, "Logo source could not be resolved, rendering without logo");
        None
    }
}

async fn download(url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = reqwest::Client::new().get(url).send().await?;
    let response = response.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Parse `#rrggbb` (hash optional) into normalized RGB components
///
/// Malformed input falls back to [`DEFAULT_ACCENT`].
pub fn parse_accent_color(raw: &str) -> (f32, f32, f32) {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return DEFAULT_ACCENT;
    }
    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
    match (parse(0..2), parse(2..4), parse(4..6)) {
        (Ok(r), Ok(g), Ok(b)) => (
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        ),
        _ => DEFAULT_ACCENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_color_parses_with_and_without_hash() {
        assert_eq!(parse_accent_color("#ff0000"), (1.0, 0.0, 0.0));
        assert_eq!(parse_accent_color("00ff00"), (0.0, 1.0, 0.0));
    }

    #[test]
    fn test_accent_color_falls_back_on_garbage() {
        assert_eq!(parse_accent_color("not-a-color"), DEFAULT_ACCENT);
        assert_eq!(parse_accent_color("#fff"), DEFAULT_ACCENT);
        assert_eq!(parse_accent_color(""), DEFAULT_ACCENT);
    }

    #[tokio::test]
    async fn test_resolve_logo_from_assets_dir() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("logo.png"), b"png-bytes")
            .await
            .unwrap();

        let resolver = AssetResolver::new(dir.path());
        let bytes = resolver.resolve_logo("logo.png").await;
        assert_eq!(bytes.as_deref(), Some(b"png-bytes".as_slice()));
    }

    #[tokio::test]
    async fn test_resolve_logo_from_data_uri() {
        let resolver = AssetResolver::new("/nonexistent");
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"inline-logo");
        let uri = format!("data:image/png;base64,{encoded}");

        let bytes = resolver.resolve_logo(&uri).await;
        assert_eq!(bytes.as_deref(), Some(b"inline-logo".as_slice()));
    }

    #[tokio::test]
    async fn test_unresolvable_logo_is_none() {
        let resolver = AssetResolver::new("/nonexistent");
        assert!(resolver.resolve_logo("missing.png").await.is_none());
        assert!(resolver.resolve_logo("").await.is_none());
    }
}
