//! Uploaded images land in the assets directory under a timestamped name and
//! are served back at the `/assets` prefix.

use std::path::Path;

use chrono::Utc;
use tokio::fs;

use crate::error::AppError;

/// Writes an uploaded file and returns the stored filename.
pub async fn save_upload(
    assets_dir: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    let filename = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_filename(original_name)
    );

    fs::create_dir_all(assets_dir)
        .await
        .map_err(AppError::internal)?;
    fs::write(Path::new(assets_dir).join(&filename), bytes)
        .await
        .map_err(AppError::internal)?;

    Ok(filename)
}

/// Keeps the final path component and flattens anything that is not a plain
/// filename character.
fn sanitize_filename(original: &str) -> String {
    let base = Path::new(original)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("me.png"), "me.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
