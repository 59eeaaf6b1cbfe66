//! Local disk storage for uploaded book covers

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;

use crate::{config::StorageConfig, error::AppResult};

#[derive(Clone)]
pub struct FileStorageService {
    upload_root: PathBuf,
}

impl FileStorageService {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            upload_root: PathBuf::from(config.upload_root),
        }
    }

    /// Store `content` under `<root>/users/<user_id>/<unix_millis>.<ext>` and return the path
    pub async fn save_file(
        &self,
        content: &[u8],
        original_filename: Option<&str>,
        user_id: i32,
    ) -> AppResult<String> {
        let target_folder = self.upload_root.join("users").join(user_id.to_string());
        tokio::fs::create_dir_all(&target_folder).await.map_err(|e| {
            tracing::warn!("Failed to create folder {}: {}", target_folder.display(), e);
            e
        })?;

        let extension = file_extension(original_filename);
        let file_name = if extension.is_empty() {
            Utc::now().timestamp_millis().to_string()
        } else {
            format!("{}.{}", Utc::now().timestamp_millis(), extension)
        };
        let target_path = target_folder.join(file_name);

        tokio::fs::write(&target_path, content).await.map_err(|e| {
            tracing::error!("File was not saved to {}: {}", target_path.display(), e);
            e
        })?;

        tracing::info!("File saved to {}", target_path.display());
        Ok(target_path.to_string_lossy().into_owned())
    }

    /// Read a stored file as base64; unreadable files are logged and reported as absent
    pub async fn read_file_base64(&self, path: Option<&str>) -> Option<String> {
        let path = path.filter(|p| !p.is_empty())?;
        match tokio::fs::read(Path::new(path)).await {
            Ok(bytes) => Some(STANDARD.encode(bytes)),
            Err(e) => {
                tracing::warn!("No file found in path {}: {}", path, e);
                None
            }
        }
    }
}

/// Lowercased extension after the last dot, empty when there is none
pub fn file_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}
