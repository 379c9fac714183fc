//! 登录凭证存储
//!
//! 登录流程不在本程序内；这里只负责读取已保存的令牌，以及在登录过期时清除它。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, FileError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub user: UserInfo,
}

/// 凭证文件（TOML）
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取凭证；文件不存在时返回 `None`
    pub fn load(&self) -> AppResult<Option<Credentials>> {
        if !self.path.exists() {
            debug!("凭证文件不存在: {}", self.path.display());
            return Ok(None);
        }

        let display = self.path.display().to_string();
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::file_read_failed(display.clone(), e))?;
        let credentials: Credentials =
            toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
                path: display,
                source,
            })?;

        if credentials.access_token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(credentials))
    }

    pub fn save(&self, credentials: &Credentials) -> AppResult<()> {
        let display = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::file_write_failed(display.clone(), e))?;
        }

        let content = toml::to_string(credentials).map_err(FileError::from)?;
        std::fs::write(&self.path, content).map_err(|e| AppError::file_write_failed(display, e))?;
        Ok(())
    }

    /// 清除凭证（文件不存在视为已清除）
    pub fn clear(&self) -> AppResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("🔒 已清除登录凭证: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::file_write_failed(self.path.display().to_string(), e)),
        }
    }
}
