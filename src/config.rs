use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, FileError};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 API 地址
    pub api_base_url: String,
    /// 直接指定的访问令牌（优先于凭证文件）
    pub access_token: Option<String>,
    /// 登录凭证文件
    pub credentials_file: String,
    /// 导出 PDF 的目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            access_token: None,
            credentials_file: ".exam_builder/credentials.toml".to_string(),
            output_dir: ".".to_string(),
            verbose_logging: false,
        }
    }
}

/// 配置文件中出现的字段，缺省的沿用默认值
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base_url: Option<String>,
    access_token: Option<String>,
    credentials_file: Option<String>,
    output_dir: Option<String>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 默认值 + TOML 配置文件 + 环境变量
    pub fn load(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(display.clone(), e))?;
        let file: FileConfig = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: display,
            source,
        })?;

        Ok(Self::default().merge(file).with_env())
    }

    fn merge(self, file: FileConfig) -> Self {
        Self {
            api_base_url: file.api_base_url.unwrap_or(self.api_base_url),
            access_token: file.access_token.or(self.access_token),
            credentials_file: file.credentials_file.unwrap_or(self.credentials_file),
            output_dir: file.output_dir.unwrap_or(self.output_dir),
            verbose_logging: file.verbose_logging.unwrap_or(self.verbose_logging),
        }
    }

    fn with_env(self) -> Self {
        Self {
            api_base_url: std::env::var("EXAM_API_BASE_URL").unwrap_or(self.api_base_url),
            access_token: std::env::var("EXAM_ACCESS_TOKEN").ok().or(self.access_token),
            credentials_file: std::env::var("EXAM_CREDENTIALS_FILE").unwrap_or(self.credentials_file),
            output_dir: std::env::var("EXAM_OUTPUT_DIR").unwrap_or(self.output_dir),
            verbose_logging: std::env::var("EXAM_VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 去掉结尾斜杠的 API 地址
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
