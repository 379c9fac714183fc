//! 已上传文件与接口响应结构

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::question::QuestionRecord;

/// 服务端保存的 PDF 文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: i64,
    pub original_filename: String,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl RemoteFile {
    /// 上传时间，格式化为 `dd/mm/yyyy HH:MM:SS`，无法解析时原样返回
    pub fn upload_date_display(&self) -> String {
        let Some(raw) = self.upload_date.as_deref() else {
            return String::new();
        };
        let trimmed = raw.trim_end_matches('Z');
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .map(|dt| dt.format("%d/%m/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| raw.to_string())
    }

    /// 文件大小（KB，两位小数）
    pub fn size_kb_display(&self) -> String {
        let bytes = self.file_size.unwrap_or(0);
        format!("{:.2} KB", bytes as f64 / 1024.0)
    }
}

/// `GET /my-files`
#[derive(Debug, Clone, Deserialize)]
pub struct FilesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

/// `DELETE /delete-file/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /check-duplicate-file`
#[derive(Debug, Clone, Deserialize)]
pub struct DuplicateCheck {
    #[serde(default)]
    pub duplicate: bool,
    #[serde(default)]
    pub file_id: Option<i64>,
}

/// `POST /upload-pdf` 与 `POST /generate-from-file`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 失败响应体：`detail` 可能是字符串，也可能是内容校验的结构化对象
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Rejection(RejectionDetail),
    Raw(Value),
}

/// 内容校验失败的详细信息
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectionDetail {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub topics_found: Vec<String>,
    #[serde(default)]
    pub topics_missing: Vec<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

const UNKNOWN_ERROR: &str = "未知错误";

impl RejectionDetail {
    /// 拼接为一段提示文本
    pub fn to_message(&self) -> String {
        let mut msg = self
            .error
            .clone()
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        msg.push_str("\n\n📝 ");
        msg.push_str(self.reason.as_deref().unwrap_or_default());

        if !self.topics_found.is_empty() {
            msg.push_str("\n\n✅ 文件中包含的主题: ");
            msg.push_str(&self.topics_found.join(", "));
        }
        if !self.topics_missing.is_empty() {
            msg.push_str("\n\n❌ 缺少的主题: ");
            msg.push_str(&self.topics_missing.join(", "));
        }
        if let Some(suggestion) = self.suggestion.as_deref().filter(|s| !s.is_empty()) {
            msg.push_str("\n\n💡 ");
            msg.push_str(suggestion);
        }
        msg
    }
}

impl ErrorBody {
    /// 从失败响应中提取给用户看的错误信息
    pub fn to_message(&self) -> String {
        match &self.detail {
            Some(ErrorDetail::Message(text)) => text.clone(),
            Some(ErrorDetail::Rejection(detail)) => detail.to_message(),
            Some(ErrorDetail::Raw(value)) => value.to_string(),
            None => self
                .error
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        }
    }
}
