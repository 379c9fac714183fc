/// 出题后端 API 客户端
///
/// 封装所有与后端 HTTP 接口相关的调用逻辑，所有请求都带 Bearer 令牌。
/// 任何接口返回 401 都视为登录过期；不做重试。
use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ConfigError, FileError};
use crate::models::{
    DeleteResponse, DuplicateCheck, ErrorBody, FilesResponse, GenerateResponse, QuestionRecord,
    RemoteFile,
};

/// 后端能力
///
/// 会话控制器只依赖这个 trait，测试时可以换成内存实现。
#[allow(async_fn_in_trait)]
pub trait QuestionApi {
    /// 当前用户上传过的文件
    async fn list_files(&self) -> AppResult<Vec<RemoteFile>>;

    /// 删除文件，返回服务端提示信息
    async fn delete_file(&self, file_id: i64) -> AppResult<String>;

    /// 按文件名检查是否已上传过
    async fn check_duplicate(&self, filename: &str) -> AppResult<DuplicateCheck>;

    /// 上传新 PDF 并生成题目
    async fn upload_pdf(&self, pdf_path: &Path, prompt: &str) -> AppResult<Vec<QuestionRecord>>;

    /// 用已上传的文件生成题目
    async fn generate_from_file(&self, file_id: i64, prompt: &str) -> AppResult<Vec<QuestionRecord>>;
}

/// HTTP 客户端
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config, token: impl Into<String>) -> AppResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.api_base().to_string(),
            token: token.into(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 发送请求，返回状态码和响应体
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<(u16, String)> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| network_error(endpoint, source))?;

        let status = response.status().as_u16();
        debug!("📡 {} -> HTTP {}", endpoint, status);

        let body = response
            .text()
            .await
            .map_err(|source| network_error(endpoint, source))?;

        Ok((status, body))
    }
}

fn network_error(endpoint: &str, source: reqwest::Error) -> AppError {
    warn!("❌ 连接服务器失败 ({}): {}", endpoint, source);
    ApiError::Network {
        endpoint: endpoint.to_string(),
        source,
    }
    .into()
}

/// 把失败响应体整理成用户提示
fn rejected(endpoint: &str, status: u16, body: &str) -> ApiError {
    let error_body: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    ApiError::Rejected {
        endpoint: endpoint.to_string(),
        status,
        message: error_body.to_message(),
    }
}

/// 解析响应
///
/// - 401 → 登录过期
/// - 非 2xx → 按 `detail` / `error` 拼出错误信息
/// - 2xx 但 JSON 不符合预期 → 解析错误
pub fn parse_response<T: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    body: &str,
) -> Result<T, ApiError> {
    if status == 401 {
        return Err(ApiError::SessionExpired);
    }
    if !(200..300).contains(&status) {
        return Err(rejected(endpoint, status, body));
    }
    serde_json::from_str(body).map_err(|source| ApiError::JsonParseFailed {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// 解析带 `success` 字段的生成结果
fn parse_generated(endpoint: &str, status: u16, body: &str) -> Result<Vec<QuestionRecord>, ApiError> {
    let response: GenerateResponse = parse_response(endpoint, status, body)?;
    if !response.success {
        return Err(rejected(endpoint, status, body));
    }
    Ok(response.questions)
}

impl QuestionApi for ApiClient {
    async fn list_files(&self) -> AppResult<Vec<RemoteFile>> {
        let endpoint = "/my-files";
        debug!("🔄 正在加载文件列表...");

        let (status, body) = self.send(endpoint, self.http.get(self.url(endpoint))).await?;
        let response: FilesResponse = parse_response(endpoint, status, &body)?;
        if !response.success {
            return Err(rejected(endpoint, status, &body).into());
        }

        debug!("✅ 加载成功: {} 个文件", response.files.len());
        Ok(response.files)
    }

    async fn delete_file(&self, file_id: i64) -> AppResult<String> {
        let endpoint = format!("/delete-file/{}", file_id);
        debug!("🗑️ 正在删除文件 ID: {}", file_id);

        let (status, body) = self.send(&endpoint, self.http.delete(self.url(&endpoint))).await?;
        let response: DeleteResponse = parse_response(&endpoint, status, &body)?;
        if !response.success {
            return Err(rejected(&endpoint, status, &body).into());
        }

        Ok(response.message.unwrap_or_default())
    }

    async fn check_duplicate(&self, filename: &str) -> AppResult<DuplicateCheck> {
        let endpoint = "/check-duplicate-file";
        let request = self
            .http
            .get(self.url(endpoint))
            .query(&[("filename", filename)]);

        let (status, body) = self.send(endpoint, request).await?;
        Ok(parse_response(endpoint, status, &body)?)
    }

    async fn upload_pdf(&self, pdf_path: &Path, prompt: &str) -> AppResult<Vec<QuestionRecord>> {
        let endpoint = "/upload-pdf";
        let display = pdf_path.display().to_string();
        if !pdf_path.exists() {
            return Err(FileError::NotFound { path: display }.into());
        }

        let bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| AppError::file_read_failed(display.clone(), e))?;
        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(display);

        info!("📤 上传文件: {} ({} 字节)", file_name, bytes.len());

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("prompt", prompt.to_string());

        let request = self.http.post(self.url(endpoint)).multipart(form);
        let (status, body) = self.send(endpoint, request).await?;
        Ok(parse_generated(endpoint, status, &body)?)
    }

    async fn generate_from_file(&self, file_id: i64, prompt: &str) -> AppResult<Vec<QuestionRecord>> {
        let endpoint = "/generate-from-file";
        info!("🧠 使用已上传文件 ID {} 生成题目", file_id);

        let request = self.http.post(self.url(endpoint)).json(&json!({
            "file_id": file_id,
            "prompt": prompt
        }));
        let (status, body) = self.send(endpoint, request).await?;
        Ok(parse_generated(endpoint, status, &body)?)
    }
}
