use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 登录已过期（HTTP 401），不重试，直接要求重新登录
    #[error("登录已过期，请重新登录")]
    SessionExpired,

    /// 连接服务器失败
    #[error("无法连接到服务器 ({endpoint}): {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// 服务器拒绝请求，message 为拼接好的用户提示
    #[error("{message}")]
    Rejected { endpoint: String, status: u16, message: String },

    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },

    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// TOML 序列化失败
    #[error("TOML序列化失败: {0}")]
    TomlSerializeFailed(#[from] toml::ser::Error),
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 题目列表为空，拒绝导出
    #[error("没有可导出的题目")]
    NothingToExport,

    /// PDF 编码失败
    #[error("PDF生成失败: {0}")]
    Pdf(String),
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        ExportError::Pdf(err.to_string())
    }
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 既没有选择本地 PDF，也没有选择已上传文件
    #[error("请选择新的 PDF 文件，或从列表中选择已上传的文件")]
    NoFileSelected,

    /// 生成要求为空
    #[error("请输入出题要求")]
    EmptyPrompt,

    /// 题目索引超出范围
    #[error("题目 {index} 不存在 (共 {len} 题)")]
    QuestionIndexOutOfRange { index: usize, len: usize },

    /// 文件列表中找不到该文件
    #[error("文件列表中没有 ID 为 {id} 的文件")]
    UnknownFile { id: i64 },

    /// 没有可用的登录凭证
    #[error("未登录：请先登录后再使用")]
    NotLoggedIn,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// HTTP 客户端构建失败
    #[error("HTTP客户端初始化失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 是否为登录过期
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::Api(ApiError::SessionExpired))
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_detection() {
        let err = AppError::from(ApiError::SessionExpired);
        assert!(err.is_session_expired());

        let err = AppError::from(BusinessError::EmptyPrompt);
        assert!(!err.is_session_expired());
    }

    #[test]
    fn test_rejected_displays_message_only() {
        let err = ApiError::Rejected {
            endpoint: "/upload-pdf".to_string(),
            status: 400,
            message: "Only PDF files are accepted".to_string(),
        };
        assert_eq!(err.to_string(), "Only PDF files are accepted");
    }
}
