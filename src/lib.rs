//! # Exam Builder
//!
//! 从 PDF 资料生成单选题、在终端里审阅编辑、导出为带答案表的 PDF。
//!
//! ## 架构设计
//!
//! ### ① 接入层（Clients）
//! - `clients/` - 后端 HTTP 接口，`QuestionApi` 描述后端能力
//! - `ApiClient` - 基于 reqwest 的实现，统一处理 401 / 网络错误 / 拒绝信息
//!
//! ### ② 业务能力层（Services）
//! - `normalizer` - 任意题目记录 → 题干 + 4 个选项
//! - `answer_key` - 自由文本答案 → A/B/C/D/?
//! - `editor` - 应用编辑表单
//! - `store` - 会话内的题目列表
//! - `credentials` - 登录凭证文件
//!
//! ### ③ 导出层（Export）
//! - `composer` - 分页排版，生成绘制指令和答案表
//! - `pdf_writer` - 用 lopdf 编码并写入 `questions.pdf`
//!
//! ### ④ 流程层（Workflow）
//! - `SessionController` - 文件选择 → 出题 → 编辑 → 导出
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ApiClient, QuestionApi};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use export::{compose, export_pdf, ComposedDocument};
pub use models::{QuestionRecord, QuestionType, RemoteFile};
pub use services::{apply_edit, derive_letter, normalize, AnswerLetter, EditFields};
pub use workflow::SessionController;
