//! 会话控制器 - 流程层
//!
//! 核心职责：持有一次会话的全部状态，并编排文件选择、出题、编辑、导出。
//!
//! 状态：
//! - 题目列表（`QuestionStore`）
//! - 已上传文件列表、当前选中的已上传文件
//! - 本地选中的新 PDF、文件提示文字
//!
//! 所有操作都是 `&mut self`，同一时间只会有一个请求在进行。

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::clients::QuestionApi;
use crate::error::{AppResult, BusinessError};
use crate::export::{compose, export_pdf};
use crate::models::{QuestionRecord, RemoteFile};
use crate::services::{CredentialStore, EditFields, NormalizedQuestion, QuestionStore};
use crate::utils::logging::truncate_text;

/// 本次出题用的是哪个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateSource {
    /// 上传了新的 PDF
    Uploaded { file_name: String },
    /// 新 PDF 与已上传文件重名，改用已有文件
    ReusedDuplicate { file_name: String, file_id: i64 },
    /// 直接使用列表中选中的文件
    Existing { file_id: i64 },
}

/// 出题结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOutcome {
    pub source: GenerateSource,
    pub question_count: usize,
}

/// 会话控制器
pub struct SessionController<A: QuestionApi> {
    api: A,
    credentials: Option<CredentialStore>,
    store: QuestionStore,
    files: Vec<RemoteFile>,
    selected_file: Option<i64>,
    picked_file: Option<PathBuf>,
    file_label: String,
}

impl<A: QuestionApi> SessionController<A> {
    /// 创建控制器；`credentials` 用于登录过期时清除凭证
    pub fn new(api: A, credentials: Option<CredentialStore>) -> Self {
        Self {
            api,
            credentials,
            store: QuestionStore::new(),
            files: Vec::new(),
            selected_file: None,
            picked_file: None,
            file_label: String::new(),
        }
    }

    pub fn files(&self) -> &[RemoteFile] {
        &self.files
    }

    pub fn selected_file(&self) -> Option<i64> {
        self.selected_file
    }

    pub fn picked_file(&self) -> Option<&Path> {
        self.picked_file.as_deref()
    }

    /// 文件提示文字（空字符串表示没有提示）
    pub fn file_label(&self) -> &str {
        &self.file_label
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        self.store.as_slice()
    }

    /// 第 index 题（从 0 开始）
    pub fn question(&self, index: usize) -> AppResult<&QuestionRecord> {
        self.store.get(index)
    }

    /// 登录过期时清除凭证，错误原样返回
    fn guard<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(err) = &result {
            if err.is_session_expired() {
                warn!("⏰ 登录已过期");
                if let Some(store) = &self.credentials {
                    if let Err(e) = store.clear() {
                        warn!("⚠️ 清除登录凭证失败: {}", e);
                    }
                }
            }
        }
        result
    }

    /// 重新加载已上传文件列表
    pub async fn refresh_files(&mut self) -> AppResult<&[RemoteFile]> {
        let result = self.api.list_files().await;
        self.files = self.guard(result)?;
        Ok(&self.files)
    }

    /// 选中列表中的已上传文件，同时放弃本地选中的新 PDF
    pub fn select_file(&mut self, file_id: i64) -> AppResult<&RemoteFile> {
        let file = self
            .files
            .iter()
            .find(|f| f.id == file_id)
            .ok_or(BusinessError::UnknownFile { id: file_id })?;

        self.selected_file = Some(file_id);
        self.picked_file = None;
        self.file_label = format!("Will use file: {}", file.original_filename);
        info!("📌 已选择文件: {} (ID: {})", file.original_filename, file_id);
        Ok(file)
    }

    /// 选中本地新 PDF，同时取消列表中的选择
    pub fn pick_local_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.file_label = display_name(&path);
        self.selected_file = None;
        self.picked_file = Some(path);
    }

    /// 删除已上传文件，返回服务端提示
    ///
    /// 删除的是当前选中文件时，一并清除选择和提示文字。
    pub async fn delete_file(&mut self, file_id: i64) -> AppResult<String> {
        let result = self.api.delete_file(file_id).await;
        let message = self.guard(result)?;

        if self.selected_file == Some(file_id) {
            self.selected_file = None;
            self.file_label.clear();
        }
        self.files.retain(|f| f.id != file_id);
        info!("🗑️ 已删除文件 ID: {}", file_id);

        self.refresh_quietly().await?;
        Ok(message)
    }

    /// 服务端已完成修改后刷新列表：登录过期照常返回，其他失败只记录
    async fn refresh_quietly(&mut self) -> AppResult<()> {
        if let Err(e) = self.refresh_files().await {
            if e.is_session_expired() {
                return Err(e);
            }
            warn!("⚠️ 刷新文件列表失败: {}", e);
        }
        Ok(())
    }

    /// 出题
    ///
    /// 本地新 PDF 优先：先按文件名查重，重名则改用已有文件（并选中它），
    /// 否则上传后刷新文件列表。只有成功时才替换题目列表。
    pub async fn generate(&mut self, prompt: &str) -> AppResult<GenerateOutcome> {
        let prompt = prompt.trim();
        if self.picked_file.is_none() && self.selected_file.is_none() {
            return Err(BusinessError::NoFileSelected.into());
        }
        if prompt.is_empty() {
            return Err(BusinessError::EmptyPrompt.into());
        }

        info!("🧠 开始生成题目，要求: {}", truncate_text(prompt, 40));

        let (questions, source) = match (self.picked_file.clone(), self.selected_file) {
            (Some(path), _) => {
                let file_name = display_name(&path);
                let result = self.api.check_duplicate(&file_name).await;
                let check = self.guard(result)?;

                match check.file_id.filter(|_| check.duplicate) {
                    Some(file_id) => {
                        warn!("⚠️ 文件 \"{}\" 已存在，改用已上传的文件", file_name);
                        self.selected_file = Some(file_id);
                        let result = self.api.generate_from_file(file_id, prompt).await;
                        let questions = self.guard(result)?;
                        (questions, GenerateSource::ReusedDuplicate { file_name, file_id })
                    }
                    None => {
                        let result = self.api.upload_pdf(&path, prompt).await;
                        let questions = self.guard(result)?;
                        self.refresh_quietly().await?;
                        (questions, GenerateSource::Uploaded { file_name })
                    }
                }
            }
            (None, Some(file_id)) => {
                let result = self.api.generate_from_file(file_id, prompt).await;
                let questions = self.guard(result)?;
                (questions, GenerateSource::Existing { file_id })
            }
            (None, None) => return Err(BusinessError::NoFileSelected.into()),
        };

        let question_count = questions.len();
        self.store.replace_all(questions);
        info!("✅ 已生成 {} 道题目", question_count);

        Ok(GenerateOutcome {
            source,
            question_count,
        })
    }

    /// 编辑第 index 题（从 0 开始）
    pub fn edit_question(&mut self, index: usize, fields: EditFields) -> AppResult<&QuestionRecord> {
        self.store.edit(index, fields)
    }

    /// 删除第 index 题（从 0 开始）
    pub fn delete_question(&mut self, index: usize) -> AppResult<QuestionRecord> {
        self.store.remove(index)
    }

    /// 所有题目的展示形态
    pub fn rendered_questions(&self) -> Vec<NormalizedQuestion> {
        self.store.normalized()
    }

    /// 导出到 `<dir>/questions.pdf`
    pub async fn export(&self, dir: &Path) -> AppResult<PathBuf> {
        let document = compose(self.store.as_slice())?;
        export_pdf(&document, dir).await
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AppError, ExportError};
    use crate::models::DuplicateCheck;
    use crate::services::{Credentials, UserInfo};
    use std::cell::RefCell;

    /// 内存中的假后端，记录调用顺序
    #[derive(Default)]
    struct FakeApi {
        files: RefCell<Vec<RemoteFile>>,
        duplicate_of: Option<i64>,
        expired: bool,
        listing_broken: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeApi {
        fn with_files(names: &[(i64, &str)]) -> Self {
            let files = names
                .iter()
                .map(|(id, name)| RemoteFile {
                    id: *id,
                    original_filename: name.to_string(),
                    upload_date: None,
                    file_size: Some(2048),
                })
                .collect();
            Self {
                files: RefCell::new(files),
                ..Self::default()
            }
        }

        fn record(&self, call: String) -> AppResult<()> {
            self.calls.borrow_mut().push(call);
            if self.expired {
                return Err(ApiError::SessionExpired.into());
            }
            Ok(())
        }

        fn sample_questions() -> Vec<QuestionRecord> {
            vec![
                QuestionRecord::mcq("Q1", vec!["A. x".into(), "B. y".into()], "A"),
                QuestionRecord::mcq("Q2", vec![], "The answer is C"),
            ]
        }
    }

    impl QuestionApi for FakeApi {
        async fn list_files(&self) -> AppResult<Vec<RemoteFile>> {
            self.record("list".into())?;
            if self.listing_broken {
                return Err(ApiError::Rejected {
                    endpoint: "/my-files".into(),
                    status: 500,
                    message: "boom".into(),
                }
                .into());
            }
            Ok(self.files.borrow().clone())
        }

        async fn delete_file(&self, file_id: i64) -> AppResult<String> {
            self.record(format!("delete {}", file_id))?;
            self.files.borrow_mut().retain(|f| f.id != file_id);
            Ok("File deleted".into())
        }

        async fn check_duplicate(&self, filename: &str) -> AppResult<DuplicateCheck> {
            self.record(format!("check {}", filename))?;
            Ok(DuplicateCheck {
                duplicate: self.duplicate_of.is_some(),
                file_id: self.duplicate_of,
            })
        }

        async fn upload_pdf(&self, pdf_path: &Path, _prompt: &str) -> AppResult<Vec<QuestionRecord>> {
            self.record(format!("upload {}", display_name(pdf_path)))?;
            Ok(Self::sample_questions())
        }

        async fn generate_from_file(&self, file_id: i64, _prompt: &str) -> AppResult<Vec<QuestionRecord>> {
            self.record(format!("generate {}", file_id))?;
            Ok(Self::sample_questions())
        }
    }

    fn calls(controller: &SessionController<FakeApi>) -> Vec<String> {
        controller.api.calls.borrow().clone()
    }

    #[tokio::test]
    async fn test_deleting_selected_file_clears_selection_and_label() {
        let mut controller = SessionController::new(FakeApi::with_files(&[(1, "a.pdf"), (2, "b.pdf")]), None);
        controller.refresh_files().await.unwrap();
        controller.select_file(2).unwrap();
        assert_eq!(controller.file_label(), "Will use file: b.pdf");

        controller.delete_file(2).await.unwrap();

        assert_eq!(controller.selected_file(), None);
        assert_eq!(controller.file_label(), "");
        assert_eq!(controller.files().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_other_file_keeps_selection() {
        let mut controller = SessionController::new(FakeApi::with_files(&[(1, "a.pdf"), (2, "b.pdf")]), None);
        controller.refresh_files().await.unwrap();
        controller.select_file(2).unwrap();

        controller.delete_file(1).await.unwrap();

        assert_eq!(controller.selected_file(), Some(2));
        assert_eq!(controller.file_label(), "Will use file: b.pdf");
    }

    #[tokio::test]
    async fn test_select_and_pick_are_exclusive() {
        let mut controller = SessionController::new(FakeApi::with_files(&[(5, "bio.pdf")]), None);
        controller.refresh_files().await.unwrap();

        controller.pick_local_file("/tmp/chem.pdf");
        assert_eq!(controller.file_label(), "chem.pdf");

        controller.select_file(5).unwrap();
        assert_eq!(controller.picked_file(), None);

        controller.pick_local_file("/tmp/chem.pdf");
        assert_eq!(controller.selected_file(), None);

        let err = controller.select_file(99).unwrap_err();
        assert!(matches!(err, AppError::Business(BusinessError::UnknownFile { id: 99 })));
    }

    #[tokio::test]
    async fn test_generate_requires_file_and_prompt() {
        let mut controller = SessionController::new(FakeApi::default(), None);
        let err = controller.generate("ten questions").await.unwrap_err();
        assert!(matches!(err, AppError::Business(BusinessError::NoFileSelected)));

        controller.pick_local_file("/tmp/a.pdf");
        let err = controller.generate("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Business(BusinessError::EmptyPrompt)));

        assert!(calls(&controller).is_empty());
    }

    #[tokio::test]
    async fn test_generate_uploads_new_file_then_refreshes() {
        let mut controller = SessionController::new(FakeApi::default(), None);
        controller.pick_local_file("/tmp/new.pdf");

        let outcome = controller.generate("10 questions").await.unwrap();

        assert_eq!(
            outcome.source,
            GenerateSource::Uploaded {
                file_name: "new.pdf".into()
            }
        );
        assert_eq!(outcome.question_count, 2);
        assert_eq!(controller.questions().len(), 2);
        assert_eq!(
            calls(&controller),
            vec!["check new.pdf", "upload new.pdf", "list"]
        );
    }

    #[tokio::test]
    async fn test_generate_reuses_duplicate_file() {
        let api = FakeApi {
            duplicate_of: Some(7),
            ..FakeApi::default()
        };
        let mut controller = SessionController::new(api, None);
        controller.pick_local_file("/tmp/old.pdf");

        let outcome = controller.generate("5 questions").await.unwrap();

        assert_eq!(
            outcome.source,
            GenerateSource::ReusedDuplicate {
                file_name: "old.pdf".into(),
                file_id: 7
            }
        );
        assert_eq!(controller.selected_file(), Some(7));
        assert_eq!(calls(&controller), vec!["check old.pdf", "generate 7"]);
    }

    #[tokio::test]
    async fn test_generate_from_selected_file() {
        let mut controller = SessionController::new(FakeApi::with_files(&[(3, "hist.pdf")]), None);
        controller.refresh_files().await.unwrap();
        controller.select_file(3).unwrap();

        let outcome = controller.generate("history").await.unwrap();
        assert_eq!(outcome.source, GenerateSource::Existing { file_id: 3 });
    }

    #[tokio::test]
    async fn test_session_expiry_clears_credentials_and_keeps_questions() {
        let path = std::env::temp_dir()
            .join(format!("exam_builder_ctrl_{}", std::process::id()))
            .join("credentials.toml");
        let credentials = CredentialStore::new(&path);
        credentials
            .save(&Credentials {
                access_token: "tok".into(),
                user: UserInfo::default(),
            })
            .unwrap();

        let api = FakeApi {
            expired: true,
            ..FakeApi::with_files(&[(1, "a.pdf")])
        };
        let mut controller = SessionController::new(api, Some(credentials.clone()));
        controller.store.replace_all(FakeApi::sample_questions());
        controller.selected_file = Some(1);

        let err = controller.generate("again").await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(credentials.load().unwrap(), None);
        assert_eq!(controller.questions().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_delete_and_render() {
        let mut controller = SessionController::new(FakeApi::default(), None);
        controller.store.replace_all(FakeApi::sample_questions());

        let rendered = controller.rendered_questions();
        assert_eq!(rendered.len(), 2);
        assert!(rendered.iter().all(|q| q.choices.len() == 4));

        let fields = EditFields {
            question: "Edited".into(),
            answer: "B".into(),
            choices: [Some("A. one".into()), None, None, None],
        };
        let edited = controller.edit_question(1, fields).unwrap();
        assert!(edited.is_mcq());
        assert_eq!(edited.choices.len(), 4);

        let removed = controller.delete_question(0).unwrap();
        assert_eq!(removed.question, "Q1");
        assert_eq!(controller.questions()[0].question, "Edited");

        assert!(controller.delete_question(5).is_err());
    }

    #[tokio::test]
    async fn test_export_without_questions_is_refused() {
        let controller = SessionController::new(FakeApi::default(), None);
        let err = controller.export(&std::env::temp_dir()).await.unwrap_err();
        assert!(matches!(err, AppError::Export(ExportError::NothingToExport)));
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_refresh_fails() {
        let mut controller = SessionController::new(FakeApi::with_files(&[(1, "a.pdf"), (2, "b.pdf")]), None);
        controller.refresh_files().await.unwrap();
        controller.select_file(1).unwrap();
        controller.api.listing_broken = true;

        let message = controller.delete_file(1).await.unwrap();

        assert_eq!(message, "File deleted");
        assert_eq!(controller.selected_file(), None);
        assert_eq!(controller.files().len(), 1);
        assert_eq!(controller.files()[0].id, 2);
    }
}
