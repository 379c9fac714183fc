//! 题目列表 - 当前会话的内存存储
//!
//! 顺序即展示顺序即导出顺序；不做持久化。

use crate::error::{AppResult, BusinessError};
use crate::models::QuestionRecord;
use crate::services::editor::{apply_edit, EditFields};
use crate::services::normalizer::{normalize, NormalizedQuestion};

#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    questions: Vec<QuestionRecord>,
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用新生成的题目整体替换
    pub fn replace_all(&mut self, questions: Vec<QuestionRecord>) {
        self.questions = questions;
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn as_slice(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> AppResult<&QuestionRecord> {
        let len = self.questions.len();
        self.questions
            .get(index)
            .ok_or_else(|| BusinessError::QuestionIndexOutOfRange { index, len }.into())
    }

    /// 编辑第 index 题（从 0 开始）
    pub fn edit(&mut self, index: usize, fields: EditFields) -> AppResult<&QuestionRecord> {
        let len = self.questions.len();
        let record = self
            .questions
            .get_mut(index)
            .ok_or(BusinessError::QuestionIndexOutOfRange { index, len })?;
        Ok(apply_edit(record, fields))
    }

    /// 删除第 index 题，后面的题目依次前移
    pub fn remove(&mut self, index: usize) -> AppResult<QuestionRecord> {
        if index >= self.questions.len() {
            return Err(BusinessError::QuestionIndexOutOfRange {
                index,
                len: self.questions.len(),
            }
            .into());
        }
        Ok(self.questions.remove(index))
    }

    /// 所有题目的展示形态
    pub fn normalized(&self) -> Vec<NormalizedQuestion> {
        self.questions.iter().map(normalize).collect()
    }
}
