//! 题目编辑 - 业务能力层
//!
//! 用用户提交的字段覆盖一道题目，并把类型强制设为单选题。

use crate::models::{QuestionRecord, QuestionType};
use crate::services::normalizer::{option_placeholder, strip_label, CHOICE_COUNT};

/// 编辑表单提交的字段
///
/// 选项按位置读取；`None` 表示表单里没有这个输入框。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditFields {
    pub question: String,
    pub answer: String,
    pub choices: [Option<String>; CHOICE_COUNT],
}

impl EditFields {
    /// 以题目当前内容预填表单
    pub fn prefilled(record: &QuestionRecord) -> Self {
        Self {
            question: record.question.clone(),
            answer: record.answer.clone(),
            choices: std::array::from_fn(|i| record.choices.get(i).cloned()),
        }
    }
}

/// 应用编辑
///
/// 空字符串照单全收。缺失的选项输入框不会让数组变短：
/// 沿用该位置原有的选项，原来也没有就补占位文本，保证编辑后仍是 4 个选项。
pub fn apply_edit(record: &mut QuestionRecord, fields: EditFields) -> &mut QuestionRecord {
    let previous = std::mem::take(&mut record.choices);

    record.question = fields.question;
    record.answer = fields.answer;
    record.kind = Some(QuestionType::Mcq);
    record.choices = fields
        .choices
        .into_iter()
        .enumerate()
        .map(|(i, field)| match field {
            Some(value) => value,
            None => previous
                .get(i)
                .map(|c| strip_label(c))
                .unwrap_or_else(|| option_placeholder(i + 1)),
        })
        .collect();

    debug_assert_eq!(record.choices.len(), CHOICE_COUNT);
    record
}
