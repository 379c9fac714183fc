//! 题目数据模型
//!
//! 后端返回的题目 JSON 在这里落地为显式类型。
//! 缺失或格式不对的字段一律转换为空值，交给归一化阶段补齐，反序列化本身不会失败。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 题目类型
///
/// 目前只有 `mcq` 一种；其他字符串原样保留，编辑后会被强制改回 `Mcq`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    /// 单选题（四个选项 A-D）
    Mcq,
    /// 后端给出的其他类型
    Other(String),
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("mcq") {
            QuestionType::Mcq
        } else {
            QuestionType::Other(value)
        }
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        match value {
            QuestionType::Mcq => "mcq".to_string(),
            QuestionType::Other(raw) => raw,
        }
    }
}

/// 单道题目记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub question: String,

    #[serde(default, deserialize_with = "deserialize_choices")]
    pub choices: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub answer: String,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<QuestionType>,

    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub difficulty: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_tags",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<Vec<String>>,
}

impl QuestionRecord {
    /// 快速构造一道单选题
    pub fn mcq(
        question: impl Into<String>,
        choices: Vec<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            choices,
            answer: answer.into(),
            kind: Some(QuestionType::Mcq),
            ..Default::default()
        }
    }

    pub fn is_mcq(&self) -> bool {
        matches!(self.kind, Some(QuestionType::Mcq))
    }
}

/// 任意 JSON 值读成文本：null → 空，数字 / 布尔 → 字面值，对象 / 数组 → 紧凑 JSON
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(value_to_text(&raw))
}

/// 可选文本字段：只认字符串，其他形态当作缺失
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// 标签：数组里只保留字符串元素，不是数组当作缺失
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// 选项列表：不是数组的一律视为空，数组元素逐个转成文本
fn deserialize_choices<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let choices = match raw {
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        _ => Vec::new(),
    };
    Ok(choices)
}

/// 类型字段：只认字符串，其他形态当作缺失
fn deserialize_kind<'de, D>(deserializer: D) -> Result<Option<QuestionType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) => Some(QuestionType::from(s)),
        _ => None,
    })
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
