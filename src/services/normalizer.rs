//! 题目归一化 - 业务能力层
//!
//! 把任意形态的题目记录整理成"题干 + 恰好 4 个选项"的展示结构。
//! 没有错误分支：缺什么就用占位文本补什么。

use std::sync::LazyLock;

use regex::Regex;

use crate::models::QuestionRecord;

/// 单选题固定的选项数量
pub const CHOICE_COUNT: usize = 4;

/// 选项标签
pub const CHOICE_LABELS: [char; CHOICE_COUNT] = ['A', 'B', 'C', 'D'];

/// 没有答案可借用时，合成选项的第一项
pub const CORRECT_ANSWER_PLACEHOLDER: &str = "Correct answer";

static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[abcd]\.\s*").expect("label prefix pattern is valid")
});

/// 归一化后的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuestion {
    pub display_text: String,
    pub choices: [String; CHOICE_COUNT],
}

impl NormalizedQuestion {
    /// 带 `A.`..`D.` 前缀的选项
    pub fn labeled_choices(&self) -> impl Iterator<Item = String> + '_ {
        CHOICE_LABELS
            .iter()
            .zip(self.choices.iter())
            .map(|(label, text)| format!("{}. {}", label, text))
    }
}

/// 归一化单道题目
pub fn normalize(question: &QuestionRecord) -> NormalizedQuestion {
    let mut choices: Vec<String> = if question.choices.is_empty() {
        synthesize_choices(&question.answer)
    } else {
        question.choices.iter().map(|c| strip_label(c)).collect()
    };

    pad_choices(&mut choices);

    let choices: [String; CHOICE_COUNT] = std::array::from_fn(|i| std::mem::take(&mut choices[i]));

    NormalizedQuestion {
        display_text: question.question.clone(),
        choices,
    }
}

/// 去掉一个 `A. ` 形式的选项标签（不区分大小写）
pub fn strip_label(choice: &str) -> String {
    LABEL_PREFIX.replace(choice.trim(), "").into_owned()
}

/// 补齐到 4 项，多余的截掉
pub fn pad_choices(choices: &mut Vec<String>) {
    while choices.len() < CHOICE_COUNT {
        choices.push(option_placeholder(choices.len() + 1));
    }
    choices.truncate(CHOICE_COUNT);
}

/// 第 n 个（从 1 开始）选项的占位文本
pub fn option_placeholder(position: usize) -> String {
    format!("Option {}", position)
}

fn synthesize_choices(answer: &str) -> Vec<String> {
    let first = if answer.is_empty() {
        CORRECT_ANSWER_PLACEHOLDER.to_string()
    } else {
        answer.to_string()
    };

    let mut choices = vec![first];
    choices.extend((1..CHOICE_COUNT).map(|n| format!("Other option {}", n)));
    choices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(choices: &[&str], answer: &str) -> QuestionRecord {
        QuestionRecord::mcq(
            "Capital of France?",
            choices.iter().map(|c| c.to_string()).collect(),
            answer,
        )
    }

    #[test]
    fn test_always_four_choices() {
        for n in [0usize, 1, 4, 6] {
            let choices: Vec<String> = (0..n).map(|i| format!("choice {}", i)).collect();
            let refs: Vec<&str> = choices.iter().map(String::as_str).collect();
            let normalized = normalize(&record_with(&refs, "A"));
            assert_eq!(normalized.choices.len(), CHOICE_COUNT, "input of {} choices", n);
        }
    }

    #[test]
    fn test_strips_one_label() {
        let normalized = normalize(&record_with(&["A. London", "B. Paris", "c.Rome", "d. Berlin"], "B"));
        assert_eq!(normalized.choices, ["London", "Paris", "Rome", "Berlin"]);

        assert_eq!(strip_label("B. Paris"), "Paris");
        assert_eq!(strip_label("  A.   A. nested"), "A. nested");
        assert_eq!(strip_label("E. not a label"), "E. not a label");
        assert_eq!(strip_label("Apple"), "Apple");
    }

    #[test]
    fn test_synthesizes_from_answer() {
        let normalized = normalize(&record_with(&[], "Paris"));
        assert_eq!(
            normalized.choices,
            ["Paris", "Other option 1", "Other option 2", "Other option 3"]
        );

        let normalized = normalize(&record_with(&[], ""));
        assert_eq!(normalized.choices[0], CORRECT_ANSWER_PLACEHOLDER);
    }

    #[test]
    fn test_pads_and_truncates() {
        let normalized = normalize(&record_with(&["A. one", "B. two"], "A"));
        assert_eq!(normalized.choices, ["one", "two", "Option 3", "Option 4"]);

        let normalized = normalize(&record_with(&["1", "2", "3", "4", "5", "6"], "A"));
        assert_eq!(normalized.choices, ["1", "2", "3", "4"]);
    }

    #[test]
    fn test_labeled_choices() {
        let normalized = normalize(&record_with(&["x", "y", "z", "w"], "A"));
        let labeled: Vec<String> = normalized.labeled_choices().collect();
        assert_eq!(labeled, vec!["A. x", "B. y", "C. z", "D. w"]);
    }
}
