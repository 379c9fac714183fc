//! 答案字母推断 - 业务能力层
//!
//! 答案是自由文本（例如 "The answer is B: ..."），答案表只需要一个字母。
//! 这是启发式规则，识别不了时返回 `?`，这是正常输出而不是错误。

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static LEADING_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-d])(?:[.:\s]|$)").expect("leading letter pattern is valid")
});

/// 答案表中的单个字母
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
    /// 无法识别
    Unknown,
}

impl AnswerLetter {
    const KNOWN: [(AnswerLetter, char); 4] = [
        (AnswerLetter::A, 'a'),
        (AnswerLetter::B, 'b'),
        (AnswerLetter::C, 'c'),
        (AnswerLetter::D, 'd'),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerLetter::A => "A",
            AnswerLetter::B => "B",
            AnswerLetter::C => "C",
            AnswerLetter::D => "D",
            AnswerLetter::Unknown => "?",
        }
    }

    fn from_lower(c: char) -> Option<Self> {
        Self::KNOWN
            .iter()
            .find(|(_, lower)| *lower == c)
            .map(|(letter, _)| *letter)
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从答案文本推断字母，规则按顺序匹配，先命中者为准：
/// 1. 以 a-d 开头，后面紧跟 `.`、`:`、空白或结尾
/// 2. 依次检查 A/B/C/D：以该字母开头，或包含 "answer is x" / "đáp án x"
/// 3. 都不满足则为 `?`
pub fn derive_letter(answer: &str) -> AnswerLetter {
    let lower = answer.trim().to_lowercase();

    if let Some(c) = LEADING_LETTER
        .captures(&lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
    {
        if let Some(letter) = AnswerLetter::from_lower(c) {
            return letter;
        }
    }

    for (letter, c) in AnswerLetter::KNOWN {
        if lower.starts_with(c)
            || lower.contains(&format!("answer is {}", c))
            || lower.contains(&format!("đáp án {}", c))
        {
            return letter;
        }
    }

    AnswerLetter::Unknown
}
