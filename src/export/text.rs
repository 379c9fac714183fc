//! 文本度量与折行
//!
//! 使用 Helvetica 的 AFM 字宽（千分之一 em）估算宽度，
//! 让折行结果与 PDF 阅读器中的实际排版基本一致。

/// 1 pt = 0.352_777_8 mm
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// 不认识的字符按数字宽度估算
const DEFAULT_WIDTH: u16 = 556;

/// ASCII 32..=126 的 Helvetica 字宽
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// WinAnsi 0x80..=0x9F 区段：字符 → (编码, Helvetica 字宽)
fn win_ansi_extra(c: char) -> Option<(u8, u16)> {
    let entry = match c {
        '€' => (0x80, 556),
        '‚' => (0x82, 222),
        'ƒ' => (0x83, 556),
        '„' => (0x84, 333),
        '…' => (0x85, 1000),
        '†' => (0x86, 556),
        '‡' => (0x87, 556),
        'ˆ' => (0x88, 333),
        '‰' => (0x89, 1000),
        'Š' => (0x8a, 667),
        '‹' => (0x8b, 333),
        'Œ' => (0x8c, 1000),
        'Ž' => (0x8e, 611),
        '‘' => (0x91, 222),
        '’' => (0x92, 222),
        '“' => (0x93, 333),
        '”' => (0x94, 333),
        '•' => (0x95, 350),
        '–' => (0x96, 556),
        '—' => (0x97, 1000),
        '˜' => (0x98, 333),
        '™' => (0x99, 1000),
        'š' => (0x9a, 500),
        '›' => (0x9b, 333),
        'œ' => (0x9c, 944),
        'ž' => (0x9e, 500),
        'Ÿ' => (0x9f, 667),
        _ => return None,
    };
    Some(entry)
}

/// 单个字符的宽度（千分之一 em）
fn char_units(c: char) -> u16 {
    if let Some((_, width)) = win_ansi_extra(c) {
        return width;
    }
    let c = fold_char(c).unwrap_or(c);
    match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => DEFAULT_WIDTH,
    }
}

/// 字符串在给定字号下的宽度（毫米）
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_units(c))).sum();
    units as f32 / 1000.0 * font_size * MM_PER_PT
}

/// 按最大宽度折行
///
/// 超长的单词按字符断开；空文本返回一行空串。
pub fn wrap_text(text: &str, max_width_mm: f32, font_size: f32) -> Vec<String> {
    let space_width = text_width_mm(" ", font_size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_width = text_width_mm(word, font_size);

            if word_width > max_width_mm {
                if !current_line.is_empty() {
                    lines.push(std::mem::take(&mut current_line));
                }
                let mut chunk = String::new();
                let mut chunk_width = 0.0_f32;
                for c in word.chars() {
                    let char_width = text_width_mm(c.encode_utf8(&mut [0; 4]), font_size);
                    if chunk_width + char_width > max_width_mm && !chunk.is_empty() {
                        lines.push(std::mem::take(&mut chunk));
                        chunk_width = 0.0;
                    }
                    chunk.push(c);
                    chunk_width += char_width;
                }
                current_line = chunk;
                current_width = chunk_width;
                continue;
            }

            if current_line.is_empty() {
                current_line.push_str(word);
                current_width = word_width;
            } else if current_width + space_width + word_width <= max_width_mm {
                current_line.push(' ');
                current_line.push_str(word);
                current_width += space_width + word_width;
            } else {
                lines.push(std::mem::replace(&mut current_line, word.to_string()));
                current_width = word_width;
            }
        }

        lines.push(current_line);
    }

    lines
}

/// 越南语等带变音符号的拉丁字母折叠为基础字母
const FOLD_TABLE: &[(&str, char)] = &[
    ("àáảãạăằắẳẵặâầấẩẫậ", 'a'),
    ("ÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬ", 'A'),
    ("èéẻẽẹêềếểễệ", 'e'),
    ("ÈÉẺẼẸÊỀẾỂỄỆ", 'E'),
    ("ìíỉĩị", 'i'),
    ("ÌÍỈĨỊ", 'I'),
    ("òóỏõọôồốổỗộơờớởỡợ", 'o'),
    ("ÒÓỎÕỌÔỒỐỔỖỘƠỜỚỞỠỢ", 'O'),
    ("ùúủũụưừứửữự", 'u'),
    ("ÙÚỦŨỤƯỪỨỬỮỰ", 'U'),
    ("ỳýỷỹỵ", 'y'),
    ("ỲÝỶỸỴ", 'Y'),
    ("đ", 'd'),
    ("Đ", 'D'),
];

fn fold_char(c: char) -> Option<char> {
    if c.is_ascii() {
        return None;
    }
    FOLD_TABLE
        .iter()
        .find(|(variants, _)| variants.contains(c))
        .map(|(_, base)| *base)
}

/// 转成标准 Type1 字体（WinAnsi）可显示的字节
///
/// ASCII、Latin-1 与 WinAnsi 的弯引号、破折号等原样编码，
/// 可折叠的变音字母换成基础字母，其余替换为 `?`。
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            if let Some(base) = fold_char(c) {
                return base as u8;
            }
            if let Some((code, _)) = win_ansi_extra(c) {
                return code;
            }
            match c as u32 {
                code @ 0x20..=0x7e => code as u8,
                code @ 0xa0..=0xff => code as u8,
                _ => b'?',
            }
        })
        .collect()
}
