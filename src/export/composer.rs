//! 试卷排版
//!
//! 遍历题目列表，生成逐页的绘制指令；不产生任何 PDF 字节。
//! 坐标单位为毫米，原点在页面左上角（A4 纵向）。
//!
//! 分页是贪心的：每道题开始前检查游标是否越过底部阈值，越过则换页，
//! 已放置的内容不会回流。答案表同样按行续页，每页最多 24 行。

use chrono::NaiveDate;

use crate::error::ExportError;
use crate::export::text::wrap_text;
use crate::models::QuestionRecord;
use crate::services::answer_key::{derive_letter, AnswerLetter};
use crate::services::normalizer::normalize;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TOP: f32 = 20.0;
/// 游标超过 `PAGE_HEIGHT - BOTTOM_RESERVE` 时，下一题换页
const BOTTOM_RESERVE: f32 = 60.0;

const QUESTION_FONT_SIZE: f32 = 12.0;
const QUESTION_WRAP_WIDTH: f32 = 170.0;
const QUESTION_LINE_HEIGHT: f32 = 7.0;
const CHOICE_INDENT: f32 = 5.0;
const CHOICE_WRAP_WIDTH: f32 = 165.0;
const CHOICE_LINE_HEIGHT: f32 = 6.0;

/// 答案表每行的列数
pub const ANSWER_COLUMNS: usize = 5;
const CELL_WIDTH: f32 = 30.0;
const CELL_HEIGHT: f32 = 10.0;
/// 答案表表格顶部（标题下方）
const ANSWER_TABLE_TOP: f32 = TOP + 15.0;
/// 每页答案表最多的行数：(297 - 20 - 35) / 10
const MAX_ANSWER_ROWS: usize = 24;

pub const DEFAULT_TITLE: &str = "DE THI TRAC NGHIEM";
pub const ANSWER_KEY_TITLE: &str = "BANG DAP AN";
const ANSWER_KEY_NOTE: &str = "Luu y: Kiem tra ky dap an truoc khi su dung";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// 单条绘制指令
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// 单行文本，`y` 为基线
    Text {
        x: f32,
        y: f32,
        font_size: f32,
        style: FontStyle,
        align: Align,
        text: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
    },
    /// 描边矩形，`(x, y)` 为左上角
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub commands: Vec<DrawCommand>,
}

impl PageLayout {
    /// 页面上所有文本
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// 答案表中的一格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerCell {
    /// 题号（从 1 开始）
    pub number: usize,
    pub row: usize,
    pub column: usize,
    pub letter: AnswerLetter,
}

/// 答案表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKeyGrid {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<AnswerCell>,
}

impl AnswerKeyGrid {
    pub fn build(questions: &[QuestionRecord]) -> Self {
        let cells = questions
            .iter()
            .enumerate()
            .map(|(i, q)| AnswerCell {
                number: i + 1,
                row: i / ANSWER_COLUMNS,
                column: i % ANSWER_COLUMNS,
                letter: derive_letter(&q.answer),
            })
            .collect();

        Self {
            rows: questions.len().div_ceil(ANSWER_COLUMNS),
            columns: ANSWER_COLUMNS,
            cells,
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&AnswerCell> {
        if column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }
}

/// 排版结果
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    pub page_width: f32,
    pub page_height: f32,
    /// 题目页在前，答案表页在后
    pub pages: Vec<PageLayout>,
    /// 第一张答案表页在 `pages` 中的下标
    pub answer_key_start: usize,
    pub answer_key: AnswerKeyGrid,
}

impl ComposedDocument {
    pub fn question_pages(&self) -> &[PageLayout] {
        &self.pages[..self.answer_key_start]
    }

    /// 答案表的全部页（题目很多时答案表会跨页）
    pub fn answer_key_pages(&self) -> &[PageLayout] {
        &self.pages[self.answer_key_start..]
    }

    /// 答案表第一页
    pub fn answer_key_page(&self) -> Option<&PageLayout> {
        self.pages.get(self.answer_key_start)
    }
}

/// 排版选项
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub title: String,
    pub export_date: NaiveDate,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            export_date: chrono::Local::now().date_naive(),
        }
    }
}

/// 以今天的日期排版
pub fn compose(questions: &[QuestionRecord]) -> Result<ComposedDocument, ExportError> {
    compose_with(questions, &ComposeOptions::default())
}

/// 排版整份试卷
///
/// 题目为空时返回 `ExportError::NothingToExport`，不生成任何指令。
pub fn compose_with(
    questions: &[QuestionRecord],
    options: &ComposeOptions,
) -> Result<ComposedDocument, ExportError> {
    if questions.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut pages = compose_question_pages(questions, &options.title);
    let answer_key_start = pages.len();
    let answer_key = AnswerKeyGrid::build(questions);
    pages.extend(compose_answer_key_pages(&answer_key, options.export_date));

    Ok(ComposedDocument {
        page_width: PAGE_WIDTH,
        page_height: PAGE_HEIGHT,
        pages,
        answer_key_start,
        answer_key,
    })
}

fn text(x: f32, y: f32, font_size: f32, style: FontStyle, content: impl Into<String>) -> DrawCommand {
    DrawCommand::Text {
        x,
        y,
        font_size,
        style,
        align: Align::Left,
        text: content.into(),
    }
}

fn centered(y: f32, font_size: f32, style: FontStyle, content: impl Into<String>) -> DrawCommand {
    DrawCommand::Text {
        x: PAGE_WIDTH / 2.0,
        y,
        font_size,
        style,
        align: Align::Center,
        text: content.into(),
    }
}

fn compose_question_pages(questions: &[QuestionRecord], title: &str) -> Vec<PageLayout> {
    let mut pages = Vec::new();
    let mut page = PageLayout::default();
    let mut y = TOP;

    // 标题区
    page.commands.push(centered(y, 20.0, FontStyle::Bold, title));
    y += 10.0;
    page.commands.push(centered(
        y,
        10.0,
        FontStyle::Normal,
        format!("Tong so cau: {}", questions.len()),
    ));
    y += 15.0;
    page.commands.push(DrawCommand::Line {
        x1: MARGIN,
        y1: y,
        x2: PAGE_WIDTH - MARGIN,
        y2: y,
        width: 0.5,
    });
    y += 10.0;

    for (index, question) in questions.iter().enumerate() {
        if y > PAGE_HEIGHT - BOTTOM_RESERVE {
            pages.push(std::mem::take(&mut page));
            y = TOP;
        }

        page.commands.push(text(
            MARGIN,
            y,
            QUESTION_FONT_SIZE,
            FontStyle::Bold,
            format!("Cau {}:", index + 1),
        ));
        y += 7.0;

        let normalized = normalize(question);

        let lines = wrap_text(&normalized.display_text, QUESTION_WRAP_WIDTH, QUESTION_FONT_SIZE);
        push_lines(&mut page, &lines, MARGIN, y, QUESTION_LINE_HEIGHT);
        y += lines.len() as f32 * QUESTION_LINE_HEIGHT + 3.0;

        for choice in normalized.labeled_choices() {
            let lines = wrap_text(&choice, CHOICE_WRAP_WIDTH, QUESTION_FONT_SIZE);
            push_lines(&mut page, &lines, MARGIN + CHOICE_INDENT, y, CHOICE_LINE_HEIGHT);
            y += lines.len() as f32 * CHOICE_LINE_HEIGHT + 1.0;
        }

        y += 8.0;
    }

    pages.push(page);
    pages
}

fn push_lines(page: &mut PageLayout, lines: &[String], x: f32, y: f32, line_height: f32) {
    for (i, line) in lines.iter().enumerate() {
        page.commands.push(text(
            x,
            y + i as f32 * line_height,
            QUESTION_FONT_SIZE,
            FontStyle::Normal,
            line.as_str(),
        ));
    }
}

fn answer_key_header() -> PageLayout {
    let mut page = PageLayout::default();
    page.commands.push(centered(TOP, 16.0, FontStyle::Bold, ANSWER_KEY_TITLE));
    page
}

/// 答案表页
///
/// 超过 `MAX_ANSWER_ROWS` 行时表格续到下一页；表格下方放不下页脚时页脚另起一页。
fn compose_answer_key_pages(grid: &AnswerKeyGrid, export_date: NaiveDate) -> Vec<PageLayout> {
    let mut pages = Vec::new();
    let mut page = answer_key_header();
    let mut first_row = 0;

    for cell in &grid.cells {
        if cell.row - first_row >= MAX_ANSWER_ROWS {
            pages.push(std::mem::replace(&mut page, answer_key_header()));
            first_row = cell.row;
        }

        let x = MARGIN + cell.column as f32 * CELL_WIDTH;
        let cell_y = ANSWER_TABLE_TOP + (cell.row - first_row) as f32 * CELL_HEIGHT;

        page.commands.push(DrawCommand::Rect {
            x,
            y: cell_y,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
            line_width: 0.3,
        });
        page.commands.push(text(
            x + 2.0,
            cell_y + 6.5,
            10.0,
            FontStyle::Bold,
            format!("{}.", cell.number),
        ));
        page.commands.push(text(
            x + CELL_WIDTH - 8.0,
            cell_y + 6.5,
            10.0,
            FontStyle::Normal,
            cell.letter.as_str(),
        ));
    }

    let mut y = ANSWER_TABLE_TOP + (grid.rows - first_row) as f32 * CELL_HEIGHT + 15.0;
    if y + 10.0 > PAGE_HEIGHT - TOP {
        pages.push(std::mem::replace(&mut page, answer_key_header()));
        y = ANSWER_TABLE_TOP;
    }

    page.commands.push(text(MARGIN, y, 9.0, FontStyle::Italic, ANSWER_KEY_NOTE));

    y += 10.0;
    page.commands.push(text(
        MARGIN,
        y,
        9.0,
        FontStyle::Normal,
        format!("Ngay xuat: {}", export_date.format("%d/%m/%Y")),
    ));
    page.commands.push(text(
        PAGE_WIDTH - MARGIN - 40.0,
        y,
        9.0,
        FontStyle::Normal,
        format!("Tong cau hoi: {}", grid.cells.len()),
    ));

    pages.push(page);
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ComposeOptions {
        ComposeOptions {
            title: DEFAULT_TITLE.to_string(),
            export_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        }
    }

    fn questions(n: usize) -> Vec<QuestionRecord> {
        (1..=n)
            .map(|i| {
                QuestionRecord::mcq(
                    format!("Question number {}?", i),
                    vec!["A. one".into(), "B. two".into(), "C. three".into(), "D. four".into()],
                    "The answer is B: two",
                )
            })
            .collect()
    }

    fn rects(page: &PageLayout) -> Vec<(f32, f32)> {
        page.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Rect { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_is_refused() {
        let result = compose_with(&[], &options());
        assert!(matches!(result, Err(ExportError::NothingToExport)));
    }

    #[test]
    fn test_seven_questions_grid() {
        let doc = compose_with(&questions(7), &options()).unwrap();

        assert_eq!(doc.answer_key.rows, 2);
        assert_eq!(doc.answer_key.columns, 5);
        assert_eq!(doc.answer_key.cells.len(), 7);
        for column in 2..5 {
            assert!(doc.answer_key.cell(1, column).is_none());
        }

        let page = doc.answer_key_page().unwrap();
        let cells = rects(page);
        assert_eq!(cells.len(), 7);
        let second_row: Vec<_> = cells.iter().filter(|(_, y)| *y == 45.0).collect();
        assert_eq!(second_row.len(), 2);
    }

    #[test]
    fn test_answer_key_page_content() {
        let doc = compose_with(&questions(3), &options()).unwrap();
        let texts: Vec<&str> = doc.answer_key_page().unwrap().texts().collect();

        assert_eq!(texts[0], ANSWER_KEY_TITLE);
        assert!(texts.contains(&"1."));
        assert!(texts.contains(&"B"));
        assert!(texts.contains(&"Ngay xuat: 31/01/2025"));
        assert!(texts.contains(&"Tong cau hoi: 3"));
    }

    #[test]
    fn test_question_block() {
        let doc = compose_with(&questions(1), &options()).unwrap();
        assert_eq!(doc.pages.len(), 2);

        let texts: Vec<&str> = doc.question_pages()[0].texts().collect();
        assert_eq!(
            texts,
            vec![
                DEFAULT_TITLE,
                "Tong so cau: 1",
                "Cau 1:",
                "Question number 1?",
                "A. one",
                "B. two",
                "C. three",
                "D. four",
            ]
        );
    }

    #[test]
    fn test_pagination_starts_new_page() {
        let doc = compose_with(&questions(12), &options()).unwrap();
        let question_pages = doc.question_pages();
        assert!(question_pages.len() >= 2);

        // 每题一个块，总块数不变
        let labels: usize = question_pages
            .iter()
            .map(|p| p.texts().filter(|t| t.starts_with("Cau ")).count())
            .sum();
        assert_eq!(labels, 12);

        // 新页的第一条指令是题号，位置在顶部边距
        match &question_pages[1].commands[0] {
            DrawCommand::Text { y, text, .. } => {
                assert_eq!(*y, TOP);
                assert!(text.starts_with("Cau "));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_malformed_question_still_has_four_choices() {
        let record = QuestionRecord {
            question: "No choices here".to_string(),
            answer: "xyz".to_string(),
            ..Default::default()
        };
        let doc = compose_with(&[record], &options()).unwrap();

        let texts: Vec<&str> = doc.question_pages()[0].texts().collect();
        assert!(texts.contains(&"A. xyz"));
        assert!(texts.contains(&"D. Other option 3"));
        assert_eq!(doc.answer_key.cells[0].letter, AnswerLetter::Unknown);
    }

    #[test]
    fn test_cell_outside_columns_is_none() {
        let grid = AnswerKeyGrid::build(&questions(7));
        assert!(grid.cell(0, 5).is_none());
        assert_eq!(grid.cell(1, 0).unwrap().number, 6);
    }

    fn max_y(page: &PageLayout) -> f32 {
        page.commands
            .iter()
            .map(|cmd| match cmd {
                DrawCommand::Text { y, .. } => *y,
                DrawCommand::Line { y1, y2, .. } => y1.max(*y2),
                DrawCommand::Rect { y, height, .. } => y + height,
            })
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_long_answer_key_continues_on_next_page() {
        let doc = compose_with(&questions(200), &options()).unwrap();
        let answer_pages = doc.answer_key_pages();

        assert_eq!(answer_pages.len(), 2);
        assert!(answer_pages.iter().all(|p| max_y(p) <= PAGE_HEIGHT - TOP));

        let drawn: usize = answer_pages.iter().map(|p| rects(p).len()).sum();
        assert_eq!(drawn, 200);
        assert_eq!(rects(&answer_pages[0]).len(), MAX_ANSWER_ROWS * ANSWER_COLUMNS);

        // 续页从表格顶部重新开始
        assert_eq!(rects(&answer_pages[1])[0], (MARGIN, ANSWER_TABLE_TOP));
        assert!(answer_pages[1].texts().any(|t| t == "Tong cau hoi: 200"));
    }

    #[test]
    fn test_footer_moves_to_new_page_when_table_fills_page() {
        // 22 行：表格放得下，页脚放不下
        let doc = compose_with(&questions(110), &options()).unwrap();
        let answer_pages = doc.answer_key_pages();

        assert_eq!(answer_pages.len(), 2);
        assert_eq!(rects(&answer_pages[0]).len(), 110);
        assert!(rects(&answer_pages[1]).is_empty());
        assert!(answer_pages[1].texts().any(|t| t == "Ngay xuat: 31/01/2025"));
        assert!(answer_pages.iter().all(|p| max_y(p) <= PAGE_HEIGHT - TOP));
    }
}
