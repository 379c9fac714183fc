//! 导出层
//!
//! - `composer` - 决定每页画什么（题目页 + 答案表页）
//! - `text` - 字宽估算、折行、WinAnsi 转码
//! - `pdf_writer` - 用 `lopdf` 把绘制指令编码为 PDF 字节

pub mod composer;
pub mod pdf_writer;
pub mod text;

pub use composer::{
    compose, compose_with, AnswerCell, AnswerKeyGrid, ComposeOptions, ComposedDocument,
    DrawCommand, PageLayout,
};
pub use pdf_writer::{export_pdf, render_pdf, EXPORT_FILE_NAME};
