//! PDF 编码
//!
//! 把排版得到的绘制指令交给 `lopdf` 写成 PDF 字节。
//!
//! 排版使用毫米、左上角原点；PDF 使用点（pt）、左下角原点：
//! ```text
//! pdf_x = x / MM_PER_PT
//! pdf_y = page_height_pt - y / MM_PER_PT
//! ```

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use tracing::debug;

use crate::error::{AppError, AppResult, ExportError};
use crate::export::composer::{Align, ComposedDocument, DrawCommand, FontStyle, PageLayout};
use crate::export::text::{text_width_mm, to_win_ansi, MM_PER_PT};

/// 导出文件名（固定）
pub const EXPORT_FILE_NAME: &str = "questions.pdf";

fn pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

fn font_resource(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Normal => "F1",
        FontStyle::Bold => "F2",
        FontStyle::Italic => "F3",
    }
}

fn font_dictionary(base_font: &str) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(base_font.as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

/// 单页的内容流操作
fn page_operations(page: &PageLayout, page_height: f32) -> Vec<Operation> {
    let height_pt = pt(page_height);
    let mut operations = Vec::new();

    for command in &page.commands {
        match command {
            DrawCommand::Text {
                x,
                y,
                font_size,
                style,
                align,
                text,
            } => {
                let left = match align {
                    Align::Left => *x,
                    Align::Center => *x - text_width_mm(text, *font_size) / 2.0,
                };
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![font_resource(*style).into(), (*font_size).into()],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![pt(left).into(), (height_pt - pt(*y)).into()],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                width,
            } => {
                operations.push(Operation::new("w", vec![pt(*width).into()]));
                operations.push(Operation::new(
                    "m",
                    vec![pt(*x1).into(), (height_pt - pt(*y1)).into()],
                ));
                operations.push(Operation::new(
                    "l",
                    vec![pt(*x2).into(), (height_pt - pt(*y2)).into()],
                ));
                operations.push(Operation::new("S", vec![]));
            }
            DrawCommand::Rect {
                x,
                y,
                width,
                height,
                line_width,
            } => {
                operations.push(Operation::new("w", vec![pt(*line_width).into()]));
                operations.push(Operation::new(
                    "re",
                    vec![
                        pt(*x).into(),
                        (height_pt - pt(*y + *height)).into(),
                        pt(*width).into(),
                        pt(*height).into(),
                    ],
                ));
                operations.push(Operation::new("S", vec![]));
            }
        }
    }

    operations
}

/// 编码为 PDF 字节
pub fn render_pdf(document: &ComposedDocument) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let fonts = Dictionary::from_iter([
        ("F1", Object::Reference(doc.add_object(font_dictionary("Helvetica")))),
        ("F2", Object::Reference(doc.add_object(font_dictionary("Helvetica-Bold")))),
        ("F3", Object::Reference(doc.add_object(font_dictionary("Helvetica-Oblique")))),
    ]);
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(fonts),
    )]));

    let mut kids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = Content {
            operations: page_operations(page, document.page_height),
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    let pages = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_count)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![
                0.into(),
                0.into(),
                pt(document.page_width).into(),
                pt(document.page_height).into(),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| ExportError::Pdf(format!("写入PDF失败: {}", e)))?;

    debug!("PDF 编码完成: {} 页, {} 字节", page_count, output.len());
    Ok(output)
}

/// 编码并写入 `<dir>/questions.pdf`，返回文件路径
pub async fn export_pdf(document: &ComposedDocument, dir: &Path) -> AppResult<PathBuf> {
    let bytes = render_pdf(document)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::file_write_failed(dir.display().to_string(), e))?;

    let path = dir.join(EXPORT_FILE_NAME);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

    Ok(path)
}
