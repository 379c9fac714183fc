//! 交互模式
//!
//! 每行一条命令，逐条顺序执行；出错只打印提示，会话继续。
//! 登录过期时结束会话，错误交给调用方。

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use exam_builder::clients::QuestionApi;
use exam_builder::error::AppError;
use exam_builder::services::{derive_letter, normalize, EditFields, CHOICE_LABELS};
use exam_builder::utils::logging;
use exam_builder::workflow::{GenerateOutcome, GenerateSource, SessionController};

const HELP: &str = "\
命令:
  files              刷新并列出已上传的文件
  select <id>        使用已上传的文件
  pick <path>        选择新的 PDF 文件
  rmfile <id>        删除已上传的文件
  generate [要求]    生成题目
  list               显示全部题目
  show <n>           显示第 n 题及答案、解析
  edit <n>           编辑第 n 题（直接回车保留原值）
  rm <n>             删除第 n 题
  export             导出 questions.pdf
  help               显示帮助
  quit               退出";

pub struct Shell<A: QuestionApi> {
    controller: SessionController<A>,
    output_dir: PathBuf,
    lines: Lines<BufReader<Stdin>>,
}

impl<A: QuestionApi> Shell<A> {
    pub fn new(controller: SessionController<A>, output_dir: PathBuf) -> Self {
        Self {
            controller,
            output_dir,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        self.lines.next_line().await
    }

    pub async fn run(mut self) -> Result<()> {
        println!("{}", HELP);

        if let Err(err) = self.controller.refresh_files().await {
            if err.is_session_expired() {
                return Err(err.into());
            }
            println!("❌ {}", err);
        } else {
            print_files(&self.controller);
        }

        while let Some(line) = self.read_line("\n> ").await? {
            let line = line.trim().to_string();
            let (command, rest) = line
                .split_once(char::is_whitespace)
                .map(|(c, r)| (c, r.trim()))
                .unwrap_or((line.as_str(), ""));

            let result = match command {
                "" => continue,
                "quit" | "exit" => break,
                "help" => {
                    println!("{}", HELP);
                    Ok(())
                }
                other => self.dispatch(other, rest).await,
            };

            match result {
                Err(ShellError::App(err)) if err.is_session_expired() => return Err(err.into()),
                Err(err) => println!("❌ {}", err),
                Ok(()) => {}
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, command: &str, rest: &str) -> Result<(), ShellError> {
        match command {
            "files" => {
                self.controller.refresh_files().await?;
                print_files(&self.controller);
            }
            "select" => {
                let id = parse_number(rest)?;
                self.controller.select_file(id)?;
                println!("{}", self.controller.file_label());
            }
            "pick" => {
                if rest.is_empty() {
                    return Err(ShellError::Usage("pick <path>"));
                }
                self.controller.pick_local_file(rest);
                println!("📎 {}", self.controller.file_label());
            }
            "rmfile" => {
                let id = parse_number(rest)?;
                let confirm = self
                    .read_line(&format!("确定删除文件 {} 吗? (y/N) ", id))
                    .await?
                    .unwrap_or_default();
                if !confirm.trim().eq_ignore_ascii_case("y") {
                    return Ok(());
                }
                let message = self.controller.delete_file(id).await?;
                println!("✅ {}", message);
                print_files(&self.controller);
            }
            "generate" => {
                let prompt = if rest.is_empty() {
                    self.read_line("出题要求: ").await?.unwrap_or_default()
                } else {
                    rest.to_string()
                };
                println!("⏳ 正在生成题目，请稍候...");
                let outcome = self.controller.generate(&prompt).await?;
                print_outcome(&outcome);
                print_questions(&self.controller);
            }
            "list" => print_questions(&self.controller),
            "show" => {
                let index = parse_index(rest)?;
                self.show(index)?;
            }
            "edit" => {
                let index = parse_index(rest)?;
                self.edit(index).await?;
            }
            "rm" => {
                let index = parse_index(rest)?;
                self.controller.delete_question(index)?;
                println!("🗑️ 已删除第 {} 题", index + 1);
                print_questions(&self.controller);
            }
            "export" => {
                let path = self.controller.export(&self.output_dir).await?;
                logging::log_export_complete(&path, self.controller.questions().len());
                println!("✅ 已导出: {}", path.display());
            }
            _ => return Err(ShellError::Usage("未知命令，输入 help 查看帮助")),
        }
        Ok(())
    }

    fn show(&self, index: usize) -> Result<(), ShellError> {
        let record = self.controller.question(index)?;
        let rendered = normalize(record);

        println!("Câu {}: {}", index + 1, rendered.display_text);
        for choice in rendered.labeled_choices() {
            println!("   {}", choice);
        }
        println!("答案: {} ({})", record.answer, derive_letter(&record.answer));
        if let Some(explanation) = record.explanation.as_deref().filter(|e| !e.is_empty()) {
            println!("解析: {}", explanation);
        }
        Ok(())
    }

    async fn edit(&mut self, index: usize) -> Result<(), ShellError> {
        let record = self.controller.question(index)?.clone();
        let rendered = normalize(&record);

        let mut fields = EditFields::prefilled(&record);
        fields.question = self.ask("题干", &record.question).await?;
        for (i, current) in rendered.choices.iter().enumerate() {
            let label = format!("选项 {}", CHOICE_LABELS[i]);
            fields.choices[i] = Some(self.ask(&label, current).await?);
        }
        fields.answer = self.ask("答案", &record.answer).await?;

        self.controller.edit_question(index, fields)?;
        println!("✅ 已保存第 {} 题", index + 1);
        self.show(index)
    }

    /// 读取一个字段，直接回车保留原值
    async fn ask(&mut self, name: &str, current: &str) -> Result<String, ShellError> {
        let input = self
            .read_line(&format!("{} [{}]: ", name, logging::truncate_text(current, 60)))
            .await?
            .unwrap_or_default();
        let input = input.trim();
        Ok(if input.is_empty() {
            current.to_string()
        } else {
            input.to_string()
        })
    }
}

/// 交互命令的错误
#[derive(Debug, thiserror::Error)]
enum ShellError {
    #[error("{0}")]
    App(#[from] AppError),
    #[error("用法: {0}")]
    Usage(&'static str),
    #[error("读取输入失败: {0}")]
    Input(#[from] std::io::Error),
}

fn parse_number(text: &str) -> Result<i64, ShellError> {
    text.parse().map_err(|_| ShellError::Usage("需要一个数字 ID"))
}

/// 把从 1 开始的题号转成下标
fn parse_index(text: &str) -> Result<usize, ShellError> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ShellError::Usage("需要从 1 开始的题号")),
    }
}

pub fn print_files<A: QuestionApi>(controller: &SessionController<A>) {
    let files = controller.files();
    if files.is_empty() {
        println!("📂 还没有上传过文件");
        return;
    }

    println!("📂 已上传的文件:");
    for file in files {
        let marker = if controller.selected_file() == Some(file.id) {
            " ✓ 已选择"
        } else {
            ""
        };
        println!(
            "  [{}] {}  {}  {}{}",
            file.id,
            file.original_filename,
            file.upload_date_display(),
            file.size_kb_display(),
            marker
        );
    }
}

pub fn print_outcome(outcome: &GenerateOutcome) {
    if let GenerateSource::ReusedDuplicate { file_name, file_id } = &outcome.source {
        println!(
            "⚠️ 文件 \"{}\" 已存在，已自动使用列表中的文件 (ID: {})",
            file_name, file_id
        );
    }
    logging::log_questions_loaded(outcome.question_count);
}

pub fn print_questions<A: QuestionApi>(controller: &SessionController<A>) {
    let rendered = controller.rendered_questions();
    if rendered.is_empty() {
        println!("（暂无题目）");
        return;
    }

    for (i, question) in rendered.iter().enumerate() {
        println!("\nCâu {}: {}", i + 1, question.display_text);
        for choice in question.labeled_choices() {
            println!("   {}", choice);
        }
    }
}
