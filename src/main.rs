mod shell;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;

use exam_builder::clients::ApiClient;
use exam_builder::config::Config;
use exam_builder::error::{AppError, BusinessError};
use exam_builder::services::{CredentialStore, Credentials};
use exam_builder::utils::logging;
use exam_builder::workflow::SessionController;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(
    name = "exam_builder",
    version,
    about = "从 PDF 资料生成单选题，审阅编辑后导出为带答案表的 PDF"
)]
struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true, env = "EXAM_CONFIG")]
    config: Option<PathBuf>,

    /// 覆盖后端地址
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 交互模式（默认）
    Shell,
    /// 列出已上传的文件
    Files,
    /// 删除已上传的文件
    DeleteFile { id: i64 },
    /// 生成题目并打印，可选直接导出
    #[command(group(ArgGroup::new("source").required(true).args(["pdf", "file_id"])))]
    Generate {
        /// 新的 PDF 文件
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// 已上传文件的 ID
        #[arg(long)]
        file_id: Option<i64>,
        /// 出题要求
        #[arg(long)]
        prompt: String,
        /// 生成后导出 questions.pdf
        #[arg(long)]
        export: bool,
    },
    /// 清除本地登录凭证
    Logout,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => Config::from_env(),
    };
    if let Some(api_base) = &cli.api_base {
        config.api_base_url = api_base.clone();
    }

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    let credentials = CredentialStore::new(&config.credentials_file);
    let command = cli.command.unwrap_or(Command::Shell);

    if let Command::Logout = command {
        credentials.clear()?;
        println!("🔒 已退出登录");
        return Ok(ExitCode::SUCCESS);
    }

    match run(command, &config, credentials).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) if is_session_expired(&err) => {
            println!("⏰ 登录已过期，请重新登录后再试");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

/// 错误链中是否为登录过期
fn is_session_expired(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AppError>()
        .is_some_and(AppError::is_session_expired)
}

async fn run(command: Command, config: &Config, credentials: CredentialStore) -> Result<()> {
    let (token, user_name) = resolve_token(config, &credentials)?;
    logging::log_startup(config.api_base(), &user_name);

    let api = ApiClient::new(config, token)?;
    let mut controller = SessionController::new(api, Some(credentials));

    match command {
        Command::Shell => {
            if !user_name.is_empty() {
                println!("👋 你好, {}", user_name);
            }
            shell::Shell::new(controller, PathBuf::from(&config.output_dir))
                .run()
                .await
        }
        Command::Files => {
            controller.refresh_files().await?;
            shell::print_files(&controller);
            Ok(())
        }
        Command::DeleteFile { id } => {
            let message = controller.delete_file(id).await?;
            println!("✅ {}", message);
            Ok(())
        }
        Command::Generate {
            pdf,
            file_id,
            prompt,
            export,
        } => {
            match (pdf, file_id) {
                (Some(path), _) => controller.pick_local_file(path),
                (None, Some(id)) => {
                    controller.refresh_files().await?;
                    controller.select_file(id)?;
                }
                (None, None) => return Err(BusinessError::NoFileSelected.into()),
            }

            let outcome = controller.generate(&prompt).await?;
            shell::print_outcome(&outcome);
            shell::print_questions(&controller);

            if export {
                let path = controller.export(PathBuf::from(&config.output_dir).as_path()).await?;
                logging::log_export_complete(&path, controller.questions().len());
            }
            Ok(())
        }
        Command::Logout => Ok(()),
    }
}

/// 令牌来源：配置 / 环境变量优先，其次凭证文件
fn resolve_token(config: &Config, credentials: &CredentialStore) -> Result<(String, String)> {
    if let Some(token) = config.access_token.as_ref().filter(|t| !t.trim().is_empty()) {
        info!("🔑 使用配置中的访问令牌");
        return Ok((token.clone(), String::new()));
    }

    let Credentials { access_token, user } = credentials
        .load()?
        .ok_or(AppError::Business(BusinessError::NotLoggedIn))?;

    let name = if user.full_name.is_empty() {
        user.username
    } else {
        user.full_name
    };
    Ok((access_token, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_builder::error::ApiError;

    #[test]
    fn test_session_expiry_is_recognized() {
        let err = anyhow::Error::from(AppError::from(ApiError::SessionExpired));
        assert!(is_session_expired(&err));

        let err = anyhow::Error::from(AppError::from(BusinessError::NotLoggedIn));
        assert!(!is_session_expired(&err));

        let err = anyhow::anyhow!("登录已过期");
        assert!(!is_session_expired(&err));
    }
}
