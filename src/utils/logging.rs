/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时默认 `exam_builder=info`，详细模式为 `debug`。
/// 重复初始化时静默忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("exam_builder={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `api_base`: 后端地址
/// - `user`: 当前用户显示名
pub fn log_startup(api_base: &str, user: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 出题与导出");
    info!("🌐 后端地址: {}", api_base);
    if !user.is_empty() {
        info!("👤 当前用户: {}", user);
    }
    info!("{}", "=".repeat(60));
}

/// 记录题目生成信息
///
/// # 参数
/// - `total`: 题目数量
pub fn log_questions_loaded(total: usize) {
    info!("✓ 共 {} 道题目", total);
    info!("💡 可以继续编辑、删除，或导出 PDF\n");
}

/// 记录导出完成信息
pub fn log_export_complete(path: &Path, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "📄 导出完成: {} 道题目 ({})",
        total,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("文件已保存至: {}", path.display());
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
