use std::fs;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 输出
///
/// RUST_LOG 未设置时默认 info 级别；
/// 重复初始化（测试里常见）静默忽略
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 初始化考试会话日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n考试会话日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(student_id: &str, quiz_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 监考考试模式");
    info!("🧑 考生号: {}", student_id);
    info!("📄 考试页面: {}", quiz_url);
    info!("{}", "=".repeat(60));
}

/// 打印会话结束统计
pub fn log_session_summary(answered: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 考试会话结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 已作答: {}/{}", answered, total);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
