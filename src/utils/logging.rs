/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::WorkflowState;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 `debug` 或 `info`。
/// 日志写到 stderr，stdout 只输出结果（`--json` 时可直接解析）
pub fn init(verbose: bool) {
    let default_level = if verbose { "research_assistant=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `topic`: 研究主题
/// - `model`: 使用的 LLM 模型
pub fn log_startup(topic: &str, model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 Research Assistant 启动");
    info!("📚 研究主题: {}", topic);
    info!("🤖 LLM 模型: {}", model);
    info!("{}", "=".repeat(60));
}

/// 生成供用户挑选的论文列表（每行一篇，带序号）
pub fn format_paper_list(state: &WorkflowState) -> String {
    let mut lines = vec![format!("Found {} papers:", state.papers.len())];
    lines.extend(
        state
            .papers
            .iter()
            .enumerate()
            .map(|(i, paper)| format!("  [{}] {}", i, paper)),
    );
    lines.join("\n")
}

/// 打印最终统计信息
///
/// # 参数
/// - `state`: 最终状态
/// - `saved_to`: 博客文章保存路径（未保存时为空）
pub fn print_final_stats(state: &WorkflowState, saved_to: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 流程结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if let Some(paper) = &state.selected_paper {
        info!("📄 论文: {}", truncate_text(&paper.title, 80));
    }
    info!("📝 分析: {} 字符", state.analysis.chars().count());
    info!("📰 博客: {} 字符", state.blog_post.chars().count());
    match &state.error {
        Some(error) => info!("⚠️ 错误: {}", error),
        None => info!("✅ 没有错误"),
    }
    if let Some(path) = saved_to {
        info!("💾 博客已保存至: {}", path);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
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
