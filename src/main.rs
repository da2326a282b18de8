use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use research_assistant::models::{SearchSource, WorkflowState};
use research_assistant::orchestrator::{
    ConsolePrompter, NonInteractivePrompter, Prompter, ResearchRequest,
};
use research_assistant::utils::logging;
use research_assistant::{App, Config};

#[derive(Parser, Debug)]
#[command(name = "research-assistant")]
#[command(about = "Search papers, analyze one with an LLM and turn it into a blog post")]
#[command(version)]
struct Args {
    /// 研究主题（为空时交互输入）
    topic: Option<String>,

    /// 搜索来源: arxiv / google_scholar
    #[arg(short, long)]
    source: Option<String>,

    /// 要分析的论文序号（从 0 开始）
    #[arg(short, long, allow_negative_numbers = true)]
    paper_index: Option<i64>,

    /// 搜索结果数量
    #[arg(short, long)]
    max_results: Option<usize>,

    /// 直接保存博客文章
    #[arg(long, conflicts_with = "no_save")]
    save: bool,

    /// 不保存博客文章
    #[arg(long)]
    no_save: bool,

    /// 博客输出目录
    #[arg(short, long, env = "OUTPUT_DIR")]
    output_dir: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 不向用户提问
    #[arg(long)]
    non_interactive: bool,

    /// 以 JSON 输出最终状态
    #[arg(long)]
    json: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// 命令行参数覆盖配置
    fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(max_results) = self.max_results {
            config.max_results = max_results;
        }
        if self.verbose {
            config.verbose_logging = true;
        }
    }

    fn request(&self) -> ResearchRequest {
        ResearchRequest {
            topic: self.topic.clone(),
            source: self.source.as_deref().map(|s| {
                s.parse::<SearchSource>()
                    .unwrap_or_else(|never| match never {})
            }),
            paper_index: self.paper_index,
            max_results: self.max_results,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置（命令行参数优先）
    let mut config = Config::load(args.config.as_deref()).context("加载配置失败")?;
    args.apply_to(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging);
    config.warn_if_missing_credentials();

    // 初始化并运行应用
    let app = App::initialize(config)?;
    let mut prompter: Box<dyn Prompter> = if args.non_interactive {
        Box::new(NonInteractivePrompter)
    } else {
        Box::new(ConsolePrompter::stdin())
    };

    let state = app.run(args.request(), prompter.as_mut()).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_results(&state);
    }

    let saved_to = if should_save(&args, &state, prompter.as_mut()) {
        app.save_blog(&state)?
    } else {
        None
    };

    logging::print_final_stats(&state, saved_to.as_ref().and_then(|p| p.to_str()));
    Ok(())
}

fn print_results(state: &WorkflowState) {
    if let Some(paper) = &state.selected_paper {
        println!("\n📄 {}", paper);
        if !paper.url.is_empty() {
            println!("   {}", paper.url);
        }
    }
    if !state.analysis.is_empty() {
        println!("\n===== Analysis =====\n{}", state.analysis);
    }
    if !state.blog_post.is_empty() {
        println!("\n===== Blog Post =====\n{}", state.blog_post);
    }
    if let Some(error) = &state.error {
        println!("\n⚠️ {}", error);
    }
}

/// 是否保存博客文章
///
/// 命令行指定时直接使用，否则在交互模式下询问
fn should_save(args: &Args, state: &WorkflowState, prompter: &mut dyn Prompter) -> bool {
    if state.blog_post.trim().is_empty() || args.no_save {
        return false;
    }
    if args.save {
        return true;
    }
    if !prompter.is_interactive() {
        return false;
    }

    let suggestions = ["y".to_string(), "n".to_string()];
    let answer = prompter
        .ask("Save the blog post to a file?", &suggestions)
        .map(|a| a.trim().to_ascii_lowercase())
        .unwrap_or_default();
    matches!(answer.as_str(), "y" | "yes")
}
