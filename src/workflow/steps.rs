//! 工作流步骤 - 流程层
//!
//! 每个步骤都是"读状态、返回部分更新"的函数，从不失败：
//! 输入校验失败、外部调用失败都转换为更新中的 `error`

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::LanguageModel;
use crate::models::{Interrupt, SearchSource, StateKey, StateUpdate, WorkflowState};
use crate::services::prompt_builder::{build_analysis_prompt, build_blog_prompt};
use crate::services::SearchRegistry;
use crate::utils::truncate_text;
use crate::workflow::graph::Step;

pub const SOURCE_QUESTION: &str =
    "Which source would you like to search for papers? (arxiv / google_scholar)";
pub const LLM_UNAVAILABLE: &str = "LLM initialization failed. Check API key.";

// ========== 搜索来源选择 ==========

/// 询问搜索来源
///
/// 只有在来源未设置且没有已选论文时才发起中断
pub fn ask_search_source(state: &WorkflowState) -> StateUpdate {
    if state.search_source.is_some() || state.selected_paper.is_some() {
        debug!("已有搜索来源或已选论文，跳过来源询问");
        return StateUpdate::new();
    }

    info!("❓ 等待用户选择搜索来源");
    StateUpdate::new().interrupt(Interrupt::ask(
        SOURCE_QUESTION,
        SearchSource::choices(),
        StateKey::SearchSourceRawInput,
    ))
}

/// 处理用户输入的搜索来源
///
/// 输入为空或无法识别时使用 arXiv，并追加一条警告；总是清除中断
pub fn process_source_selection(state: &WorkflowState) -> StateUpdate {
    let raw = state.search_source_raw_input.as_deref().unwrap_or_default();
    let update = StateUpdate::new().clear_interrupt();

    match SearchSource::parse_known(raw) {
        Some(source) => {
            info!("✓ 搜索来源: {}", source);
            update.search_source(source)
        }
        None if raw.trim().is_empty() => {
            warn!("⚠️ 未选择搜索来源，默认使用 arXiv");
            update
                .search_source(SearchSource::Arxiv)
                .error("No search source selected; defaulting to arxiv")
        }
        None => {
            warn!("⚠️ 无法识别的搜索来源 '{}'，默认使用 arXiv", raw.trim());
            update
                .search_source(SearchSource::Arxiv)
                .error(format!("Unrecognized search source '{}'; defaulting to arxiv", raw.trim()))
        }
    }
}

// ========== 搜索 ==========

/// 搜索论文
///
/// # 参数
/// - `state`: 当前状态（读取 `topic`、`search_source`、`max_results`）
/// - `registry`: 搜索来源注册表
pub async fn search(state: &WorkflowState, registry: &SearchRegistry) -> StateUpdate {
    let topic = state.topic.trim();
    if topic.is_empty() {
        return StateUpdate::new()
            .papers(Vec::new())
            .error("No search topic provided");
    }

    let source = match &state.search_source {
        None => {
            return StateUpdate::new()
                .papers(Vec::new())
                .error("No search source selected");
        }
        Some(source) if !source.is_known() => {
            return StateUpdate::new()
                .papers(Vec::new())
                .error(format!("Invalid search source: {}", source));
        }
        Some(source) => source,
    };

    let Some(provider) = registry.get(source) else {
        return StateUpdate::new()
            .papers(Vec::new())
            .error(format!("Invalid search source: {}", source));
    };

    info!("🔍 [{}] 搜索: {} (最多 {} 篇)", provider.name(), topic, state.max_results);
    match provider.search(topic, state.max_results).await {
        Ok(papers) => {
            if papers.iter().any(|p| p.is_placeholder()) {
                warn!("⚠️ 搜索结果包含占位论文，分析内容可能没有意义");
            }
            info!("✓ 找到 {} 篇论文", papers.len());
            StateUpdate::new().papers(papers)
        }
        Err(e) => {
            warn!("搜索失败: {}", e);
            StateUpdate::new()
                .papers(Vec::new())
                .error(format!("Error searching papers: {}", e))
        }
    }
}

// ========== 选择论文 ==========

/// 按 `paper_index` 选择论文
///
/// 序号缺失或越界时选择第一篇
pub fn select_paper(state: &WorkflowState) -> StateUpdate {
    if state.papers.is_empty() {
        return StateUpdate::new()
            .selected_paper(None)
            .error("No papers found");
    }

    let requested = state.paper_index.unwrap_or(0);
    let index = usize::try_from(requested)
        .ok()
        .filter(|i| *i < state.papers.len())
        .unwrap_or_else(|| {
            if state.paper_index.is_some() {
                warn!("⚠️ 论文序号 {} 越界，改为选择第 0 篇", requested);
            }
            0
        });

    let paper = state.papers[index].clone();
    info!("📄 选择论文 [{}]: {}", index, paper);
    StateUpdate::new().selected_paper(Some(paper))
}

// ========== LLM 步骤 ==========

/// 分析选中的论文
pub async fn analyze_paper(state: &WorkflowState, llm: Option<&dyn LanguageModel>) -> StateUpdate {
    let Some(paper) = &state.selected_paper else {
        return StateUpdate::new().analysis("").error("No paper selected");
    };
    let Some(llm) = llm else {
        return StateUpdate::new().analysis("").error(LLM_UNAVAILABLE);
    };

    let prompt = build_analysis_prompt(paper);
    debug!("分析提示词 {} 字符", prompt.chars().count());
    info!("🤖 正在分析论文: {}", truncate_text(&paper.title, 60));

    match llm.generate(&prompt).await {
        Ok(analysis) => {
            info!("✓ 分析完成 ({} 字符)", analysis.chars().count());
            StateUpdate::new().analysis(analysis)
        }
        Err(e) => {
            warn!("论文分析失败: {}", e);
            StateUpdate::new()
                .analysis("")
                .error(format!("Error analyzing paper: {}", e))
        }
    }
}

/// 根据分析结果生成博客文章
pub async fn generate_blog(state: &WorkflowState, llm: Option<&dyn LanguageModel>) -> StateUpdate {
    if state.analysis.trim().is_empty() {
        return StateUpdate::new().blog_post("").error("No analysis available");
    }
    let Some(paper) = &state.selected_paper else {
        return StateUpdate::new().blog_post("").error("No paper selected");
    };
    let Some(llm) = llm else {
        return StateUpdate::new().blog_post("").error(LLM_UNAVAILABLE);
    };

    let prompt = build_blog_prompt(paper, &state.analysis);
    debug!("博客提示词 {} 字符", prompt.chars().count());
    info!("✍️ 正在生成博客文章");

    match llm.generate(&prompt).await {
        Ok(blog_post) => {
            info!("✓ 博客生成完成 ({} 字符)", blog_post.chars().count());
            StateUpdate::new().blog_post(blog_post)
        }
        Err(e) => {
            warn!("博客生成失败: {}", e);
            StateUpdate::new()
                .blog_post("")
                .error(format!("Error generating blog: {}", e))
        }
    }
}

// ========== 步骤包装 ==========

/// 搜索步骤
pub struct SearchStep {
    registry: SearchRegistry,
}

impl SearchStep {
    pub fn new(registry: SearchRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Step for SearchStep {
    async fn run(&self, state: &WorkflowState) -> StateUpdate {
        search(state, &self.registry).await
    }
}

/// 论文分析步骤
pub struct AnalyzeStep {
    llm: Option<Arc<dyn LanguageModel>>,
}

impl AnalyzeStep {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Step for AnalyzeStep {
    async fn run(&self, state: &WorkflowState) -> StateUpdate {
        analyze_paper(state, self.llm.as_deref()).await
    }
}

/// 博客生成步骤
pub struct BlogStep {
    llm: Option<Arc<dyn LanguageModel>>,
}

impl BlogStep {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Step for BlogStep {
    async fn run(&self, state: &WorkflowState) -> StateUpdate {
        generate_blog(state, self.llm.as_deref()).await
    }
}
