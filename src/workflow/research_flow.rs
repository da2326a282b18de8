//! 研究流程 - 流程层
//!
//! 核心职责：把各个步骤连成完整的研究助手流程
//!
//! 流程顺序：
//! ```text
//! ask_source ─┬─(需要选择来源)─→ process_source → search → select → analyze → blog → END
//!             ├─(已有来源)──────────────────────→ search
//!             └─(已有论文)──────────────────────────────────────→ analyze
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::clients::LanguageModel;
use crate::error::GraphError;
use crate::models::WorkflowState;
use crate::services::SearchRegistry;
use crate::workflow::graph::{sync_step, Branch, CompiledWorkflow, WorkflowGraph, END};
use crate::workflow::steps::{
    ask_search_source, process_source_selection, select_paper, AnalyzeStep, BlogStep, SearchStep,
};

pub const ASK_SOURCE: &str = "ask_source";
pub const PROCESS_SOURCE: &str = "process_source";
pub const SEARCH: &str = "search";
pub const SELECT: &str = "select";
pub const ANALYZE: &str = "analyze";
pub const BLOG: &str = "blog";

/// 入口步骤之后的走向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResearchBranch {
    /// 处理用户选择的来源
    ProcessSource,
    /// 已有来源，直接搜索
    Search,
    /// 已有论文，直接分析
    Analyze,
}

impl Branch for ResearchBranch {
    fn variants() -> &'static [Self] {
        &[
            ResearchBranch::ProcessSource,
            ResearchBranch::Search,
            ResearchBranch::Analyze,
        ]
    }
}

/// 决定入口步骤之后的走向
///
/// 优先级：已选论文 > 已有来源 > 处理来源选择。
/// 已选论文但论文列表为空时，把论文列表补成只包含已选论文
pub fn route_after_source_prompt(state: &mut WorkflowState) -> ResearchBranch {
    if let Some(paper) = &state.selected_paper {
        if state.papers.is_empty() {
            debug!("论文列表为空，使用已选论文补齐");
            state.papers = vec![paper.clone()];
        }
        return ResearchBranch::Analyze;
    }
    if state.search_source.is_some() {
        return ResearchBranch::Search;
    }
    ResearchBranch::ProcessSource
}

/// 构建研究助手工作流
///
/// # 参数
/// - `registry`: 搜索来源注册表
/// - `llm`: LLM 客户端，缺失时分析与博客步骤返回错误
pub fn build_research_workflow(
    registry: SearchRegistry,
    llm: Option<Arc<dyn LanguageModel>>,
) -> Result<CompiledWorkflow<ResearchBranch>, GraphError> {
    let mut graph = WorkflowGraph::new();

    graph.register_step(ASK_SOURCE, sync_step(ask_search_source))?;
    graph.register_step(PROCESS_SOURCE, sync_step(process_source_selection))?;
    graph.register_step(SEARCH, Arc::new(SearchStep::new(registry)))?;
    graph.register_step(SELECT, sync_step(select_paper))?;
    graph.register_step(ANALYZE, Arc::new(AnalyzeStep::new(llm.clone())))?;
    graph.register_step(BLOG, Arc::new(BlogStep::new(llm)))?;

    graph.connect_conditional(
        ASK_SOURCE,
        [
            (ResearchBranch::ProcessSource, PROCESS_SOURCE),
            (ResearchBranch::Search, SEARCH),
            (ResearchBranch::Analyze, ANALYZE),
        ],
        route_after_source_prompt,
    )?;
    graph.connect(PROCESS_SOURCE, SEARCH)?;
    graph.connect(SEARCH, SELECT)?;
    graph.connect(SELECT, ANALYZE)?;
    graph.connect(ANALYZE, BLOG)?;
    graph.connect(BLOG, END)?;
    graph.set_entry(ASK_SOURCE)?;

    graph.compile()
}
