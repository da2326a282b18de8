//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 LLM 客户端、搜索来源、编译工作流
//! 2. **请求处理**：补齐主题、构建初始状态、交给 [`Runner`] 执行
//! 3. **结果保存**：按需把博客文章写入输出目录

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::{ArxivClient, LanguageModel, LlmClient, ScholarClient};
use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{SearchSource, WorkflowState};
use crate::orchestrator::prompter::Prompter;
use crate::orchestrator::runner::Runner;
use crate::services::{ArxivSearch, BlogWriter, ScholarSearch, SearchRegistry};
use crate::utils::logging::log_startup;
use crate::workflow::{build_research_workflow, CompiledWorkflow, ResearchBranch};

pub const TOPIC_QUESTION: &str = "Enter a research topic";

/// 一次研究请求
///
/// 未填写的字段由配置或交互补齐
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    pub topic: Option<String>,
    pub source: Option<SearchSource>,
    pub paper_index: Option<i64>,
    pub max_results: Option<usize>,
}

/// 应用主结构
pub struct App {
    config: Config,
    workflow: CompiledWorkflow<ResearchBranch>,
    model_name: String,
    writer: BlogWriter,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let llm = LlmClient::from_config(&config);
        let registry = default_registry(&config).context("创建搜索客户端失败")?;
        Self::with_components(config, registry, llm)
    }

    /// 使用自定义搜索来源和 LLM 初始化
    pub fn with_components(
        config: Config,
        registry: SearchRegistry,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Result<Self> {
        let model_name = llm
            .as_ref()
            .map(|m| m.model_name().to_string())
            .unwrap_or_else(|| "未配置".to_string());
        let workflow = build_research_workflow(registry, llm).context("工作流编译失败")?;

        Ok(Self {
            writer: BlogWriter::with_dir(&config.output_dir),
            config,
            workflow,
            model_name,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行一次研究流程
    ///
    /// # 参数
    /// - `request`: 研究请求
    /// - `prompter`: 用户交互
    ///
    /// # 返回
    /// 返回最终状态，所有错误都记录在 `error` 中
    pub async fn run(&self, request: ResearchRequest, prompter: &mut dyn Prompter) -> WorkflowState {
        let topic = self.resolve_topic(request.topic, prompter);
        log_startup(&topic, &self.model_name);

        let mut initial = WorkflowState::new(topic)
            .with_max_results(request.max_results.unwrap_or(self.config.max_results));
        initial.search_source = request.source;
        initial.paper_index = request.paper_index;

        Runner::new(&self.workflow, prompter).run(initial).await
    }

    /// 主题为空时询问用户，仍为空则使用默认主题
    fn resolve_topic(&self, topic: Option<String>, prompter: &mut dyn Prompter) -> String {
        if let Some(topic) = topic.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            return topic;
        }

        let default_topic = self.config.default_topic.clone();
        if !prompter.is_interactive() {
            return default_topic;
        }

        let prompt = format!("{} (default: {})", TOPIC_QUESTION, default_topic);
        match prompter.ask(&prompt, &[]) {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => default_topic,
            Err(e) => {
                warn!("⚠️ 读取主题失败，使用默认主题: {}", e);
                default_topic
            }
        }
    }

    /// 保存博客文章
    ///
    /// 没有博客内容时不写文件，返回 `None`
    pub fn save_blog(&self, state: &WorkflowState) -> Result<Option<PathBuf>> {
        if state.blog_post.trim().is_empty() {
            warn!("⚠️ 没有可保存的博客文章");
            return Ok(None);
        }

        let index = state
            .selected_paper
            .as_ref()
            .and_then(|selected| state.papers.iter().position(|p| p == selected))
            .unwrap_or(0);
        let path = self
            .writer
            .write(&state.topic, index as i64, &state.blog_post)
            .context("保存博客文章失败")?;
        info!("💾 博客已保存: {}", path.display());
        Ok(Some(path))
    }
}

/// 根据配置创建 arXiv 与 Google Scholar 搜索来源
pub fn default_registry(config: &Config) -> Result<SearchRegistry, ConfigError> {
    let arxiv = ArxivSearch::new(ArxivClient::new(config)?, config.arxiv_recent_since_year);
    let scholar = ScholarSearch::new(ScholarClient::new(config)?, config.scholar_placeholder_fallback);

    Ok(SearchRegistry::new()
        .with_provider(SearchSource::Arxiv, Arc::new(arxiv))
        .with_provider(SearchSource::GoogleScholar, Arc::new(scholar)))
}
