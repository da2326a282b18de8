//! 集成测试：用桩实现的搜索来源和 LLM 跑完整流程

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use research_assistant::clients::{LanguageModel, ScholarBackend};
use research_assistant::error::{LlmError, SearchError};
use research_assistant::models::{PaperRecord, SearchSource, WorkflowState};
use research_assistant::orchestrator::{
    App, NonInteractivePrompter, ResearchRequest, Runner, ScriptedPrompter,
};
use research_assistant::services::{ScholarSearch, SearchProvider, SearchRegistry};
use research_assistant::workflow::build_research_workflow;
use research_assistant::Config;

const STUB_ANALYSIS: &str = "STUB_ANALYSIS";

/// 返回固定文本，并记录收到的提示词
struct StubModel {
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(STUB_ANALYSIS.to_string())
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

/// 返回三篇固定论文
struct StubSearch {
    topics: Mutex<Vec<String>>,
}

impl StubSearch {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            topics: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<PaperRecord>, SearchError> {
        self.topics.lock().unwrap().push(topic.to_string());
        Ok(["Score-based diffusion", "Latent diffusion models", "Consistency models"]
            .iter()
            .enumerate()
            .take(max_results)
            .map(|(i, title)| PaperRecord {
                id: format!("2501.0000{}", i),
                title: title.to_string(),
                authors: vec![format!("Author {}", i)],
                abstract_text: format!("Abstract {}", i),
                published_date: format!("2025-01-0{}T00:00:00Z", i + 1),
                url: format!("http://arxiv.org/pdf/2501.0000{}", i),
                ..Default::default()
            })
            .collect())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

struct EmptyScholar;

#[async_trait]
impl ScholarBackend for EmptyScholar {
    async fn fetch_raw(&self, _query: &str, _max_results: usize) -> Result<Vec<Value>, SearchError> {
        Ok(vec![json!({ "bib": {} })])
    }
}

fn registry(search: Arc<StubSearch>) -> SearchRegistry {
    SearchRegistry::new()
        .with_provider(SearchSource::Arxiv, search)
        .with_provider(
            SearchSource::GoogleScholar,
            Arc::new(ScholarSearch::new(EmptyScholar, true)),
        )
}

#[tokio::test]
async fn test_full_run_with_stub_model() {
    let search = StubSearch::new();
    let model = StubModel::new();
    let workflow = build_research_workflow(registry(search.clone()), Some(model.clone())).unwrap();

    let initial = WorkflowState::new("diffusion models")
        .with_search_source(SearchSource::Arxiv)
        .with_paper_index(1);
    let state = workflow.run(initial).await;

    assert_eq!(state.papers.len(), 3);
    let selected = state.selected_paper.as_ref().expect("selected paper");
    assert_eq!(selected, &state.papers[1]);
    assert_eq!(selected.title, "Latent diffusion models");
    assert_eq!(state.analysis, STUB_ANALYSIS);
    assert_eq!(state.blog_post, STUB_ANALYSIS);
    assert!(state.error.is_none(), "unexpected error: {:?}", state.error);
    assert!(state.interrupt.is_none());

    assert_eq!(*search.topics.lock().unwrap(), vec!["diffusion models"]);
    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Latent diffusion models"));
    assert!(prompts[1].contains("http://arxiv.org/pdf/2501.00001"));
    assert!(prompts[1].contains(STUB_ANALYSIS));
}

#[tokio::test]
async fn test_source_interrupt_resumes_with_answer() {
    let workflow = build_research_workflow(registry(StubSearch::new()), Some(StubModel::new())).unwrap();
    let mut prompter = ScriptedPrompter::new(["arxiv", "2"]);

    let state = Runner::new(&workflow, &mut prompter)
        .run(WorkflowState::new("diffusion models"))
        .await;

    assert_eq!(state.search_source, Some(SearchSource::Arxiv));
    assert_eq!(state.search_source_raw_input.as_deref(), Some("arxiv"));
    assert_eq!(state.paper_index, Some(2));
    assert_eq!(
        state.selected_paper.map(|p| p.title).as_deref(),
        Some("Consistency models")
    );
    assert!(state.interrupt.is_none());
    assert!(state.error.is_none());
    assert_eq!(prompter.asked.len(), 2);
}

#[tokio::test]
async fn test_preselected_paper_skips_search() {
    let search = StubSearch::new();
    let workflow = build_research_workflow(registry(search.clone()), Some(StubModel::new())).unwrap();
    let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

    let paper = PaperRecord {
        id: "given".to_string(),
        title: "A given paper".to_string(),
        ..Default::default()
    };
    let state = Runner::new(&workflow, &mut prompter)
        .run(WorkflowState::new("anything").with_selected_paper(paper.clone()))
        .await;

    assert_eq!(state.papers, vec![paper]);
    assert_eq!(state.analysis, STUB_ANALYSIS);
    assert_eq!(state.blog_post, STUB_ANALYSIS);
    assert!(search.topics.lock().unwrap().is_empty());
    assert!(prompter.asked.is_empty());
}

#[tokio::test]
async fn test_invalid_source_reports_error() {
    let workflow = build_research_workflow(registry(StubSearch::new()), Some(StubModel::new())).unwrap();
    let state = workflow
        .run(WorkflowState::new("diffusion models").with_search_source("invalid".parse().unwrap()))
        .await;

    assert!(state.papers.is_empty());
    assert!(state.selected_paper.is_none());
    let error = state.error.expect("error");
    assert!(error.contains("Invalid search source: invalid"));
    assert!(error.contains("No papers found"));
}

#[tokio::test]
async fn test_scholar_without_records_uses_placeholders() {
    let workflow = build_research_workflow(registry(StubSearch::new()), Some(StubModel::new())).unwrap();
    let state = workflow
        .run(WorkflowState::new("obscure topic").with_search_source(SearchSource::GoogleScholar))
        .await;

    assert!(!state.papers.is_empty());
    assert!(state.papers.iter().all(|p| p.id.starts_with("placeholder_")));
    assert!(state.selected_paper.expect("selected").is_placeholder());
}

#[tokio::test]
async fn test_app_run_and_save() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config {
        output_dir: tmp.path().display().to_string(),
        ..Config::default()
    };
    let app = App::with_components(config, registry(StubSearch::new()), Some(StubModel::new())).unwrap();

    let request = ResearchRequest {
        topic: Some("diffusion models".to_string()),
        source: Some(SearchSource::Arxiv),
        paper_index: Some(1),
        max_results: Some(3),
    };
    let state = app.run(request, &mut NonInteractivePrompter).await;
    assert!(state.error.is_none());

    let path = app.save_blog(&state).unwrap().expect("saved");
    assert_eq!(path, tmp.path().join("blog_diffusion_models_1.md"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), STUB_ANALYSIS);
}

#[tokio::test]
async fn test_final_state_json_parses() {
    let workflow = build_research_workflow(registry(StubSearch::new()), Some(StubModel::new())).unwrap();
    let state = workflow
        .run(WorkflowState::new("machine learning").with_search_source("bogus".parse().unwrap()))
        .await;

    let rendered = serde_json::to_string_pretty(&state).unwrap();
    let parsed: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["topic"], "machine learning");
    assert_eq!(parsed["papers"], json!([]));
    assert!(parsed["error"].as_str().unwrap().contains("Invalid search source: bogus"));
}
