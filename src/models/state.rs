//! 工作流状态
//!
//! 整个流程只有一个状态对象，每个步骤返回 [`StateUpdate`]（只包含它修改过的字段），
//! 由工作流引擎合并回状态

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::models::paper::PaperRecord;

/// 错误信息拼接分隔符
pub const ERROR_SEPARATOR: &str = "; ";

/// 默认搜索结果数量
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// 搜索来源
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    /// arXiv（主来源）
    Arxiv,
    /// Google Scholar（次来源）
    GoogleScholar,
    /// 无法识别的原始取值，由搜索步骤报告为错误
    Other(String),
}

impl SearchSource {
    pub const ARXIV: &'static str = "arxiv";
    pub const GOOGLE_SCHOLAR: &'static str = "google_scholar";

    /// 来源标识
    pub fn as_str(&self) -> &str {
        match self {
            SearchSource::Arxiv => Self::ARXIV,
            SearchSource::GoogleScholar => Self::GOOGLE_SCHOLAR,
            SearchSource::Other(raw) => raw,
        }
    }

    /// 解析用户输入，只接受已知来源
    ///
    /// 除了来源名，也接受选项序号（1 = arxiv，2 = google_scholar）
    pub fn parse_known(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "arxiv" | "1" => Some(SearchSource::Arxiv),
            "google_scholar" | "scholar" | "2" => Some(SearchSource::GoogleScholar),
            _ => None,
        }
    }

    /// 是否为已知来源
    pub fn is_known(&self) -> bool {
        !matches!(self, SearchSource::Other(_))
    }

    /// 可供用户选择的来源
    pub fn choices() -> Vec<String> {
        vec![Self::ARXIV.to_string(), Self::GOOGLE_SCHOLAR.to_string()]
    }
}

impl FromStr for SearchSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_known(s).unwrap_or_else(|| SearchSource::Other(s.trim().to_string())))
    }
}

impl Display for SearchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 回答需要写回的状态字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKey {
    Topic,
    SearchSourceRawInput,
    PaperIndex,
}

impl StateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Topic => "topic",
            StateKey::SearchSourceRawInput => "search_source_raw_input",
            StateKey::PaperIndex => "paper_index",
        }
    }
}

/// 中断类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptAction {
    /// 暂停并向用户提问
    AskUser,
}

/// 问题详情
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetails {
    /// 问题文本
    pub prompt: String,
    /// 建议的回答
    pub suggestions: Vec<String>,
    /// 回答写回的字段
    pub answer_key: StateKey,
}

/// 中断信号
///
/// `interrupt_action` 与 `question_details` 总是同时出现、同时清除，
/// 因此合并为一个值保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interrupt {
    pub action: InterruptAction,
    pub details: QuestionDetails,
}

impl Interrupt {
    /// 创建提问中断
    pub fn ask(prompt: impl Into<String>, suggestions: Vec<String>, answer_key: StateKey) -> Self {
        Self {
            action: InterruptAction::AskUser,
            details: QuestionDetails {
                prompt: prompt.into(),
                suggestions,
                answer_key,
            },
        }
    }
}

/// 工作流状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub topic: String,
    pub search_source: Option<SearchSource>,
    pub search_source_raw_input: Option<String>,
    pub max_results: usize,
    pub papers: Vec<PaperRecord>,
    pub paper_index: Option<i64>,
    pub selected_paper: Option<PaperRecord>,
    pub analysis: String,
    pub blog_post: String,
    pub error: Option<String>,
    pub interrupt: Option<Interrupt>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            topic: String::new(),
            search_source: None,
            search_source_raw_input: None,
            max_results: DEFAULT_MAX_RESULTS,
            papers: Vec::new(),
            paper_index: None,
            selected_paper: None,
            analysis: String::new(),
            blog_post: String::new(),
            error: None,
            interrupt: None,
        }
    }
}

impl WorkflowState {
    /// 以研究主题创建初始状态
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn with_search_source(mut self, source: SearchSource) -> Self {
        self.search_source = Some(source);
        self
    }

    pub fn with_paper_index(mut self, index: i64) -> Self {
        self.paper_index = Some(index);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_selected_paper(mut self, paper: PaperRecord) -> Self {
        self.selected_paper = Some(paper);
        self
    }

    /// 当前的中断类型
    pub fn interrupt_action(&self) -> Option<InterruptAction> {
        self.interrupt.as_ref().map(|i| i.action)
    }

    /// 当前的问题详情
    pub fn question_details(&self) -> Option<&QuestionDetails> {
        self.interrupt.as_ref().map(|i| &i.details)
    }

    /// 合并步骤返回的部分更新
    ///
    /// 每个字段后写覆盖先写；`error` 只追加，不覆盖
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(topic) = update.topic {
            self.topic = topic;
        }
        if let Some(source) = update.search_source {
            self.search_source = Some(source);
        }
        if let Some(raw) = update.search_source_raw_input {
            self.search_source_raw_input = Some(raw);
        }
        if let Some(max_results) = update.max_results {
            self.max_results = max_results;
        }
        if let Some(papers) = update.papers {
            self.papers = papers;
        }
        if let Some(index) = update.paper_index {
            self.paper_index = Some(index);
        }
        if let Some(selected) = update.selected_paper {
            self.selected_paper = selected;
        }
        if let Some(analysis) = update.analysis {
            self.analysis = analysis;
        }
        if let Some(blog_post) = update.blog_post {
            self.blog_post = blog_post;
        }
        if let Some(interrupt) = update.interrupt {
            self.interrupt = interrupt;
        }
        if let Some(message) = update.error {
            self.append_error(message);
        }
    }

    /// 追加错误信息
    pub fn append_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            return;
        }
        self.error = Some(match self.error.take() {
            Some(existing) if !existing.is_empty() => {
                format!("{}{}{}", existing, ERROR_SEPARATOR, message)
            }
            _ => message,
        });
    }
}

/// 步骤返回的部分状态更新
///
/// `None` 表示该字段未被修改；可清空字段使用 `Option<Option<_>>`，
/// 其中 `Some(None)` 表示清空
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub topic: Option<String>,
    pub search_source: Option<SearchSource>,
    pub search_source_raw_input: Option<String>,
    pub max_results: Option<usize>,
    pub papers: Option<Vec<PaperRecord>>,
    pub paper_index: Option<i64>,
    pub selected_paper: Option<Option<PaperRecord>>,
    pub analysis: Option<String>,
    pub blog_post: Option<String>,
    pub error: Option<String>,
    pub interrupt: Option<Option<Interrupt>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否没有修改任何字段
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn search_source(mut self, source: SearchSource) -> Self {
        self.search_source = Some(source);
        self
    }

    pub fn papers(mut self, papers: Vec<PaperRecord>) -> Self {
        self.papers = Some(papers);
        self
    }

    pub fn paper_index(mut self, index: i64) -> Self {
        self.paper_index = Some(index);
        self
    }

    pub fn selected_paper(mut self, paper: Option<PaperRecord>) -> Self {
        self.selected_paper = Some(paper);
        self
    }

    pub fn analysis(mut self, analysis: impl Into<String>) -> Self {
        self.analysis = Some(analysis.into());
        self
    }

    pub fn blog_post(mut self, blog_post: impl Into<String>) -> Self {
        self.blog_post = Some(blog_post.into());
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(Some(interrupt));
        self
    }

    pub fn clear_interrupt(mut self) -> Self {
        self.interrupt = Some(None);
        self
    }

    /// 本次更新是否发起了中断
    pub fn raised_interrupt(&self) -> Option<&Interrupt> {
        match &self.interrupt {
            Some(Some(interrupt)) => Some(interrupt),
            _ => None,
        }
    }

    /// 把用户回答写入指定字段
    ///
    /// `paper_index` 无法解析为整数时不修改该字段，只追加错误
    pub fn answer(key: StateKey, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut update = Self::default();
        match key {
            StateKey::Topic => update.topic = Some(raw.trim().to_string()),
            StateKey::SearchSourceRawInput => update.search_source_raw_input = Some(raw),
            StateKey::PaperIndex => match raw.trim().parse::<i64>() {
                Ok(index) => update.paper_index = Some(index),
                Err(_) => update.error = Some(format!("Invalid paper index input: '{}'", raw.trim())),
            },
        }
        update
    }
}
