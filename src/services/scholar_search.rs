//! Google Scholar 搜索服务 - 业务能力层
//!
//! 把结构不可信的原始记录逐字段标准化为 [`PaperRecord`]；
//! 完全没有可用结果时返回一组固定的占位论文

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clients::ScholarBackend;
use crate::error::SearchError;
use crate::models::{PaperRecord, RecordOrigin};
use crate::services::search_service::SearchProvider;

pub const DEFAULT_TITLE: &str = "No Title Available";
pub const DEFAULT_SUMMARY: &str = "No Summary Available";
const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// 占位论文：(id 后缀, 标题, 摘要)
const PLACEHOLDERS: &[(&str, &str, &str)] = &[
    (
        "gs_1",
        "Placeholder result 1 (Google Scholar returned no usable records)",
        "Google Scholar did not return any results for this query. Try another source or refine the topic.",
    ),
    (
        "gs_2",
        "Placeholder result 2 (Google Scholar returned no usable records)",
        "Google Scholar may be rate limiting automated requests. Try again later.",
    ),
    (
        "gs_3",
        "Placeholder result 3 (Google Scholar returned no usable records)",
        "This record is a stand-in so the workflow can continue.",
    ),
];

/// Google Scholar 搜索服务
pub struct ScholarSearch<B: ScholarBackend> {
    backend: B,
    placeholder_fallback: bool,
}

impl<B: ScholarBackend> ScholarSearch<B> {
    /// 创建 Google Scholar 搜索服务
    ///
    /// # 参数
    /// - `backend`: 原始结果获取实现
    /// - `placeholder_fallback`: 没有可用结果时是否返回占位论文
    pub fn new(backend: B, placeholder_fallback: bool) -> Self {
        Self {
            backend,
            placeholder_fallback,
        }
    }
}

#[async_trait]
impl<B: ScholarBackend> SearchProvider for ScholarSearch<B> {
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<PaperRecord>, SearchError> {
        info!("🔍 Google Scholar 搜索: {}", topic);
        let raw = self.backend.fetch_raw(topic, max_results).await?;
        debug!("Google Scholar 原始结果 {} 条", raw.len());

        let papers: Vec<PaperRecord> = raw
            .iter()
            .filter_map(normalize_result)
            .take(max_results)
            .collect();

        if papers.is_empty() && self.placeholder_fallback {
            warn!("⚠️ Google Scholar 没有可用结果，返回占位论文");
            return Ok(placeholder_papers().into_iter().take(max_results.max(1)).collect());
        }

        info!("✓ Google Scholar 标准化后 {} 篇论文", papers.len());
        Ok(papers)
    }

    fn name(&self) -> &str {
        "google_scholar"
    }
}

/// 固定的占位论文
pub fn placeholder_papers() -> Vec<PaperRecord> {
    PLACEHOLDERS
        .iter()
        .map(|(suffix, title, summary)| PaperRecord {
            abstract_text: summary.to_string(),
            ..PaperRecord::placeholder(suffix, *title)
        })
        .collect()
}

/// 标准化一条原始记录
///
/// 每个字段独立提取，失败时取默认值；标题、id、链接全部缺失时丢弃该记录
pub fn normalize_result(raw: &Value) -> Option<PaperRecord> {
    let bib = raw.get("bib");
    let bib_str = |key: &str| {
        bib.and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let top_str = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let raw_title = bib_str("title");
    let raw_id = top_str("gs_id");
    let cid = top_str("cid");
    let url = top_str("eprint_url").or_else(|| top_str("pub_url"));

    if raw_title.is_none() && raw_id.is_none() && cid.is_none() && url.is_none() {
        debug!("丢弃无法识别的 Google Scholar 记录: {}", raw);
        return None;
    }

    let title = raw_title.unwrap_or(DEFAULT_TITLE).to_string();
    let id = match (raw_id, cid) {
        (Some(id), _) => id.to_string(),
        (None, Some(cid)) => format!("gs_{}", cid),
        (None, None) => format!("gs_{}", title.chars().take(20).collect::<String>()),
    };

    Some(PaperRecord {
        id,
        title,
        authors: extract_authors(bib.and_then(|b| b.get("author"))),
        abstract_text: bib_str("abstract").unwrap_or(DEFAULT_SUMMARY).to_string(),
        published_date: extract_year(bib.and_then(|b| b.get("pub_year")))
            .map(|year| format!("{}-01-01T00:00:00Z", year))
            .unwrap_or_default(),
        url: url.unwrap_or_default().to_string(),
        origin: RecordOrigin::Retrieved,
    })
}

/// 作者可能是字符串列表、带 `name` 的对象列表或单个字符串
fn extract_authors(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => Some(
                    obj.get("name")
                        .and_then(Value::as_str)
                        .unwrap_or(UNKNOWN_AUTHOR)
                        .trim()
                        .to_string(),
                ),
                _ => None,
            })
            .filter(|a| !a.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn extract_year(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>().ok().map(|_| s.to_string())
        }
        Value::Number(n) => n.as_u64().map(|y| y.to_string()),
        _ => None,
    }
}
