//! arXiv 搜索服务 - 业务能力层
//!
//! 流程：
//! 1. 多取一些结果（`max(2 × max_results, 10)`，不超过 arXiv 单次上限）
//! 2. 先查近期论文，没有结果再去掉日期条件重查
//! 3. 按主题相关度排序并截断

use async_trait::async_trait;
use tracing::{debug, info};

use crate::clients::{ArxivBackend, ArxivClient};
use crate::error::SearchError;
use crate::models::PaperRecord;
use crate::services::ranking::RelevanceRanker;
use crate::services::search_service::SearchProvider;

/// 最少查询数量
const MIN_FETCH: usize = 10;

/// arXiv API 单次请求的最大结果数
const MAX_FETCH: usize = 2000;

/// arXiv 搜索服务
pub struct ArxivSearch<B: ArxivBackend> {
    backend: B,
    since_year: Option<i32>,
}

impl<B: ArxivBackend> ArxivSearch<B> {
    /// 创建 arXiv 搜索服务
    ///
    /// # 参数
    /// - `backend`: arXiv 查询实现
    /// - `since_year`: 近期论文的起始年份，为空时直接查询全部
    pub fn new(backend: B, since_year: Option<i32>) -> Self {
        Self { backend, since_year }
    }

    fn fetch_size(max_results: usize) -> usize {
        max_results.saturating_mul(2).clamp(MIN_FETCH, MAX_FETCH)
    }
}

#[async_trait]
impl<B: ArxivBackend> SearchProvider for ArxivSearch<B> {
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<PaperRecord>, SearchError> {
        let fetch = Self::fetch_size(max_results);
        let ranker = RelevanceRanker::new(topic);
        debug!("arXiv 关键词: {:?}", ranker.terms());

        let mut papers = Vec::new();
        if let Some(year) = self.since_year {
            let query = ArxivClient::build_search_query(topic, Some(year));
            papers = self.backend.query(&query, fetch).await?;
            if papers.is_empty() {
                info!("🔁 {} 年之后没有相关论文，改为不限日期搜索", year);
            }
        }

        if papers.is_empty() {
            let query = ArxivClient::build_search_query(topic, None);
            papers = self.backend.query(&query, fetch).await?;
        }

        Ok(ranker.rank(papers, max_results))
    }

    fn name(&self) -> &str {
        "arxiv"
    }
}
