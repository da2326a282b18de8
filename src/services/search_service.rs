//! 论文搜索服务 - 业务能力层
//!
//! 定义搜索来源的统一接口，以及按来源查找具体实现的注册表

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::SearchError;
use crate::models::{PaperRecord, SearchSource};

/// 论文搜索来源
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 按主题搜索论文，最多返回 `max_results` 篇
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<PaperRecord>, SearchError>;

    /// 来源名称（仅用于日志）
    fn name(&self) -> &str;
}

/// 搜索来源注册表
#[derive(Clone, Default)]
pub struct SearchRegistry {
    providers: HashMap<SearchSource, Arc<dyn SearchProvider>>,
}

impl SearchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册搜索来源，已存在的同名来源会被替换
    pub fn register(&mut self, source: SearchSource, provider: Arc<dyn SearchProvider>) {
        debug!("注册搜索来源: {} -> {}", source, provider.name());
        self.providers.insert(source, provider);
    }

    pub fn with_provider(mut self, source: SearchSource, provider: Arc<dyn SearchProvider>) -> Self {
        self.register(source, provider);
        self
    }

    /// 查找搜索来源
    pub fn get(&self, source: &SearchSource) -> Option<Arc<dyn SearchProvider>> {
        self.providers.get(source).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl SearchProvider for Fixed {
        async fn search(&self, topic: &str, _max_results: usize) -> Result<Vec<PaperRecord>, SearchError> {
            Ok(vec![PaperRecord {
                title: topic.to_string(),
                ..Default::default()
            }])
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SearchRegistry::new().with_provider(SearchSource::Arxiv, Arc::new(Fixed));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&SearchSource::GoogleScholar).is_none());

        let provider = registry.get(&SearchSource::Arxiv).expect("provider");
        let papers = tokio_test::block_on(provider.search("gnn", 1)).unwrap();
        assert_eq!(papers[0].title, "gnn");
    }

    #[test]
    fn test_register_replaces_existing_source() {
        let mut registry = SearchRegistry::new();
        registry.register(SearchSource::Arxiv, Arc::new(Fixed));
        registry.register(SearchSource::Arxiv, Arc::new(Fixed));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
