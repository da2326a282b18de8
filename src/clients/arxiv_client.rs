/// arXiv API 客户端
///
/// 封装 arXiv Atom 查询接口的调用与解析
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{ConfigError, SearchError};
use crate::models::PaperRecord;

/// arXiv 查询能力
///
/// 输入已经拼好的 `search_query`，返回按提交时间倒序的结果
#[async_trait]
pub trait ArxivBackend: Send + Sync {
    async fn query(&self, search_query: &str, max_results: usize) -> Result<Vec<PaperRecord>, SearchError>;
}

/// arXiv API 客户端
#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base_url: String,
}

impl ArxivClient {
    /// 创建新的 arXiv 客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .user_agent(concat!("research-assistant/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.arxiv_api_base_url.clone(),
        })
    }

    /// 构建 arXiv 查询语句
    ///
    /// 每个词都要求出现（`all:` 前缀并以 AND 连接），
    /// 指定 `since_year` 时只查询该年之后提交的论文
    pub fn build_search_query(topic: &str, since_year: Option<i32>) -> String {
        let terms: Vec<String> = topic
            .split_whitespace()
            .map(|t| format!("all:{}", t))
            .collect();
        let mut query = if terms.is_empty() {
            "all:*".to_string()
        } else {
            terms.join(" AND ")
        };

        if let Some(year) = since_year {
            query.push_str(&format!(" AND submittedDate:[{}01010000 TO 209912312359]", year));
        }
        query
    }
}

#[async_trait]
impl ArxivBackend for ArxivClient {
    async fn query(&self, search_query: &str, max_results: usize) -> Result<Vec<PaperRecord>, SearchError> {
        debug!("arXiv 查询: {} (max_results={})", search_query, max_results);

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("search_query", search_query)])
            .query(&[("start", 0), ("max_results", max_results)])
            .query(&[("sortBy", "submittedDate"), ("sortOrder", "descending")])
            .header(ACCEPT, "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8")
            .send()
            .await
            .map_err(|e| SearchError::request_failed(&self.base_url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::BadStatus {
                endpoint: self.base_url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp
            .text()
            .await
            .map_err(|e| SearchError::request_failed(&self.base_url, e))?;

        if !(content_type.contains("xml") || content_type.contains("atom")) {
            return Err(SearchError::UnexpectedContent {
                endpoint: self.base_url.clone(),
                content_type,
                preview: crate::utils::truncate_text(body.trim(), 200),
            });
        }

        parse_atom_feed(&body)
    }
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
    #[serde(rename = "@title", default)]
    title: Option<String>,
    #[serde(rename = "@type", default)]
    link_type: Option<String>,
}

/// 解析 arXiv Atom feed
///
/// arXiv 查询出错时会返回一个 id 指向 `/api/errors` 的条目，这类条目会被丢弃
pub fn parse_atom_feed(xml: &str) -> Result<Vec<PaperRecord>, SearchError> {
    let feed: AtomFeed = quick_xml::de::from_str(xml).map_err(SearchError::FeedParseFailed)?;

    let papers = feed
        .entries
        .into_iter()
        .filter(|entry| !entry.id.contains("/api/errors"))
        .map(|entry| {
            let pdf_url = entry
                .links
                .iter()
                .find(|l| {
                    l.title.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("pdf"))
                        || l.link_type.as_deref().is_some_and(|t| t.contains("pdf"))
                })
                .map(|l| l.href.clone());
            let html_url = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref() == Some("alternate"))
                .map(|l| l.href.clone());

            let id = entry.id.trim();
            let short_id = id.rsplit("/abs/").next().unwrap_or(id).to_string();

            PaperRecord {
                url: pdf_url.or(html_url).unwrap_or_else(|| id.to_string()),
                id: short_id,
                title: collapse_whitespace(&entry.title),
                authors: entry
                    .authors
                    .into_iter()
                    .map(|a| collapse_whitespace(&a.name))
                    .filter(|a| !a.is_empty())
                    .collect(),
                abstract_text: collapse_whitespace(&entry.summary),
                published_date: entry.published.trim().to_string(),
                ..Default::default()
            }
        })
        .collect();

    Ok(papers)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:diffusion</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2501.01234v1</id>
    <updated>2025-01-15T12:00:00Z</updated>
    <published>2025-01-14T09:00:00Z</published>
    <title>Diffusion Models
      for Protein Design</title>
    <summary>  We study diffusion models.
    </summary>
    <author><name>Doe, J.</name></author>
    <author><name>Smith, A.</name></author>
    <link href="http://arxiv.org/abs/2501.01234v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2501.01234v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2501.04321v2</id>
    <published>2025-01-10T09:00:00Z</published>
    <title>Second Paper</title>
    <summary>Abstract two.</summary>
    <author><name>Lee, K.</name></author>
    <link href="http://arxiv.org/abs/2501.04321v2" rel="alternate" type="text/html"/>
  </entry>
</feed>
"#;

    #[test]
    fn test_parse_atom_feed() {
        let papers = parse_atom_feed(SAMPLE).expect("parse");
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "2501.01234v1");
        assert_eq!(first.title, "Diffusion Models for Protein Design");
        assert_eq!(first.authors, vec!["Doe, J.", "Smith, A."]);
        assert_eq!(first.abstract_text, "We study diffusion models.");
        assert_eq!(first.published_date, "2025-01-14T09:00:00Z");
        assert_eq!(first.url, "http://arxiv.org/pdf/2501.01234v1");

        assert_eq!(papers[1].url, "http://arxiv.org/abs/2501.04321v2");
    }

    #[test]
    fn test_parse_empty_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_atom_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_error_entries_are_dropped() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format</id>
    <title>Error</title>
    <summary>incorrect id format</summary>
  </entry>
</feed>"#;
        assert!(parse_atom_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_build_search_query() {
        assert_eq!(
            ArxivClient::build_search_query("diffusion models", None),
            "all:diffusion AND all:models"
        );
        assert_eq!(
            ArxivClient::build_search_query("gan", Some(2025)),
            "all:gan AND submittedDate:[202501010000 TO 209912312359]"
        );
    }

    #[tokio::test]
    #[ignore] // 需要网络
    async fn test_arxiv_live_query() {
        let client = ArxivClient::new(&Config::default()).unwrap();
        let query = ArxivClient::build_search_query("machine learning", None);
        let papers = client.query(&query, 2).await.unwrap();
        assert!(!papers.is_empty());
    }
}
