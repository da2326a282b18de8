/// Google Scholar 客户端
///
/// Google Scholar 没有公开 API，这里抓取搜索结果页并用正则提取字段，
/// 输出结构松散的原始记录（`bib.title`、`bib.author`、`pub_url` 等），
/// 字段是否存在、类型是否正确都由上层的标准化逻辑负责判断
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ConfigError, SearchError};

/// Google Scholar 原始结果获取能力
#[async_trait]
pub trait ScholarBackend: Send + Sync {
    async fn fetch_raw(&self, query: &str, max_results: usize) -> Result<Vec<Value>, SearchError>;
}

/// 结果页解析用到的正则
pub struct ScholarPatterns {
    cid: Regex,
    title_block: Regex,
    link: Regex,
    byline: Regex,
    snippet: Regex,
    eprint: Regex,
    year: Regex,
    tag: Regex,
}

impl ScholarPatterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            cid: Regex::new(r#"data-cid="([^"]+)""#)?,
            title_block: Regex::new(r#"(?s)<h3 class="gs_rt"[^>]*>(.*?)</h3>"#)?,
            link: Regex::new(r#"(?s)<a[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#)?,
            byline: Regex::new(r#"(?s)<div class="gs_a"[^>]*>(.*?)</div>"#)?,
            snippet: Regex::new(r#"(?s)<div class="gs_rs"[^>]*>(.*?)</div>"#)?,
            eprint: Regex::new(r#"(?s)<div class="gs_or_ggsm"[^>]*>.*?<a[^>]*href="([^"]+)""#)?,
            year: Regex::new(r"\b(19|20)\d{2}\b")?,
            tag: Regex::new(r"<[^>]+>")?,
        })
    }

    /// 去掉 HTML 标签并解码常见实体
    fn plain_text(&self, html: &str) -> String {
        let stripped = self.tag.replace_all(html, "");
        let decoded = stripped
            .replace("&nbsp;", " ")
            .replace('\u{a0}', " ")
            .replace("&hellip;", "…")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&");
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// 结果条目的起始标记
const RESULT_MARKER: &str = r#"class="gs_r gs_or gs_scl""#;

/// 解析 Google Scholar 结果页
///
/// 每个结果生成一个原始记录，提取不到的字段直接省略
pub fn parse_results_page(html: &str, patterns: &ScholarPatterns) -> Vec<Value> {
    html.split(RESULT_MARKER)
        .skip(1)
        .map(|block| parse_result_block(block, patterns))
        .collect()
}

fn parse_result_block(block: &str, patterns: &ScholarPatterns) -> Value {
    let mut bib = Map::new();
    let mut record = Map::new();

    if let Some(cid) = patterns.cid.captures(block).and_then(|c| c.get(1)) {
        record.insert("cid".into(), json!(cid.as_str()));
    }

    if let Some(title_html) = patterns.title_block.captures(block).and_then(|c| c.get(1)) {
        let title_html = title_html.as_str();
        if let Some(link) = patterns.link.captures(title_html) {
            if let Some(href) = link.get(1) {
                record.insert("pub_url".into(), json!(href.as_str().replace("&amp;", "&")));
            }
            if let Some(text) = link.get(2) {
                bib.insert("title".into(), json!(patterns.plain_text(text.as_str())));
            }
        } else {
            // 没有链接的条目（[CITATION] 等），标题前带有方括号标记
            let text = patterns.plain_text(title_html);
            let text = match text.strip_prefix('[') {
                Some(rest) => rest.split_once(']').map(|(_, t)| t.trim().to_string()).unwrap_or(text.clone()),
                None => text,
            };
            if !text.is_empty() {
                bib.insert("title".into(), json!(text));
            }
        }
    }

    if let Some(byline) = patterns.byline.captures(block).and_then(|c| c.get(1)) {
        let byline = patterns.plain_text(byline.as_str());
        let (author_part, rest) = byline.split_once(" - ").unwrap_or((byline.as_str(), ""));
        let authors: Vec<String> = author_part
            .split(',')
            .map(|a| a.trim().trim_end_matches('…').trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if !authors.is_empty() {
            bib.insert("author".into(), json!(authors));
        }
        if let Some(year) = patterns.year.find_iter(rest).last() {
            bib.insert("pub_year".into(), json!(year.as_str()));
        }
    }

    if let Some(snippet) = patterns.snippet.captures(block).and_then(|c| c.get(1)) {
        bib.insert("abstract".into(), json!(patterns.plain_text(snippet.as_str())));
    }

    if let Some(eprint) = patterns.eprint.captures(block).and_then(|c| c.get(1)) {
        record.insert("eprint_url".into(), json!(eprint.as_str().replace("&amp;", "&")));
    }

    record.insert("bib".into(), Value::Object(bib));
    Value::Object(record)
}

/// Google Scholar 客户端
pub struct ScholarClient {
    http: Client,
    base_url: String,
    patterns: ScholarPatterns,
}

impl ScholarClient {
    /// 创建新的 Google Scholar 客户端
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36")
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.scholar_base_url.clone(),
            patterns: ScholarPatterns::new().map_err(ConfigError::InvalidPattern)?,
        })
    }
}

#[async_trait]
impl ScholarBackend for ScholarClient {
    async fn fetch_raw(&self, query: &str, max_results: usize) -> Result<Vec<Value>, SearchError> {
        debug!("Google Scholar 查询: {} (max_results={})", query, max_results);

        let num = max_results.clamp(1, 20).to_string();
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("q", query), ("hl", "en"), ("num", num.as_str())])
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

        let html = resp
            .text()
            .await
            .map_err(|e| SearchError::request_failed(&self.base_url, e))?;

        if html.contains("gs_captcha") || html.contains("unusual traffic") {
            warn!("⚠️ Google Scholar 要求人机验证，本次搜索没有结果");
            return Err(SearchError::Backend(
                "Google Scholar rejected the request (captcha)".to_string(),
            ));
        }

        let mut records = parse_results_page(&html, &self.patterns);
        records.truncate(max_results);
        debug!("Google Scholar 解析到 {} 条原始结果", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
<div id="gs_res_ccl_mid">
<div class="gs_r gs_or gs_scl" data-cid="AbC123" data-did="AbC123" data-lid="" data-aid="AbC123" data-rp="0">
  <div class="gs_or_ggsm"><a href="https://arxiv.org/pdf/2006.11239" data-clk="x"><span class="gs_ctg2">[PDF]</span> arxiv.org</a></div>
  <div class="gs_ri">
    <h3 class="gs_rt" ontouchstart="gs_evt_dsp(event)"><a id="AbC123" href="https://proceedings.neurips.cc/paper/2020/hash/4c5b.html" data-clk="y">Denoising <b>diffusion</b> probabilistic models</a></h3>
    <div class="gs_a">J Ho, A Jain, P Abbeel - Advances in neural information processing systems, 2020 - proceedings.neurips.cc</div>
    <div class="gs_rs">We present high quality image synthesis results using <b>diffusion</b> probabilistic models&nbsp;&hellip;</div>
  </div>
</div>
<div class="gs_r gs_or gs_scl" data-cid="Zz9" data-rp="1">
  <div class="gs_ri">
    <h3 class="gs_rt"><span class="gs_ctu"><span class="gs_ct1">[CITATION]</span></span> Diffusion notes</h3>
    <div class="gs_a">A Author - 1999</div>
  </div>
</div>
</div>"#;

    #[test]
    fn test_parse_results_page() {
        let patterns = ScholarPatterns::new().unwrap();
        let records = parse_results_page(SAMPLE, &patterns);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first["cid"], "AbC123");
        assert_eq!(first["bib"]["title"], "Denoising diffusion probabilistic models");
        assert_eq!(first["bib"]["author"], json!(["J Ho", "A Jain", "P Abbeel"]));
        assert_eq!(first["bib"]["pub_year"], "2020");
        assert_eq!(first["eprint_url"], "https://arxiv.org/pdf/2006.11239");
        assert_eq!(
            first["pub_url"],
            "https://proceedings.neurips.cc/paper/2020/hash/4c5b.html"
        );
        assert!(first["bib"]["abstract"]
            .as_str()
            .unwrap()
            .starts_with("We present high quality image synthesis"));

        let second = &records[1];
        assert_eq!(second["bib"]["title"], "Diffusion notes");
        assert!(second.get("pub_url").is_none());
    }

    #[test]
    fn test_parse_page_without_results() {
        let patterns = ScholarPatterns::new().unwrap();
        assert!(parse_results_page("<html><body>nothing</body></html>", &patterns).is_empty());
    }
}
