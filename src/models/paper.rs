use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 占位论文 id 前缀
pub const PLACEHOLDER_ID_PREFIX: &str = "placeholder_";

/// 论文记录来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// 来自真实搜索结果
    #[default]
    Retrieved,
    /// 搜索无结果时生成的占位记录
    Placeholder,
}

/// 标准化后的论文记录
///
/// 所有字段在缺失时都取空值，下游不需要判断字段是否存在
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub origin: RecordOrigin,
}

impl PaperRecord {
    /// 从原始搜索结果字典构建论文记录
    ///
    /// 接受 `summary` / `abstract` 与 `published` / `published_date` 两种键名，
    /// 类型不符的字段按缺失处理
    pub fn from_value(value: &Value) -> Self {
        let text = |keys: &[&str]| -> String {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(Value::as_str))
                .unwrap_or_default()
                .to_string()
        };

        let authors = match value.get("authors") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|a| a.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };

        Self {
            id: text(&["id"]),
            title: text(&["title"]),
            authors,
            abstract_text: text(&["summary", "abstract"]),
            published_date: text(&["published", "published_date"]),
            url: text(&["url"]),
            origin: RecordOrigin::Retrieved,
        }
    }

    /// 转换回原始搜索结果字典
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "authors": self.authors,
            "summary": self.abstract_text,
            "published": self.published_date,
            "url": self.url,
        })
    }

    /// 创建占位论文记录
    pub fn placeholder(suffix: impl AsRef<str>, title: impl Into<String>) -> Self {
        Self {
            id: format!("{}{}", PLACEHOLDER_ID_PREFIX, suffix.as_ref()),
            title: title.into(),
            origin: RecordOrigin::Placeholder,
            ..Default::default()
        }
    }

    /// 是否为占位记录
    pub fn is_placeholder(&self) -> bool {
        self.origin == RecordOrigin::Placeholder || self.id.starts_with(PLACEHOLDER_ID_PREFIX)
    }

    /// 解析发表日期
    ///
    /// 支持 RFC 3339、`YYYY-MM-DD` 以及单独的年份
    pub fn published_on(&self) -> Option<NaiveDate> {
        let raw = self.published_date.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        if let Some(date) = raw
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        {
            return Some(date);
        }
        raw.parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
    }

    /// 用于提示词的日期文本
    pub fn display_date(&self) -> String {
        match self.published_on() {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None if self.published_date.trim().is_empty() => "Unknown".to_string(),
            None => self.published_date.trim().to_string(),
        }
    }

    /// 用于提示词的作者列表
    pub fn author_list(&self) -> String {
        if self.authors.is_empty() {
            "Unknown".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}

impl std::fmt::Display for PaperRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title_preview = if self.title.chars().count() > 80 {
            self.title.chars().take(80).collect::<String>() + "..."
        } else {
            self.title.clone()
        };

        let authors: Vec<&str> = self.authors.iter().take(3).map(String::as_str).collect();
        if authors.is_empty() {
            write!(f, "{}", title_preview)
        } else {
            write!(f, "{} by {}", title_preview, authors.join(", "))
        }
    }
}
