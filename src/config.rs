use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::ConfigError;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "research_assistant.toml";

/// 配置文件中表示"未填写"的 API Key
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    /// 缺失时 LLM 步骤返回错误而不是终止程序
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 搜索配置 ---
    pub arxiv_api_base_url: String,
    /// 优先搜索该年份之后提交的论文，为空时不过滤
    pub arxiv_recent_since_year: Option<i32>,
    pub scholar_base_url: String,
    /// Google Scholar 无结果时是否生成占位论文
    pub scholar_placeholder_fallback: bool,
    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    // --- 运行配置 ---
    /// 未输入主题时使用的默认主题
    pub default_topic: String,
    pub max_results: usize,
    /// 博客文章输出目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-3.5-turbo".to_string(),
            llm_temperature: 0.7,
            llm_max_tokens: 2048,
            arxiv_api_base_url: "http://export.arxiv.org/api/query".to_string(),
            arxiv_recent_since_year: Some(2025),
            scholar_base_url: "https://scholar.google.com/scholar".to_string(),
            scholar_placeholder_fallback: true,
            http_timeout_secs: 30,
            default_topic: "machine learning".to_string(),
            max_results: 5,
            output_dir: ".".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载配置
    ///
    /// `path` 为空时依次尝试 `$RESEARCH_ASSISTANT_CONFIG` 和当前目录下的默认配置文件；
    /// 默认配置文件不存在不算错误
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(|p| p.to_path_buf())
            .or_else(|| std::env::var("RESEARCH_ASSISTANT_CONFIG").ok().map(Into::into));

        let base = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("未找到配置文件，使用默认配置");
                Self::default()
            }
        };

        base.overlay_env()
    }

    /// 从 TOML 文件读取配置，未出现的字段取默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        info!("📄 已加载配置文件: {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.llm_api_key = sanitize_api_key(config.llm_api_key.take());
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn overlay_env(self) -> Result<Self, ConfigError> {
        self.overlay_with(|name| std::env::var(name).ok())
    }

    /// 用 `get` 查到的值覆盖已有配置
    ///
    /// # 参数
    /// - `get`: 按变量名查找取值，未设置时返回 `None`
    pub fn overlay_with(self, get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env_key = sanitize_api_key(get("LLM_API_KEY"))
            .or_else(|| sanitize_api_key(get("OPENAI_API_KEY")));

        Ok(Self {
            llm_api_key: env_key.or(self.llm_api_key),
            llm_api_base_url: get("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: get("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: parse_env(&get, "LLM_TEMPERATURE", "f32")?
                .unwrap_or(self.llm_temperature),
            llm_max_tokens: parse_env(&get, "LLM_MAX_TOKENS", "u32")?
                .unwrap_or(self.llm_max_tokens),
            arxiv_api_base_url: get("ARXIV_API_BASE_URL").unwrap_or(self.arxiv_api_base_url),
            arxiv_recent_since_year: parse_env(&get, "ARXIV_RECENT_SINCE_YEAR", "i32")?
                .or(self.arxiv_recent_since_year),
            scholar_base_url: get("SCHOLAR_BASE_URL").unwrap_or(self.scholar_base_url),
            scholar_placeholder_fallback: parse_env(&get, "SCHOLAR_PLACEHOLDER_FALLBACK", "bool")?
                .unwrap_or(self.scholar_placeholder_fallback),
            http_timeout_secs: parse_env(&get, "HTTP_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.http_timeout_secs),
            default_topic: get("DEFAULT_TOPIC").unwrap_or(self.default_topic),
            max_results: parse_env(&get, "MAX_RESULTS", "usize")?.unwrap_or(self.max_results),
            output_dir: get("OUTPUT_DIR").unwrap_or(self.output_dir),
            verbose_logging: parse_env(&get, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }

    /// 是否配置了可用的 LLM 凭据
    pub fn has_llm_credentials(&self) -> bool {
        self.llm_api_key.is_some()
    }

    /// 启动时检查凭据，缺失时只给出警告
    pub fn warn_if_missing_credentials(&self) {
        if !self.has_llm_credentials() {
            warn!("⚠️ 未找到有效的 API Key，请设置 LLM_API_KEY / OPENAI_API_KEY 或在配置文件中填写 llm_api_key");
        }
    }
}

/// 空字符串与占位值视为未配置
fn sanitize_api_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && k != API_KEY_PLACEHOLDER)
}

/// 读取并解析变量，未设置时返回 `None`
fn parse_env<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match get(var_name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        None => Ok(None),
    }
}
