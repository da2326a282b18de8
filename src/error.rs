use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 工作流图错误
    #[error("工作流错误: {0}")]
    Graph(#[from] GraphError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 论文搜索错误
    #[error("搜索错误: {0}")]
    Search(#[from] SearchError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// 正则表达式编译失败
    #[error("正则表达式编译失败: {0}")]
    InvalidPattern(#[source] regex::Error),
}

/// 工作流图的构建与校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// 步骤注册或连线不合法
    #[error("图配置错误: {0}")]
    Configuration(String),
    /// 入口缺失、存在不可达步骤或存在环
    #[error("图结构错误: {0}")]
    Cycle(String),
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 其它后端错误（测试桩或自定义实现使用）
    #[error("{0}")]
    Backend(String),
}

/// 论文搜索错误
#[derive(Debug, Error)]
pub enum SearchError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非成功状态码
    #[error("服务返回错误状态 ({endpoint}): HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// 返回内容类型不符合预期
    #[error("返回内容类型异常 ({endpoint}): {content_type}, 内容: {preview}")]
    UnexpectedContent {
        endpoint: String,
        content_type: String,
        preview: String,
    },
    /// Atom feed 解析失败
    #[error("Atom feed 解析失败: {0}")]
    FeedParseFailed(#[source] quick_xml::DeError),
    /// 其它后端错误（测试桩或自定义实现使用）
    #[error("{0}")]
    Backend(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 创建目录失败
    #[error("创建目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl SearchError {
    /// 创建请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        SearchError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }
}

impl LlmError {
    /// 创建 LLM API 调用错误
    pub fn api_failed(model: impl Into<String>, source: async_openai::error::OpenAIError) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
