/// LLM API 客户端
///
/// 封装所有与 LLM API 相关的调用逻辑
///
/// ## 技术栈
/// - 使用 `async-openai` crate 进行 API 调用
/// - 支持自定义 API 端点和模型（兼容 OpenAI API 的服务均可使用）
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 文本生成能力
///
/// 一次调用对应一次同步的生成请求，返回原始文本，不做解析和重试
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 根据提示词生成文本
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// 模型名称（仅用于日志）
    fn model_name(&self) -> &str;
}

/// 基于 OpenAI 兼容接口的 LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    system_message: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(api_key: &str, config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            system_message: Some(
                "You are a helpful research assistant who explains scientific papers clearly and accurately."
                    .to_string(),
            ),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    /// 根据配置创建客户端
    ///
    /// 没有配置 API Key 时返回 `None`，由调用方把"LLM 不可用"作为步骤错误处理
    pub fn from_config(config: &Config) -> Option<Arc<dyn LanguageModel>> {
        match config.llm_api_key.as_deref() {
            Some(key) => Some(Arc::new(Self::new(key, config))),
            None => {
                warn!("⚠️ 未配置 LLM API Key，分析与博客生成步骤将不可用");
                None
            }
        }
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    ///
    /// # 返回
    /// 返回 LLM 的响应内容
    async fn chat(&self, user_message: &str) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let api_failed = |e| LlmError::api_failed(&self.model_name, e);

        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = &self.system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg.as_str())
                .build()
                .map_err(api_failed)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(api_failed)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(api_failed)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            api_failed(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.chat(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_without_key_is_none() {
        let config = Config::default();
        assert!(LlmClient::from_config(&config).is_none());
    }

    #[test]
    fn test_from_config_with_key() {
        let config = Config {
            llm_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        let model = LlmClient::from_config(&config).expect("client");
        assert_eq!(model.model_name(), "gpt-3.5-turbo");
    }

    /// 需要真实 API Key
    #[tokio::test]
    #[ignore]
    async fn test_generate_live() {
        let _ = tracing_subscriber::fmt::try_init();
        let config = Config::from_env().expect("config");
        let model = LlmClient::from_config(&config).expect("需要设置 LLM_API_KEY");
        let response = model.generate("Say hello in one word.").await;
        assert!(response.is_ok(), "LLM 调用失败: {:?}", response.err());
    }
}
