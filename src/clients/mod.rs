pub mod arxiv_client;
pub mod llm_client;
pub mod scholar_client;

pub use arxiv_client::{ArxivBackend, ArxivClient};
pub use llm_client::{LanguageModel, LlmClient};
pub use scholar_client::{ScholarBackend, ScholarClient};
