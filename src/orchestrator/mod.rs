//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把工作流跑起来，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 创建 LLM 客户端与搜索来源（只在启动时创建一次）
//! - 编译研究工作流
//! - 补齐研究主题、保存博客文章
//!
//! ### `runner` - 流程运行器
//! - 逐步执行工作流
//! - 把中断转换为提问，把回答写回状态
//! - 搜索后让用户挑选论文
//!
//! ### `prompter` - 用户交互
//! - 终端、预设回答、非交互三种实现
//!
//! ## 层次关系
//!
//! ```text
//! app (处理一次研究请求)
//!     ↓
//! runner (逐步驱动、处理中断)
//!     ↓
//! workflow (图引擎 + 步骤)
//!     ↓
//! services (能力层：search / rank / prompt / blog)
//!     ↓
//! clients (外部接口：arXiv / Google Scholar / LLM)
//! ```

pub mod app;
pub mod prompter;
pub mod runner;

// 重新导出主要类型
pub use app::{default_registry, App, ResearchRequest};
pub use prompter::{ConsolePrompter, NonInteractivePrompter, Prompter, ScriptedPrompter};
pub use runner::Runner;
