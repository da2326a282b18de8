//! # Research Assistant
//!
//! 一个搜索论文、分析论文并生成技术博客的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 外部接口层（Clients）
//! - `clients/` - 只负责与外部服务通信
//! - `ArxivClient` - arXiv Atom 查询
//! - `ScholarClient` - Google Scholar 结果页抓取
//! - `LlmClient` - OpenAI 兼容的文本生成
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ArxivSearch` / `ScholarSearch` - 搜索并标准化论文记录
//! - `RelevanceRanker` - 按主题打分排序
//! - `prompt_builder` - 构建分析与博客提示词
//! - `BlogWriter` - 写博客文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/graph` - 带条件边的步骤图引擎，支持分步执行和注入
//! - `workflow/steps` - 六个步骤（询问来源、处理来源、搜索、选择、分析、博客）
//! - `workflow/research_flow` - 把步骤连成研究流程
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用初始化与一次请求的处理
//! - `orchestrator/runner` - 驱动流程并处理中断
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{PaperRecord, SearchSource, StateUpdate, WorkflowState};
pub use orchestrator::{App, ResearchRequest, Runner};
pub use workflow::{build_research_workflow, ResearchBranch};
