//! 流程运行器 - 编排层
//!
//! 逐步驱动工作流：步骤发起中断时向用户提问，把回答写回状态后继续；
//! 搜索结束后如果还没有指定论文序号，列出论文让用户挑选

use tracing::{debug, info, warn};

use crate::models::{StateKey, StateUpdate, WorkflowState};
use crate::orchestrator::prompter::Prompter;
use crate::utils::logging::format_paper_list;
use crate::workflow::research_flow::SEARCH;
use crate::workflow::{CompiledWorkflow, ResearchBranch};

pub const PAPER_QUESTION: &str = "Enter the number of the paper to analyze";

/// 流程运行器
pub struct Runner<'a> {
    workflow: &'a CompiledWorkflow<ResearchBranch>,
    prompter: &'a mut dyn Prompter,
}

impl<'a> Runner<'a> {
    pub fn new(workflow: &'a CompiledWorkflow<ResearchBranch>, prompter: &'a mut dyn Prompter) -> Self {
        Self { workflow, prompter }
    }

    /// 从入口执行到终止标记，返回最终状态
    pub async fn run(&mut self, initial: WorkflowState) -> WorkflowState {
        let workflow = self.workflow;
        let mut run = workflow.stream(initial);

        while let Some(event) = run.next_step().await {
            debug!("✓ 步骤完成: {}", event.step);

            if let Some(interrupt) = event.update.raised_interrupt() {
                let answer = self.ask(&interrupt.details.prompt, &interrupt.details.suggestions);
                run.inject(StateUpdate::answer(interrupt.details.answer_key, answer));
            }

            if event.step == SEARCH {
                if let Some(update) = self.pick_paper(run.state()) {
                    run.inject(update);
                }
            }
        }

        let state = run.into_state();
        info!("🏁 流程结束");
        state
    }

    /// 列出搜索结果并询问论文序号
    ///
    /// 已指定序号、没有论文或非交互模式时不提问；回答为空时保持未指定
    fn pick_paper(&mut self, state: &WorkflowState) -> Option<StateUpdate> {
        if state.paper_index.is_some() || state.papers.is_empty() || !self.prompter.is_interactive() {
            return None;
        }

        self.prompter.show(&format_paper_list(state));
        let suggestions: Vec<String> = (0..state.papers.len()).map(|i| i.to_string()).collect();
        let answer = self.ask(PAPER_QUESTION, &suggestions);
        if answer.trim().is_empty() {
            return None;
        }
        Some(StateUpdate::answer(StateKey::PaperIndex, answer))
    }

    /// 提问失败时按空回答处理
    fn ask(&mut self, prompt: &str, suggestions: &[String]) -> String {
        match self.prompter.ask(prompt, suggestions) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("⚠️ 获取用户回答失败，按空回答处理: {}", e);
                String::new()
            }
        }
    }
}
