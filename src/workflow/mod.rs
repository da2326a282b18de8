pub mod graph;
pub mod research_flow;
pub mod steps;

pub use graph::{Branch, CompiledWorkflow, Step, StepEvent, WorkflowGraph, WorkflowRun, END};
pub use research_flow::{build_research_workflow, ResearchBranch};
