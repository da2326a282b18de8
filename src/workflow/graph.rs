//! 工作流引擎 - 流程层
//!
//! 由具名步骤和边组成的有向无环图：
//! - 普通边：固定走向下一个步骤
//! - 条件边：离开步骤时根据当前状态选择分支
//!
//! 编译时做静态校验，运行时逐步执行并把每一步的部分更新合并进状态。
//! 分步执行（[`CompiledWorkflow::stream`]）在每一步结束后暂停，调用方可以在
//! 下一步开始前注入更新，注入的内容对随后的分支判断可见。

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::GraphError;
use crate::models::{StateUpdate, WorkflowState};

/// 终止标记
pub const END: &str = "__end__";

/// 条件边的分支枚举
///
/// `variants` 必须列出全部取值，编译时据此检查每个分支都有去向
pub trait Branch: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    fn variants() -> &'static [Self];
}

/// 工作流步骤
///
/// 步骤读取当前状态，只返回它修改过的字段；步骤本身不会失败，
/// 所有错误都写在返回值的 `error` 中
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, state: &WorkflowState) -> StateUpdate;
}

/// 同步函数包装成的步骤
pub struct SyncStep<F>(pub F);

#[async_trait]
impl<F> Step for SyncStep<F>
where
    F: Fn(&WorkflowState) -> StateUpdate + Send + Sync,
{
    async fn run(&self, state: &WorkflowState) -> StateUpdate {
        (self.0)(state)
    }
}

/// 把同步函数包装成步骤
pub fn sync_step<F>(f: F) -> Arc<dyn Step>
where
    F: Fn(&WorkflowState) -> StateUpdate + Send + Sync + 'static,
{
    Arc::new(SyncStep(f))
}

/// 分支判断函数
///
/// 可以在判断时修正状态（例如补齐分支目标需要的字段）
type Decide<B> = Box<dyn Fn(&mut WorkflowState) -> B + Send + Sync>;

enum Edge<B> {
    Direct(String),
    Conditional {
        branches: HashMap<B, String>,
        decide: Decide<B>,
    },
}

impl<B> Edge<B> {
    fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(to) => vec![to.as_str()],
            Edge::Conditional { branches, .. } => branches.values().map(String::as_str).collect(),
        }
    }
}

/// 工作流图（构建阶段）
pub struct WorkflowGraph<B: Branch> {
    steps: Vec<(String, Arc<dyn Step>)>,
    index: HashMap<String, usize>,
    edges: HashMap<String, Edge<B>>,
    entry: Option<String>,
}

impl<B: Branch> Default for WorkflowGraph<B> {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            index: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
        }
    }
}

impl<B: Branch> WorkflowGraph<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册步骤
    ///
    /// 名称不能重复，也不能与终止标记同名
    pub fn register_step(&mut self, name: &str, step: Arc<dyn Step>) -> Result<(), GraphError> {
        if name == END {
            return Err(GraphError::Configuration(format!(
                "步骤名 '{}' 是保留的终止标记",
                name
            )));
        }
        if self.index.contains_key(name) {
            return Err(GraphError::Configuration(format!("步骤 '{}' 重复注册", name)));
        }
        self.index.insert(name.to_string(), self.steps.len());
        self.steps.push((name.to_string(), step));
        Ok(())
    }

    /// 添加普通边
    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        self.check_edge_source(from)?;
        self.check_target(to)?;
        self.edges.insert(from.to_string(), Edge::Direct(to.to_string()));
        Ok(())
    }

    /// 添加条件边
    ///
    /// # 参数
    /// - `from`: 起点步骤
    /// - `branches`: 分支到目标步骤的映射
    /// - `decide`: 离开 `from` 时调用，参数是当时的状态（包含调用方注入的更新）
    pub fn connect_conditional<'a, I, F>(&mut self, from: &str, branches: I, decide: F) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = (B, &'a str)>,
        F: Fn(&mut WorkflowState) -> B + Send + Sync + 'static,
    {
        self.check_edge_source(from)?;

        let mut mapped = HashMap::new();
        for (branch, to) in branches {
            self.check_target(to)?;
            if mapped.insert(branch, to.to_string()).is_some() {
                return Err(GraphError::Configuration(format!(
                    "步骤 '{}' 的分支 {:?} 重复映射",
                    from, branch
                )));
            }
        }

        self.edges.insert(
            from.to_string(),
            Edge::Conditional {
                branches: mapped,
                decide: Box::new(decide),
            },
        );
        Ok(())
    }

    /// 设置入口步骤
    pub fn set_entry(&mut self, name: &str) -> Result<(), GraphError> {
        if !self.index.contains_key(name) {
            return Err(GraphError::Configuration(format!("入口步骤 '{}' 未注册", name)));
        }
        self.entry = Some(name.to_string());
        Ok(())
    }

    fn check_edge_source(&self, from: &str) -> Result<(), GraphError> {
        if !self.index.contains_key(from) {
            return Err(GraphError::Configuration(format!("起点步骤 '{}' 未注册", from)));
        }
        if self.edges.contains_key(from) {
            return Err(GraphError::Configuration(format!("步骤 '{}' 已经有出边", from)));
        }
        Ok(())
    }

    fn check_target(&self, to: &str) -> Result<(), GraphError> {
        if to == END || self.index.contains_key(to) {
            Ok(())
        } else {
            Err(GraphError::Configuration(format!("目标步骤 '{}' 未注册", to)))
        }
    }

    /// 编译并校验工作流
    ///
    /// - 入口缺失、存在不可达步骤或存在环 → [`GraphError::Cycle`]
    /// - 步骤没有出边、条件边存在未映射的分支 → [`GraphError::Configuration`]
    pub fn compile(self) -> Result<CompiledWorkflow<B>, GraphError> {
        let entry_name = self
            .entry
            .clone()
            .ok_or_else(|| GraphError::Cycle("没有设置入口步骤".to_string()))?;

        for (name, _) in &self.steps {
            match self.edges.get(name) {
                None => {
                    return Err(GraphError::Configuration(format!("步骤 '{}' 没有出边", name)));
                }
                Some(Edge::Conditional { branches, .. }) => {
                    if let Some(missing) = B::variants().iter().find(|b| !branches.contains_key(*b)) {
                        return Err(GraphError::Configuration(format!(
                            "步骤 '{}' 的分支 {:?} 没有目标",
                            name, missing
                        )));
                    }
                }
                Some(Edge::Direct(_)) => {}
            }
        }

        self.check_reachable(&entry_name)?;
        self.check_acyclic(&entry_name)?;

        let target = |name: &str| -> Target {
            if name == END {
                Target::End
            } else {
                // 目标在连线时已校验过
                self.index.get(name).copied().map_or(Target::End, Target::Step)
            }
        };

        let mut compiled_edges = Vec::with_capacity(self.steps.len());
        let mut edges = self.edges;
        for (name, _) in &self.steps {
            let edge = match edges.remove(name) {
                Some(Edge::Direct(to)) => CompiledEdge::Direct(target(&to)),
                Some(Edge::Conditional { branches, decide }) => CompiledEdge::Conditional {
                    branches: branches.iter().map(|(b, to)| (*b, target(to))).collect(),
                    decide,
                },
                None => CompiledEdge::Direct(Target::End),
            };
            compiled_edges.push(edge);
        }

        let entry = self.index.get(&entry_name).copied().unwrap_or_default();
        debug!("工作流编译完成: {} 个步骤，入口 '{}'", self.steps.len(), entry_name);

        Ok(CompiledWorkflow {
            steps: self.steps,
            edges: compiled_edges,
            entry,
        })
    }

    fn check_reachable(&self, entry: &str) -> Result<(), GraphError> {
        let mut reachable: HashSet<&str> = HashSet::new();
        let mut pending = vec![entry];
        while let Some(name) = pending.pop() {
            if name == END || !reachable.insert(name) {
                continue;
            }
            if let Some(edge) = self.edges.get(name) {
                pending.extend(edge.targets());
            }
        }
        match self.steps.iter().find(|(n, _)| !reachable.contains(n.as_str())) {
            Some((name, _)) => Err(GraphError::Cycle(format!("步骤 '{}' 从入口不可达", name))),
            None => Ok(()),
        }
    }

    /// 深度优先检查环
    fn check_acyclic(&self, entry: &str) -> Result<(), GraphError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a, B>(
            name: &'a str,
            edges: &'a HashMap<String, Edge<B>>,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Result<(), GraphError> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(GraphError::Cycle(format!("步骤 '{}' 处存在环", name)));
                }
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            if let Some(edge) = edges.get(name) {
                for next in edge.targets() {
                    if next != END {
                        visit(next, edges, marks)?;
                    }
                }
            }
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        visit(entry, &self.edges, &mut marks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Step(usize),
    End,
}

enum CompiledEdge<B> {
    Direct(Target),
    Conditional {
        branches: HashMap<B, Target>,
        decide: Decide<B>,
    },
}

/// 编译后的工作流
pub struct CompiledWorkflow<B: Branch> {
    steps: Vec<(String, Arc<dyn Step>)>,
    edges: Vec<CompiledEdge<B>>,
    entry: usize,
}

impl<B: Branch> CompiledWorkflow<B> {
    /// 完整执行直到终止标记
    pub async fn run(&self, initial: WorkflowState) -> WorkflowState {
        let mut run = self.stream(initial);
        while run.next_step().await.is_some() {}
        run.into_state()
    }

    /// 分步执行
    ///
    /// 每次调用都从入口重新开始
    pub fn stream(&self, initial: WorkflowState) -> WorkflowRun<'_, B> {
        WorkflowRun {
            workflow: self,
            state: initial,
            position: Position::Start,
        }
    }

    /// 全部步骤名（按注册顺序）
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn resolve(&self, from: usize, state: &mut WorkflowState) -> Target {
        match &self.edges[from] {
            CompiledEdge::Direct(target) => *target,
            CompiledEdge::Conditional { branches, decide } => {
                let branch = decide(state);
                debug!("步骤 '{}' 选择分支 {:?}", self.steps[from].0, branch);
                branches.get(&branch).copied().unwrap_or_else(|| {
                    warn!("分支 {:?} 没有目标，流程结束", branch);
                    Target::End
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Position {
    Start,
    After(usize),
    Finished,
}

/// 一步执行的结果
#[derive(Debug, Clone)]
pub struct StepEvent {
    pub step: String,
    pub update: StateUpdate,
}

/// 分步执行中的工作流
pub struct WorkflowRun<'a, B: Branch> {
    workflow: &'a CompiledWorkflow<B>,
    state: WorkflowState,
    position: Position,
}

impl<B: Branch> WorkflowRun<'_, B> {
    /// 执行下一步
    ///
    /// 先根据当前状态解析上一步的出边，再执行目标步骤并合并更新；
    /// 到达终止标记后返回 `None`
    pub async fn next_step(&mut self) -> Option<StepEvent> {
        let idx = match self.position {
            Position::Start => self.workflow.entry,
            Position::After(prev) => match self.workflow.resolve(prev, &mut self.state) {
                Target::Step(idx) => idx,
                Target::End => {
                    self.position = Position::Finished;
                    return None;
                }
            },
            Position::Finished => return None,
        };

        let (name, step) = &self.workflow.steps[idx];
        debug!("▶ 执行步骤: {}", name);
        let update = step.run(&self.state).await;
        self.state.apply(update.clone());
        self.position = Position::After(idx);

        Some(StepEvent {
            step: name.clone(),
            update,
        })
    }

    /// 在两步之间注入更新
    pub fn inject(&mut self, update: StateUpdate) {
        self.state.apply(update);
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.position, Position::Finished)
    }

    pub fn into_state(self) -> WorkflowState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Route {
        Left,
        Right,
    }

    impl Branch for Route {
        fn variants() -> &'static [Self] {
            &[Route::Left, Route::Right]
        }
    }

    fn writes_analysis(text: &'static str) -> Arc<dyn Step> {
        sync_step(move |_| StateUpdate::new().analysis(text))
    }

    fn appends_to_blog(text: &'static str) -> Arc<dyn Step> {
        sync_step(move |state| StateUpdate::new().blog_post(format!("{}{}", state.blog_post, text)))
    }

    #[tokio::test]
    async fn test_linear_run_merges_updates() {
        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("a", appends_to_blog("a")).unwrap();
        graph.register_step("b", appends_to_blog("b")).unwrap();
        graph.connect("a", "b").unwrap();
        graph.connect("b", END).unwrap();
        graph.set_entry("a").unwrap();

        let workflow = graph.compile().unwrap();
        let state = workflow.run(WorkflowState::new("t")).await;
        assert_eq!(state.blog_post, "ab");
        assert_eq!(state.topic, "t");
    }

    fn branching_graph() -> CompiledWorkflow<Route> {
        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("start", sync_step(|_| StateUpdate::new())).unwrap();
        graph.register_step("left", writes_analysis("left")).unwrap();
        graph.register_step("right", writes_analysis("right")).unwrap();
        graph
            .connect_conditional("start", [(Route::Left, "left"), (Route::Right, "right")], |state| {
                if state.paper_index.is_some() {
                    Route::Right
                } else {
                    Route::Left
                }
            })
            .unwrap();
        graph.connect("left", END).unwrap();
        graph.connect("right", END).unwrap();
        graph.set_entry("start").unwrap();
        graph.compile().unwrap()
    }

    #[tokio::test]
    async fn test_conditional_edge() {
        let workflow = branching_graph();
        assert_eq!(workflow.run(WorkflowState::default()).await.analysis, "left");
        assert_eq!(
            workflow.run(WorkflowState::default().with_paper_index(0)).await.analysis,
            "right"
        );
    }

    #[tokio::test]
    async fn test_injected_update_visible_to_decision() {
        let workflow = branching_graph();
        let mut run = workflow.stream(WorkflowState::default());

        let first = run.next_step().await.unwrap();
        assert_eq!(first.step, "start");
        assert!(first.update.is_empty());

        run.inject(StateUpdate::new().paper_index(4));
        let second = run.next_step().await.unwrap();
        assert_eq!(second.step, "right");

        assert!(run.next_step().await.is_none());
        assert!(run.is_finished());
        assert!(run.next_step().await.is_none());
        assert_eq!(run.state().paper_index, Some(4));
    }

    #[tokio::test]
    async fn test_stream_restarts_from_entry() {
        let workflow = branching_graph();
        for _ in 0..2 {
            let mut run = workflow.stream(WorkflowState::default());
            assert_eq!(run.next_step().await.unwrap().step, "start");
        }
    }

    #[test]
    fn test_registration_errors() {
        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("a", writes_analysis("x")).unwrap();
        assert!(matches!(
            graph.register_step("a", writes_analysis("x")),
            Err(GraphError::Configuration(_))
        ));
        assert!(matches!(
            graph.register_step(END, writes_analysis("x")),
            Err(GraphError::Configuration(_))
        ));
        assert!(matches!(graph.connect("a", "missing"), Err(GraphError::Configuration(_))));
        assert!(matches!(graph.connect("missing", END), Err(GraphError::Configuration(_))));
        graph.connect("a", END).unwrap();
        assert!(matches!(graph.connect("a", END), Err(GraphError::Configuration(_))));
    }

    #[test]
    fn test_compile_without_entry() {
        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("a", writes_analysis("x")).unwrap();
        graph.connect("a", END).unwrap();
        assert!(matches!(graph.compile(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn test_compile_detects_unreachable_step() {
        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("a", writes_analysis("x")).unwrap();
        graph.register_step("orphan", writes_analysis("y")).unwrap();
        graph.connect("a", END).unwrap();
        graph.connect("orphan", END).unwrap();
        graph.set_entry("a").unwrap();
        assert!(matches!(graph.compile(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn test_compile_detects_cycle() {
        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("a", writes_analysis("x")).unwrap();
        graph.register_step("b", writes_analysis("y")).unwrap();
        graph.connect("a", "b").unwrap();
        graph.connect("b", "a").unwrap();
        graph.set_entry("a").unwrap();
        assert!(matches!(graph.compile(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn test_compile_requires_outgoing_edges_and_mapped_branches() {
        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("a", writes_analysis("x")).unwrap();
        graph.set_entry("a").unwrap();
        assert!(matches!(graph.compile(), Err(GraphError::Configuration(_))));

        let mut graph = WorkflowGraph::<Route>::new();
        graph.register_step("a", writes_analysis("x")).unwrap();
        graph
            .connect_conditional("a", [(Route::Left, END)], |_| Route::Left)
            .unwrap();
        graph.set_entry("a").unwrap();
        assert!(matches!(graph.compile(), Err(GraphError::Configuration(_))));
    }
}
