pub mod paper;
pub mod state;

pub use paper::{PaperRecord, RecordOrigin, PLACEHOLDER_ID_PREFIX};
pub use state::{
    Interrupt, InterruptAction, QuestionDetails, SearchSource, StateKey, StateUpdate,
    WorkflowState,
};
