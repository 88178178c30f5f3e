pub mod engine;
pub mod states;

pub use engine::{
    FlowDefinition, FlowEngine, FlowTransitionError, OrderFlow, GENERIC_QUOTE_ERROR,
    MIN_REQUEST_CHARS,
};
pub use states::{FlowAction, SessionEvent, SessionState, Stage, TransitionOutcome};
