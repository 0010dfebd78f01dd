//! Reorder mode state machine.

pub mod machine;

pub use machine::{
    ActivationGate, MoveOutcome, Refusal, ReorderContext, ReorderExit, ReorderPhase,
    ReorderPhaseKind, ReorderPolicy, ReorderSession, ReorderStateMachine, ReorderStatus,
    ToggleOutcome,
};
