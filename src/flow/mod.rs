//! Multi-turn dialogue flows.
//!
//! Every flow shares one skeleton ([`engine::Flow`]): resolve references in
//! order, fall back to suggestions when a name is unknown, confirm, then run
//! exactly one mutation. What differs per action (slots, wording, the final
//! mutation) lives in [`kind::FlowKind`].

pub mod action;
pub mod engine;
pub mod kind;
pub mod session;

pub use action::Action;
pub use engine::{Flow, FlowDeps, FlowStatus};
pub use kind::{FlowKind, FlowSeed};
pub use session::{FlowSession, SessionSnapshot, Slot, Stage};
