//! Controller layer: session state machine, UI events, and command orchestration.

pub mod events;
pub mod orchestration;
pub mod session;
