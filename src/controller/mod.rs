mod executor;
pub mod fsm;

pub use executor::InteractionController;
pub use fsm::{SessionEvent, SessionState, SessionStateMachine};
