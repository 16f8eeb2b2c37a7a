pub use super::{TransitionMutableState, TransitionState, TransitionSystem};
