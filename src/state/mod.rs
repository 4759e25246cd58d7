pub mod flow;
pub mod session;
pub mod wizard_state;
