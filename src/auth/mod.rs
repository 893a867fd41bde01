pub mod cooldown;
pub mod flow;
pub mod session;

pub use flow::{AuthFlow, AuthStage, AuthState, ResendState};
pub use session::Session;
