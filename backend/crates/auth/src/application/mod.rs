//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod csrf;
pub mod login;
pub mod register;
pub mod session;
pub mod verify_account;

// Re-exports
pub use config::AuthConfig;
pub use csrf::{CsrfRejection, issue_csrf_token, validate_double_submit};
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use session::SessionManager;
pub use verify_account::AccountVerificationFlow;
