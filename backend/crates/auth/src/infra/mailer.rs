//! Mail Delivery Implementations
//!
//! The default delivery logs the verification link instead of sending
//! real mail. Wiring an SMTP provider means implementing
//! [`crate::domain::repository::Mailer`] against it and swapping the
//! type in at router assembly.

use crate::domain::repository::Mailer;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Log-only mailer
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_account_verification(&self, email: &Email, link: &str) -> AuthResult<()> {
        tracing::info!(email = %email, link = %link, "Account verification mail (log delivery)");
        Ok(())
    }
}
