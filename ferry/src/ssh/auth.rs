//! Authentication fallback decision provider

use crate::output;

/// Decides whether a failed key authentication is retried with a password,
/// and supplies the secret when it is.
///
/// Injected into a [`super::Session`] so callers (and tests) can script the
/// decision instead of driving a console.
pub trait AuthFallback: Send {
    /// Whether to retry the failed key authentication with a password.
    fn retry_with_password(&mut self, host: &str, username: &str) -> bool;

    /// The password to retry with. Must not be echoed or logged.
    fn password(&mut self, host: &str, username: &str) -> std::io::Result<String>;
}

/// Interactive console provider. Declines automatically when stdin/stdout are
/// not terminals so unattended runs fail fast instead of hanging on a prompt.
#[derive(Default)]
pub struct ConsoleFallback;

impl AuthFallback for ConsoleFallback {
    fn retry_with_password(&mut self, host: &str, username: &str) -> bool {
        output::warning(&format!(
            "Key authentication failed for {username}@{host}. Check your SSH key."
        ));
        output::confirm("Try password authentication?", false).unwrap_or(false)
    }

    fn password(&mut self, host: &str, username: &str) -> std::io::Result<String> {
        output::prompt_password(&format!("Password for {username}@{host}"))
    }
}
