//! Client-side navigation hook used when the session expires

use tracing::warn;

/// Entry point the user is sent to after a 401
pub const LOGIN_PATH: &str = "/login";

/// Something that can move the user to another screen
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, path: &str) {
        self(path)
    }
}

/// Navigator for headless use: records the redirect in the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        warn!("Session expired, redirecting to {}", path);
    }
}
