//! Session guard
//!
//! Tracks the bearer credential and the "auth required" flag. A rejected
//! credential is terminal: it is cleared, the flag is set and every
//! navigation other than `/login` is redirected there, remembering where the
//! user was headed.

pub const LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING: &str = "/dashboard";

pub const SESSION_EXPIRED_MESSAGE: &str = "Please sign in to continue.";
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password.";

#[derive(Debug, Clone, Default)]
pub struct SessionGuard {
    token: Option<String>,
    auth_required: bool,
    redirect: Option<String>,
    error: Option<String>,
}

impl SessionGuard {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            ..Default::default()
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    /// Message shown on the login screen
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// The server rejected the credential
    pub fn on_unauthorized(&mut self) {
        tracing::info!("Session invalidated, sign-in required");
        self.token = None;
        self.auth_required = true;
        self.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
    }

    /// Explicit sign-out
    pub fn on_logout(&mut self) {
        self.token = None;
        self.auth_required = true;
        self.redirect = None;
        self.error = None;
    }

    /// Path to show instead of `path`, if navigation there is not allowed.
    /// Remembers `path` for after login.
    pub fn guard(&mut self, path: &str) -> Option<&'static str> {
        if !self.auth_required || path == LOGIN_PATH {
            return None;
        }
        self.redirect = Some(path.to_string());
        Some(LOGIN_PATH)
    }

    /// Store the new credential and return the path to land on
    pub fn on_login_success(&mut self, token: String) -> String {
        self.token = Some(token);
        self.auth_required = false;
        self.error = None;
        self.redirect
            .take()
            .unwrap_or_else(|| DEFAULT_LANDING.to_string())
    }

    pub fn on_login_failure(&mut self) {
        self.error = Some(LOGIN_FAILED_MESSAGE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_session_does_not_redirect() {
        let mut guard = SessionGuard::new(Some("t".into()));
        assert!(guard.has_credential());
        assert_eq!(guard.guard("/activities/run"), None);
        assert_eq!(guard.redirect(), None);
    }

    #[test]
    fn test_unauthorized_then_login_replays_path() {
        let mut guard = SessionGuard::new(Some("t".into()));
        guard.on_unauthorized();

        assert!(!guard.has_credential());
        assert!(guard.auth_required());
        assert_eq!(guard.error(), Some(SESSION_EXPIRED_MESSAGE));

        assert_eq!(guard.guard("/login"), None);
        assert_eq!(guard.guard("/activities/golf"), Some(LOGIN_PATH));
        assert_eq!(guard.redirect(), Some("/activities/golf"));

        guard.on_login_failure();
        assert_eq!(guard.error(), Some(LOGIN_FAILED_MESSAGE));
        assert!(guard.auth_required());

        let target = guard.on_login_success("fresh".into());
        assert_eq!(target, "/activities/golf");
        assert_eq!(guard.token(), Some("fresh"));
        assert!(!guard.auth_required());
        assert_eq!(guard.error(), None);
        assert_eq!(guard.redirect(), None);
    }

    #[test]
    fn test_login_defaults_to_dashboard() {
        let mut guard = SessionGuard::new(None);
        assert_eq!(guard.on_login_success("t".into()), DEFAULT_LANDING);
    }

    #[test]
    fn test_logout() {
        let mut guard = SessionGuard::new(Some("t".into()));
        guard.on_logout();
        assert!(guard.auth_required());
        assert_eq!(guard.error(), None);
        assert_eq!(guard.guard("/dashboard"), Some(LOGIN_PATH));
    }
}
