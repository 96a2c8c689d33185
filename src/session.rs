use serde::{Deserialize, Serialize};

/// Per-session credential store for the three-legged flow and the resource
/// calls that follow it.
///
/// Fields fill in incrementally: the request token pair after step 1, the
/// verifier after step 2, and everything else at the token exchange. The
/// status and last-error slots are the per-session replacement for the
/// process-wide feedback pair the presentation layer reads; they are
/// transient and not serialized with the credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub request_token: Option<String>,
    pub request_token_secret: Option<String>,
    pub oauth_verifier: Option<String>,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    pub note_store_url: Option<String>,
    pub web_api_url_prefix: Option<String>,
    /// Token expiry, seconds since the Unix epoch.
    pub token_expires_at: Option<u64>,
    pub user_id: Option<String>,
    pub cached_notebook_names: Vec<String>,
    #[serde(skip)]
    status: Option<String>,
    #[serde(skip)]
    last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// The most recent success message, if any operation has succeeded.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The most recent failure message, overwritten on every failed
    /// operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub(crate) fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    pub fn has_token_credentials(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether the token credentials have expired at `now` (seconds since
    /// the Unix epoch). There is no refresh; an expired token means the
    /// whole flow must be run again.
    pub fn is_token_expired(&self, now_secs: u64) -> bool {
        match self.token_expires_at {
            Some(expires) => now_secs >= expires,
            None => false,
        }
    }

    /// Clear every credential field, returning the session to the
    /// unauthenticated state. Safe to call on an already-empty session.
    /// The status/error feedback pair is left in place.
    pub fn reset(&mut self) {
        self.request_token = None;
        self.request_token_secret = None;
        self.oauth_verifier = None;
        self.access_token = None;
        self.access_token_secret = None;
        self.note_store_url = None;
        self.web_api_url_prefix = None;
        self.token_expires_at = None;
        self.user_id = None;
        self.cached_notebook_names.clear();
    }
}
