use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AuthorizationSigner, Error, FlowError, Result, Session};

/// The three OAuth endpoints of the authorization server. Configured by
/// the host application, never hardcoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OAuthEndpoints {
    pub temporary_credentials_url: String,
    pub authorization_url: String,
    pub token_credentials_url: String,
}

/// Where the authorization server should send the resource owner back:
/// the scheme, host and port of the currently serving application.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackTarget {
    pub secure: bool,
    pub host: String,
    pub port: u16,
}

impl CallbackTarget {
    /// The full callback URL for a path on this target, carrying the
    /// fixed `action=callback` marker the callback route dispatches on.
    /// Default ports are omitted.
    pub fn callback_url(&self, path: &str) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let port = match self.port {
            80 | 443 => String::new(),
            other => format!(":{}", other),
        };
        format!(
            "{}://{}{}{}?{}",
            scheme,
            self.host,
            port,
            path,
            crate::CALLBACK_ACTION_QUERY
        )
    }
}

#[derive(Deserialize, Default)]
struct CallbackQuery {
    oauth_verifier: Option<String>,
}

/// Drives the three steps of RFC 5849 against a signer, reading and
/// writing the session's credential fields.
///
/// Step 1 obtains temporary credentials, step 2 captures the verifier
/// from the callback after the resource owner authorizes (or declines),
/// and step 3 exchanges the authorized temporary credentials for token
/// credentials. There is no retry and no refresh; callers check
/// [`Session::is_token_expired`] before using the result.
pub struct OAuthFlow<'a, S>
where
    S: AuthorizationSigner,
{
    signer: &'a S,
    endpoints: OAuthEndpoints,
    target: CallbackTarget,
}

impl<'a, S> OAuthFlow<'a, S>
where
    S: AuthorizationSigner,
{
    pub fn new(signer: &'a S, endpoints: OAuthEndpoints, target: CallbackTarget) -> Self {
        OAuthFlow {
            signer,
            endpoints,
            target,
        }
    }

    /// Step 1: request temporary credentials, announcing the callback URL
    /// derived from the target and `callback_path`.
    ///
    /// On success the request token pair is stored; on failure the session
    /// is left untouched apart from the last-error slot.
    pub async fn begin_authorization(
        &self,
        session: &mut Session,
        callback_path: &str,
    ) -> Result<()> {
        let callback = self.target.callback_url(callback_path);
        debug!(callback = %callback, "requesting temporary credentials");
        match self
            .signer
            .obtain_temporary_credentials(&self.endpoints.temporary_credentials_url, &callback)
            .await
        {
            Ok(resp) => {
                session.request_token = Some(resp.oauth_token);
                session.request_token_secret = Some(resp.oauth_token_secret);
                session.set_status("Obtained temporary credentials");
                Ok(())
            }
            Err(err) => {
                let message = match &err {
                    Error::TokenReader(_) => {
                        format!("Failed to obtain temporary credentials: {}", err)
                    }
                    _ => format!("Error obtaining temporary credentials: {}", err),
                };
                warn!("{}", message);
                session.set_error(message);
                Err(err)
            }
        }
    }

    /// Step 2, outbound half: the URL the resource owner is redirected to.
    ///
    /// Callers must have completed step 1; with no request token in the
    /// session the `oauth_token` parameter renders empty.
    pub fn authorization_url(&self, session: &Session) -> String {
        let token = session.request_token.as_deref().unwrap_or_default();
        let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
        format!(
            "{}?oauth_token={}",
            self.endpoints.authorization_url, encoded
        )
    }

    /// Step 2, inbound half: capture the verifier from the callback query
    /// string. A missing verifier means the resource owner declined.
    pub fn complete_authorization(&self, session: &mut Session, callback_query: &str) -> Result<()> {
        let query: CallbackQuery = serde_urlencoded::from_str(callback_query).unwrap_or_default();
        match query.oauth_verifier {
            Some(verifier) => {
                debug!("authorization callback carried a verifier");
                session.oauth_verifier = Some(verifier);
                session.set_status("Content owner authorized the temporary credentials");
                Ok(())
            }
            None => {
                session.set_error("Content owner did not authorize the temporary credentials");
                Err(FlowError::Declined.into())
            }
        }
    }

    /// Step 3: exchange the authorized temporary credentials for token
    /// credentials and store them with the endpoint data the response
    /// carries.
    ///
    /// Temporary credentials may be exchanged at most once per session; a
    /// repeat attempt fails without contacting the signer and leaves the
    /// existing token fields unchanged. Nothing is written on failure.
    pub async fn exchange_for_token_credentials(&self, session: &mut Session) -> Result<()> {
        if session.has_token_credentials() {
            session.set_error(
                "Temporary credentials may only be exchanged for token credentials once",
            );
            return Err(FlowError::AlreadyExchanged.into());
        }
        let token = session.request_token.clone().unwrap_or_default();
        let token_secret = session.request_token_secret.clone().unwrap_or_default();
        let verifier = session.oauth_verifier.clone().unwrap_or_default();
        match self
            .signer
            .exchange_token_credentials(
                &self.endpoints.token_credentials_url,
                &token,
                &token_secret,
                &verifier,
            )
            .await
        {
            Ok(resp) => {
                session.note_store_url = resp.note_store_url().map(str::to_string);
                session.web_api_url_prefix = resp.web_api_url_prefix().map(str::to_string);
                session.token_expires_at = resp.expires_at_secs();
                session.user_id = resp.user_id().map(str::to_string);
                session.access_token = Some(resp.oauth_token);
                session.access_token_secret = Some(resp.oauth_token_secret);
                session.set_status(
                    "Exchanged the authorized temporary credentials for token credentials",
                );
                Ok(())
            }
            Err(err) => {
                let message = match &err {
                    Error::TokenReader(_) => {
                        format!("Failed to obtain token credentials: {}", err)
                    }
                    _ => format!("Error obtaining token credentials: {}", err),
                };
                warn!("{}", message);
                session.set_error(message);
                Err(err)
            }
        }
    }
}
