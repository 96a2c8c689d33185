/*!
notestore-oauth1: three-legged OAuth 1.0a sign-in and a note-store API wrapper.

# Overview

This library walks a web user through the three steps of RFC 5849 against a
note-taking service and then wraps the authenticated remote calls that
follow. HMAC signing is delegated to [oauth1-request](https://crates.io/crates/oauth1-request)
and the HTTP exchanges to [reqwest](https://crates.io/crates/reqwest); the
note-store RPC client itself is an opaque capability behind the
[`NoteStoreRpc`] trait.

# How to use

```rust,no_run
use notestore_oauth1::{
    CallbackTarget, HttpSigner, NoteStore, OAuthEndpoints, OAuthFlow, Secrets, Session,
};

# async fn run(connector: impl notestore_oauth1::RpcConnector) -> notestore_oauth1::Result<()> {
// prepare consumer credentials and the authorization server's endpoints
let secrets = Secrets::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]");
let signer = HttpSigner::new(&secrets);
let flow = OAuthFlow::new(
    &signer,
    OAuthEndpoints {
        temporary_credentials_url: "https://sandbox.example.com/oauth".into(),
        authorization_url: "https://sandbox.example.com/OAuth.action".into(),
        token_credentials_url: "https://sandbox.example.com/oauth".into(),
    },
    CallbackTarget {
        secure: true,
        host: "app.example.com".into(),
        port: 443,
    },
);

// step 1: obtain temporary credentials, then redirect the user
let mut session = Session::new();
flow.begin_authorization(&mut session, "/index.php").await?;
let redirect_to = flow.authorization_url(&session);

// step 2: the user authorizes and comes back with a verifier
flow.complete_authorization(&mut session, "oauth_verifier=...")?;

// step 3: exchange for token credentials
flow.exchange_for_token_credentials(&mut session).await?;

// the session now carries the access token and the note-store URL
let store = NoteStore::new(connector);
let notebooks = store.list_notebooks(&mut session).await?;
for notebook in &notebooks {
    println!("{}", notebook.name);
}
# Ok(())
# }
```

Every operation records a success message or a normalized failure message
in the session; a presentation layer reads them via [`Session::status`] and
[`Session::last_error`]. Nothing is retried automatically, and the
temporary credentials can be exchanged at most once per session.
*/
mod endpoint;
pub mod enml;
mod error;
mod flow;
mod models;
mod notestore;
mod rpc;
mod secrets;
mod session;
mod signer;
mod token_reader;

// exposed to external program
pub use endpoint::Endpoint;
pub use error::{
    error_code_name, normalize, Error, FlowError, Result, ServiceError, ServiceErrorKind,
    ServiceResult, TokenReaderError, TokenReaderResult,
};
pub use flow::{CallbackTarget, OAuthEndpoints, OAuthFlow};
pub use models::{Note, NoteFilter, NoteLimits, NoteSortOrder, Notebook};
pub use notestore::NoteStore;
pub use rpc::{NoteStoreRpc, RpcConnector};
pub use secrets::{Secrets, SecretsProvider};
pub use session::Session;
pub use signer::{AuthorizationSigner, HttpSigner};
pub use token_reader::{TokenReader, TokenReaderFuture, TokenResponse};

// exposed constant variables
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// The query marker appended to every callback URL.
pub const CALLBACK_ACTION_QUERY: &str = "action=callback";
