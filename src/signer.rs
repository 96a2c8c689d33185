use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::Method;
use oauth1_request::signer::Signer as OAuthSigner;
use oauth1_request::{HmacSha1, Options};
use reqwest::Client as ReqwestClient;
use url::Url;

use crate::token_reader::TokenReaderFuture;
use crate::{Error, Result, SecretsProvider, TokenResponse};

/// The capability the flow controller drives: perform the signed HTTP
/// exchanges of RFC 5849 steps 1 and 3 and hand back the parsed token
/// response. The authorization redirect in between never touches the
/// signer.
#[async_trait(?Send)]
pub trait AuthorizationSigner {
    /// RFC 5849 §2.1: obtain temporary credentials, announcing the
    /// callback URL the resource owner will be sent back to.
    async fn obtain_temporary_credentials(
        &self,
        endpoint: &str,
        callback_url: &str,
    ) -> Result<TokenResponse>;

    /// RFC 5849 §2.3: exchange the authorized temporary credentials plus
    /// verifier for token credentials.
    async fn exchange_token_credentials(
        &self,
        endpoint: &str,
        token: &str,
        token_secret: &str,
        verifier: &str,
    ) -> Result<TokenResponse>;
}

/// `AuthorizationSigner` over plain HTTPS: HMAC-SHA1 signatures via
/// `oauth1-request`, transport via `reqwest`. A signature goes in the
/// `Authorization` header of an otherwise empty POST.
#[derive(Debug, Clone)]
pub struct HttpSigner<'a, T>
where
    T: SecretsProvider,
{
    secrets: &'a T,
    client: ReqwestClient,
}

impl<'a, T> HttpSigner<'a, T>
where
    T: SecretsProvider,
{
    pub fn new(secrets: &'a T) -> Self {
        HttpSigner {
            secrets,
            client: ReqwestClient::new(),
        }
    }

    /// Construct with a preconfigured `reqwest::Client` (timeouts, proxy,
    /// and so on).
    pub fn with_client(secrets: &'a T, client: ReqwestClient) -> Self {
        HttpSigner { secrets, client }
    }

    fn authorization_header(
        &self,
        method: &Method,
        url: &Url,
        options: &Options<'_>,
        token_secret: Option<&str>,
    ) -> String {
        let (consumer_key, consumer_secret) = self.secrets.consumer_key_pair();
        let signer = OAuthSigner::form_with_signature_method(
            HmacSha1,
            method.as_str(),
            url.clone(),
            consumer_secret,
            token_secret,
        );
        signer
            .oauth_parameters(consumer_key, options)
            .finish()
            .authorization
    }
}

#[async_trait(?Send)]
impl<T> AuthorizationSigner for HttpSigner<'_, T>
where
    T: SecretsProvider,
{
    async fn obtain_temporary_credentials(
        &self,
        endpoint: &str,
        callback_url: &str,
    ) -> Result<TokenResponse> {
        let url = Url::parse(endpoint).map_err(|e| Error::BadEndpoint(e.to_string()))?;
        let mut options = Options::new();
        options.callback(callback_url);
        let authorization = self.authorization_header(&Method::POST, &url, &options, None);
        self.client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .parse_oauth_token()
            .await
    }

    async fn exchange_token_credentials(
        &self,
        endpoint: &str,
        token: &str,
        token_secret: &str,
        verifier: &str,
    ) -> Result<TokenResponse> {
        let url = Url::parse(endpoint).map_err(|e| Error::BadEndpoint(e.to_string()))?;
        let mut options = Options::new();
        options.token(token);
        options.verifier(verifier);
        let authorization =
            self.authorization_header(&Method::POST, &url, &options, Some(token_secret));
        self.client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .parse_oauth_token()
            .await
    }
}
