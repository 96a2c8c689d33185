use std::borrow::Cow;

/// Source of the consumer key pair (and, once granted, a token pair) used
/// to sign OAuth exchanges.
pub trait SecretsProvider {
    fn consumer_key_pair(&self) -> (&str, &str);

    fn token_pair_option(&self) -> Option<(&str, &str)> {
        None
    }
}

/// Consumer credentials issued by the service, optionally carrying a token
/// pair obtained through the authorization flow.
#[derive(Debug, Clone)]
pub struct Secrets<'a> {
    consumer_key: Cow<'a, str>,
    consumer_secret: Cow<'a, str>,
    token: Option<(Cow<'a, str>, Cow<'a, str>)>,
}

impl<'a> Secrets<'a> {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<Cow<'a, str>>,
        TSecret: Into<Cow<'a, str>>,
    {
        Secrets {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: None,
        }
    }

    pub fn token<TKey, TSecret>(self, token: TKey, token_secret: TSecret) -> Self
    where
        TKey: Into<Cow<'a, str>>,
        TSecret: Into<Cow<'a, str>>,
    {
        Secrets {
            token: Some((token.into(), token_secret.into())),
            ..self
        }
    }
}

impl SecretsProvider for Secrets<'_> {
    fn consumer_key_pair(&self) -> (&str, &str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn token_pair_option(&self) -> Option<(&str, &str)> {
        self.token.as_ref().map(|(t, s)| (t.as_ref(), s.as_ref()))
    }
}
