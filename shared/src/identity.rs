use async_trait::async_trait;
use lambda_http::http::HeaderMap;

/// Resolves who is calling. Every task operation is scoped to the identity
/// returned here; swapping in real authentication means replacing this
/// provider and nothing else.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when the request carries no usable identity.
    async fn caller_identity(&self, headers: &HeaderMap) -> Option<String>;
}

/// Placeholder identity: the named header's value, taken verbatim and
/// unverified, with an optional fallback when the header is absent or empty.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: String,
    fallback: Option<String>,
}

impl HeaderIdentity {
    pub fn new(header: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            header: header.into(),
            fallback,
        }
    }
}

#[async_trait]
impl IdentityProvider for HeaderIdentity {
    async fn caller_identity(&self, headers: &HeaderMap) -> Option<String> {
        let Some(value) = headers.get(self.header.as_str()) else {
            return self.fallback.clone();
        };
        // A present but undecodable value must not turn into the fallback user.
        match std::str::from_utf8(value.as_bytes()) {
            Ok("") => self.fallback.clone(),
            Ok(v) => Some(v.to_string()),
            Err(_) => {
                tracing::warn!("Identity header {} is not valid UTF-8", self.header);
                None
            }
        }
    }
}
