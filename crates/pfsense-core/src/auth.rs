//! Authentication strategies for the pfSense REST API.
//!
//! The API accepts either HTTP basic credentials of a local user or an API
//! key issued by the REST API package. Both are injected as request headers.

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Header carrying an API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// How requests authenticate against the appliance.
pub enum Authorization {
    /// `Authorization: Basic base64(username:password)`
    Basic {
        /// Local user name
        username: String,
        /// Local user password
        password: SecretString,
    },
    /// `X-API-Key: <token>`
    ApiKey {
        /// API key issued by the appliance
        token: SecretString,
    },
}

impl Authorization {
    /// Basic credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// API key credentials.
    #[must_use]
    pub fn api_key(token: impl Into<String>) -> Self {
        Self::ApiKey {
            token: SecretString::from(token.into()),
        }
    }

    /// Short name of the strategy, safe to log.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::ApiKey { .. } => "api_key",
        }
    }

    /// Add the authentication header to a request.
    #[must_use]
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Basic { username, password } => {
                request.basic_auth(username, Some(password.expose_secret()))
            }
            Self::ApiKey { token } => request.header(API_KEY_HEADER, token.expose_secret()),
        }
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::ApiKey { .. } => f
                .debug_struct("ApiKey")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}
