use std::fmt;

use reqwest::RequestBuilder;

/// Credentials attached to every request.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Authenticator {
    #[default]
    Unauthenticated,
    Basic {
        user: String,
        password: String,
    },
    Bearer(String),
}

impl Authenticator {
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Authenticator::Unauthenticated => request,
            Authenticator::Basic { user, password } => request.basic_auth(user, Some(password)),
            Authenticator::Bearer(token) => request.bearer_auth(token),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::Unauthenticated => f.write_str("Unauthenticated"),
            Authenticator::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Authenticator::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}
