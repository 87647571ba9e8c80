use std::fmt;

use reqwest::RequestBuilder;

#[derive(Clone, Default, PartialEq, Eq)]
pub enum Authenticator {
    #[default]
    Unauthenticated,
    ApiKey(String),
    Login {
        user: String,
        password: String,
    },
    Token(String),
}

impl Authenticator {
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Authenticator::Unauthenticated => request,
            Authenticator::ApiKey(key) => request.header("X-BUGZILLA-API-KEY", key),
            Authenticator::Login { user, password } => request
                .header("X-BUGZILLA-LOGIN", user)
                .header("X-BUGZILLA-PASSWORD", password),
            Authenticator::Token(token) => request.header("X-BUGZILLA-TOKEN", token),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::Unauthenticated => f.write_str("Unauthenticated"),
            Authenticator::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Authenticator::Login { user, .. } => f
                .debug_struct("Login")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Authenticator::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}
