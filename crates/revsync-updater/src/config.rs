use std::fmt;

use revsync_bugzilla::BugzillaError;
use revsync_kinto::{Authenticator, Collection, KintoError};

pub const DEFAULT_PRODUCTION_URL: &str = "https://settings.prod.mozaws.net/v1";
pub const DEFAULT_STAGING_URL: &str = "https://settings.stage.mozaws.net/v1";
pub const DEFAULT_BUCKET: &str = "security-state";
pub const DEFAULT_COLLECTION: &str = "onecrl";
pub const DEFAULT_BUGZILLA_URL: &str = "https://bugzilla.mozilla.org";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {environment} Kinto principal: {reason}")]
    InvalidPrincipal {
        environment: String,
        reason: &'static str,
    },
    #[error("malformed Bugzilla CC list '{value}': {source}")]
    CcAccounts {
        value: String,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Kinto(#[from] KintoError),
    #[error(transparent)]
    Bugzilla(#[from] BugzillaError),
}

/// Everything one run needs. Built once at startup and handed to
/// [`crate::Updater::from_config`].
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub production: StoreConfig,
    pub staging: StoreConfig,
    pub bugzilla: BugzillaConfig,
    pub report_url: String,
}

/// Where a OneCRL collection lives and who to talk to it as.
#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub bucket: String,
    pub collection: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bucket: DEFAULT_BUCKET.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            user: None,
            password: None,
            token: None,
        }
    }

    pub fn collection(&self) -> Collection {
        Collection::new(&self.bucket, &self.collection)
    }

    pub fn authenticator(&self, environment: &str) -> Result<Authenticator, ConfigError> {
        resolve_principal(
            self.user.as_deref(),
            self.password.as_deref(),
            self.token.as_deref(),
        )
        .map_err(|reason| ConfigError::InvalidPrincipal {
            environment: environment.to_string(),
            reason,
        })
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("bucket", &self.bucket)
            .field("collection", &self.collection)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone)]
pub struct BugzillaConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub cc: Vec<String>,
}

impl fmt::Debug for BugzillaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BugzillaConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("cc", &self.cc)
            .finish()
    }
}

/// Pick the Kinto authenticator from the configured credentials. Empty
/// values count as unset.
///
/// Either a user and password pair, a token alone, or nothing at all.
pub fn resolve_principal(
    user: Option<&str>,
    password: Option<&str>,
    token: Option<&str>,
) -> Result<Authenticator, &'static str> {
    fn set(value: Option<&str>) -> Option<&str> {
        value.filter(|v| !v.is_empty())
    }
    match (set(user), set(password), set(token)) {
        (None, None, None) => Ok(Authenticator::Unauthenticated),
        (Some(user), Some(password), None) => Ok(Authenticator::Basic {
            user: user.to_string(),
            password: password.to_string(),
        }),
        (None, None, Some(token)) => Ok(Authenticator::Bearer(token.to_string())),
        (Some(_), None, None) => Err("a user was set without a password"),
        (None, Some(_), None) => Err("a password was set without a user"),
        (_, _, Some(_)) => Err("a token cannot be combined with a user or password"),
    }
}

/// Parse the CC list: the first row of a CSV document, so quoted entries
/// may contain commas.
pub fn parse_cc_accounts(value: &str) -> Result<Vec<String>, ConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(value.as_bytes());
    let Some(row) = reader.records().next() else {
        return Ok(Vec::new());
    };
    let row = row.map_err(|source| ConfigError::CcAccounts {
        value: value.to_string(),
        source,
    })?;
    Ok(row
        .iter()
        .filter(|account| !account.is_empty())
        .map(str::to_string)
        .collect())
}
