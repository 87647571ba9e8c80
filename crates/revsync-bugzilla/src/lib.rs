//! Client for the Bugzilla REST API (`<host>/rest`).

mod auth;
mod client;
mod error;
pub mod model;

pub use auth::Authenticator;
pub use client::BugzillaClient;
pub use error::{BugzillaError, BugzillaResult};
pub use model::{AttachmentCreate, Bug, BugCreate, BugUpdate, Comment};
