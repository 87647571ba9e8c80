//! Client for the Kinto REST API (v1) and its signer review workflow.
//!
//! Records are stored as plain JSON objects under
//! `/buckets/{bucket}/collections/{collection}/records`. The client is
//! generic over the record type; callers bring their own serde model.

mod auth;
mod client;
mod collection;
mod error;
mod signer;

pub use auth::Authenticator;
pub use client::KintoClient;
pub use collection::{Collection, Deleted};
pub use error::{KintoError, KintoResult};
pub use signer::SignerStatus;
