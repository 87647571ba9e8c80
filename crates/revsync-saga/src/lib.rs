//! Compensable units of work and their sequential composition.
//!
//! A [`Transaction`] wraps three handlers (commit, rollback, close), each of
//! which runs at most once. A [`Saga`] commits its steps in order, stops at
//! the first failure and can unwind every step it attempted, newest first.
//! Because a `Saga` is itself a [`Transactor`], sagas nest.

mod error;
mod saga;
mod transaction;

pub use error::{ErrorChain, LayeredError};
pub use saga::Saga;
pub use transaction::{Transaction, Transactor};
