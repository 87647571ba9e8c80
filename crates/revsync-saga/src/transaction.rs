use std::future::Future;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

/// Something that can move state forward, undo that move, and release
/// whatever it holds.
#[async_trait]
pub trait Transactor: Send {
    async fn commit(&mut self) -> anyhow::Result<()>;
    async fn rollback(&mut self, cause: &anyhow::Error) -> anyhow::Result<()>;
    async fn close(&mut self) -> anyhow::Result<()>;
}

type Work = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;
type Compensation = Box<dyn FnOnce(&anyhow::Error) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// Run-once state for a single handler. `None` inside `Pending` is the no-op.
enum Guard<F> {
    Pending(Option<F>),
    Done,
}

impl<F> Guard<F> {
    fn set(&mut self, handler: Option<F>) {
        *self = Guard::Pending(handler);
    }

    /// Hand out the handler on the first call; every later call gets `None`.
    fn fire(&mut self) -> Option<F> {
        match std::mem::replace(self, Guard::Done) {
            Guard::Pending(handler) => handler,
            Guard::Done => None,
        }
    }
}

/// A single compensable step built from closures.
///
/// Each handler executes at most once. A repeated call is a successful
/// no-op; it does not replay the first outcome.
///
/// A common pattern is a step whose commit takes a lock and whose close
/// releases it, placed first in a [`crate::Saga`] with auto-close enabled.
pub struct Transaction {
    commit: Guard<Work>,
    rollback: Guard<Compensation>,
    close: Guard<Work>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            commit: Guard::Pending(None),
            rollback: Guard::Pending(None),
            close: Guard::Pending(None),
        }
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit<F, Fut>(mut self, commit: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.commit.set(Some(Box::new(move || commit().boxed())));
        self
    }

    /// The handler receives the error that triggered the unwind.
    pub fn with_rollback<F, Fut>(mut self, rollback: F) -> Self
    where
        F: FnOnce(&anyhow::Error) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.rollback
            .set(Some(Box::new(move |cause: &anyhow::Error| rollback(cause).boxed())));
        self
    }

    pub fn with_close<F, Fut>(mut self, close: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.close.set(Some(Box::new(move || close().boxed())));
        self
    }

    pub fn without_commit(mut self) -> Self {
        self.commit.set(None);
        self
    }

    pub fn without_rollback(mut self) -> Self {
        self.rollback.set(None);
        self
    }

    pub fn without_close(mut self) -> Self {
        self.close.set(None);
        self
    }
}

#[async_trait]
impl Transactor for Transaction {
    async fn commit(&mut self) -> anyhow::Result<()> {
        match self.commit.fire() {
            Some(commit) => commit().await,
            None => Ok(()),
        }
    }

    async fn rollback(&mut self, cause: &anyhow::Error) -> anyhow::Result<()> {
        match self.rollback.fire() {
            Some(rollback) => rollback(cause).await,
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        match self.close.fire() {
            Some(close) => close().await,
            None => Ok(()),
        }
    }
}
