use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ErrorChain;
use crate::transaction::Transactor;

/// An ordered sequence of [`Transactor`]s committed first to last.
///
/// Every step whose commit was invoked, successful or not, is remembered.
/// Only those steps are rolled back and closed, newest first.
pub struct Saga {
    queue: Vec<Box<dyn Transactor>>,
    attempted: Vec<usize>,
    committed: bool,
    auto_rollback: bool,
    auto_close: bool,
}

impl Saga {
    pub fn start() -> Self {
        Self {
            queue: Vec::new(),
            attempted: Vec::new(),
            committed: false,
            auto_rollback: false,
            auto_close: false,
        }
    }

    pub fn then(mut self, step: impl Transactor + 'static) -> Self {
        self.queue.push(Box::new(step));
        self
    }

    /// Roll back every attempted step when [`Transactor::commit`] fails.
    /// Errors from the rollback are layered onto the commit error.
    pub fn auto_rollback_on_error(mut self, enabled: bool) -> Self {
        self.auto_rollback = enabled;
        self
    }

    /// Close every attempted step as the last act of
    /// [`Transactor::commit`], whether it succeeded or not. Runs after any
    /// automatic rollback has finished.
    pub fn auto_close(mut self, enabled: bool) -> Self {
        self.auto_close = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Indices (into the order of [`Saga::then`] calls) of every step whose
    /// commit has been invoked.
    pub fn attempted(&self) -> &[usize] {
        &self.attempted
    }

    async fn commit_steps(&mut self) -> anyhow::Result<()> {
        for index in 0..self.queue.len() {
            self.attempted.push(index);
            debug!(step = index, "committing saga step");
            if let Err(err) = self.queue[index].commit().await {
                warn!(step = index, error = %format!("{err:#}"), "saga step failed to commit");
                return Err(err);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Transactor for Saga {
    /// Commits each step in order, stopping at the first failure.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    async fn commit(&mut self) -> anyhow::Result<()> {
        if std::mem::replace(&mut self.committed, true) {
            return Ok(());
        }
        let mut errors = ErrorChain::new();
        errors.push_result(self.commit_steps().await);

        if self.auto_rollback {
            let rollback = match errors.current() {
                Some(cause) => Some(self.rollback(cause).await),
                None => None,
            };
            if let Some(result) = rollback {
                errors.push_result(result);
            }
        }
        if self.auto_close {
            let closed = self.close().await;
            errors.push_result(closed);
        }
        errors.into_result()
    }

    async fn rollback(&mut self, cause: &anyhow::Error) -> anyhow::Result<()> {
        let mut errors = ErrorChain::new();
        for &index in self.attempted.iter().rev() {
            debug!(step = index, "rolling back saga step");
            errors.push_result(self.queue[index].rollback(cause).await);
        }
        errors.into_result()
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        let mut errors = ErrorChain::new();
        for &index in self.attempted.iter().rev() {
            debug!(step = index, "closing saga step");
            errors.push_result(self.queue[index].close().await);
        }
        errors.into_result()
    }
}
