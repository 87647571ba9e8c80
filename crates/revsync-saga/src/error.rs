use std::fmt;

/// Two errors reported as one. Renders as `"<prior>: <latest>"`, each side
/// with its full context chain.
#[derive(Debug)]
pub struct LayeredError {
    prior: anyhow::Error,
    latest: anyhow::Error,
}

impl LayeredError {
    pub fn prior(&self) -> &anyhow::Error {
        &self.prior
    }

    pub fn latest(&self) -> &anyhow::Error {
        &self.latest
    }
}

impl fmt::Display for LayeredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}: {:#}", self.prior, self.latest)
    }
}

impl std::error::Error for LayeredError {}

/// Accumulates failures without stopping at the first one.
#[derive(Debug, Default)]
pub struct ErrorChain {
    inner: Option<anyhow::Error>,
}

impl ErrorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: anyhow::Error) {
        self.inner = Some(match self.inner.take() {
            None => err,
            Some(prior) => LayeredError { prior, latest: err }.into(),
        });
    }

    pub fn push_result(&mut self, result: anyhow::Result<()>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    pub fn current(&self) -> Option<&anyhow::Error> {
        self.inner.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    pub fn into_result(self) -> anyhow::Result<()> {
        match self.inner {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn empty_chain_is_ok() {
        let mut chain = ErrorChain::new();
        chain.push_result(Ok(()));
        assert!(chain.is_empty());
        assert!(chain.into_result().is_ok());
    }

    #[test]
    fn single_error_passes_through_untouched() {
        let mut chain = ErrorChain::new();
        chain.push(anyhow!("boom"));
        let err = chain.into_result().unwrap_err();
        assert!(err.downcast_ref::<LayeredError>().is_none());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn layers_render_oldest_first() {
        let mut chain = ErrorChain::new();
        chain.push(anyhow!("first"));
        chain.push(anyhow!("root cause").context("second"));
        chain.push(anyhow!("third"));
        let err = chain.into_result().unwrap_err();
        assert_eq!(err.to_string(), "first: second: root cause: third");
        let layered = err.downcast_ref::<LayeredError>().unwrap();
        assert_eq!(layered.latest().to_string(), "third");
    }
}
