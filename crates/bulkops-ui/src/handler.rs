//! Handlers that may finish synchronously or asynchronously.

use std::future::Future;

use futures::future::BoxFuture;

/// Output of an action handler.
///
/// A handler either finishes immediately or hands back a pending
/// computation; [`resolve`](Self::resolve) awaits both the same way.
pub enum HandlerOutput {
    /// The handler already finished.
    Ready(Result<(), String>),
    /// The handler's work is still pending.
    Pending(BoxFuture<'static, Result<(), String>>),
}

impl HandlerOutput {
    /// Wrap a future as a pending output.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), String>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Wait for the handler to finish.
    pub async fn resolve(self) -> Result<(), String> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(future) => future.await,
        }
    }
}

impl From<()> for HandlerOutput {
    fn from(_: ()) -> Self {
        Self::Ready(Ok(()))
    }
}

impl From<Result<(), String>> for HandlerOutput {
    fn from(result: Result<(), String>) -> Self {
        Self::Ready(result)
    }
}

impl std::fmt::Debug for HandlerOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unit_is_ready() {
        let output = HandlerOutput::from(());
        assert!(output.is_ready());
        assert_eq!(futures::executor::block_on(output.resolve()), Ok(()));
    }

    #[test]
    fn test_pending_resolves() {
        let output = HandlerOutput::pending(async { Err("denied".to_string()) });
        assert!(!output.is_ready());
        assert_eq!(
            futures::executor::block_on(output.resolve()),
            Err("denied".to_string())
        );
    }
}
