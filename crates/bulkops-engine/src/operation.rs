//! The per-item operation seam.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use bulkops_core::ItemFailure;
use futures::FutureExt;

/// Type alias for boxed futures returned by item operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An async operation applied to each source item.
///
/// Any `Fn(T) -> impl Future<Output = Result<(), E>>` with a displayable
/// error implements this trait, so closures wrapping API calls can be passed
/// directly.
pub trait ItemOperation<T>: Send + Sync {
    /// Run the operation for one item.
    fn run(&self, item: T) -> BoxFuture<'static, Result<(), ItemFailure>>;
}

impl<T, F, Fut, E> ItemOperation<T> for F
where
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    fn run(&self, item: T) -> BoxFuture<'static, Result<(), ItemFailure>> {
        let fut = self(item);
        Box::pin(async move { fut.await.map_err(|e| ItemFailure::from_display(&e)) })
    }
}

/// Run an operation, turning a panic inside it into an item failure.
pub(crate) async fn settle<T>(
    operation: &dyn ItemOperation<T>,
    item: T,
) -> Result<(), ItemFailure> {
    let outcome = AssertUnwindSafe(async move { operation.run(item).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(ItemFailure::new(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkops_core::DEFAULT_FAILURE_MESSAGE;

    #[tokio::test]
    async fn test_closure_error_message_captured() {
        let op = |n: u32| async move {
            if n == 0 {
                Err(format!("bad input {n}"))
            } else {
                Ok(())
            }
        };

        assert!(settle(&op, 1).await.is_ok());
        assert_eq!(settle(&op, 0).await.unwrap_err().message, "bad input 0");
    }

    #[tokio::test]
    async fn test_empty_error_message_falls_back() {
        let op = |_: u32| async { Err::<(), _>(String::new()) };
        assert_eq!(
            settle(&op, 1).await.unwrap_err().message,
            DEFAULT_FAILURE_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let op = |_: u32| async {
            if true {
                panic!("exploded");
            }
            Ok::<(), String>(())
        };
        assert_eq!(settle(&op, 1).await.unwrap_err().message, "exploded");
    }
}
