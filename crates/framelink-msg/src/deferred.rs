//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Single-shot completion handle settled from outside the task that awaits it.
///
/// The first of [`Deferred::resolve`] or [`Deferred::reject`] wins; every later
/// call is a no-op and returns `false`.
pub struct Deferred<T, E> {
    sender: Mutex<Option<oneshot::Sender<Result<T, E>>>>,
}

impl<T, E> Deferred<T, E> {
    /// Create a handle together with the future it completes.
    pub fn channel() -> (Self, DeferredFuture<T, E>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(sender)),
            },
            DeferredFuture {
                receiver: Some(receiver),
            },
        )
    }

    /// Complete the future with a value.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Complete the future with an error.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Whether resolve or reject has already taken effect.
    pub fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            return false;
        };
        // A dropped receiver still counts as settled.
        let _ = sender.send(outcome);
        true
    }
}

/// Awaitable side of a [`Deferred`].
///
/// If the handle is dropped without being settled the future never completes;
/// callers that need a bound must wrap it in their own timeout.
pub struct DeferredFuture<T, E> {
    /// `None` once the handle was dropped unsettled.
    receiver: Option<oneshot::Receiver<Result<T, E>>>,
}

impl<T, E> Future for DeferredFuture<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Pending;
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Handle dropped unsettled: stay pending, nothing will wake us.
            Poll::Ready(Err(_)) => {
                self.receiver = None;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
