//! Bridging of one-shot host callbacks into futures.
//!
//! Plugin calls answer through a pair of success/failure callbacks, exactly one of which fires. [`pair`] returns the
//! two halves of that exchange: [`Callbacks`] is handed to the code wiring up the host call, and [`CallbackFuture`]
//! is awaited by the caller.
//!
//! ```
//!# futures_lite::future::block_on(async {
//!let (callbacks, result) = blueadv::callback::pair::<u32>();
//!std::thread::spawn(move || callbacks.success(42));
//!assert_eq!(result.await.unwrap(), 42);
//!# });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_channel::{Receiver, Sender};
use futures_core::Stream;

use crate::error::{Error, ErrorKind};
use crate::Result;

/// Creates a connected [`Callbacks`]/[`CallbackFuture`] pair.
pub fn pair<T>() -> (Callbacks<T>, CallbackFuture<T>) {
    let (sender, receiver) = async_channel::bounded(1);
    (
        Callbacks { sender },
        CallbackFuture {
            receiver: Box::pin(receiver),
        },
    )
}

/// The answering half. Consumed by the first callback that fires.
#[derive(Debug)]
pub struct Callbacks<T> {
    sender: Sender<Result<T>>,
}

impl<T> Callbacks<T> {
    /// Completes the call successfully.
    pub fn success(self, value: T) {
        self.complete(Ok(value))
    }

    /// Completes the call with an error.
    pub fn failure(self, err: Error) {
        self.complete(Err(err))
    }

    /// Completes the call with `result`.
    pub fn complete(self, result: Result<T>) {
        // the waiting side may already be gone
        let _ = self.sender.try_send(result);
    }
}

/// The waiting half. Resolves to the value passed to [`Callbacks`], or to a
/// [`Cancelled`][ErrorKind::Cancelled] error if the callbacks are dropped without firing.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct CallbackFuture<T> {
    receiver: Pin<Box<Receiver<Result<T>>>>,
}

impl<T> Future for CallbackFuture<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.receiver.as_mut().poll_next(cx) {
            Poll::Ready(Some(result)) => Poll::Ready(result),
            Poll::Ready(None) => Poll::Ready(Err(Error::new(
                ErrorKind::Cancelled,
                None,
                "callbacks dropped without being called",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}
