//! Push-based value streams.
//!
//! An [`Observable`] is a single-subscription sequence of values pushed
//! by an [`Emitter`] at arbitrary times. Errors are delivered in-band
//! and do not terminate the sequence; only the explicit completion
//! signal does. A dropped emitter stops production without completing,
//! mirroring a producer that silently goes away.

use gqlweave_core::error::{Error, Result};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A signal pushed by a producer.
#[derive(Debug)]
pub enum Signal {
    /// A produced value.
    Item(Value),
    /// A producer-side error. Does not terminate the sequence.
    Error(Error),
    /// Explicit completion. No further signals follow.
    Complete,
}

/// Producer handle for an [`Observable`].
#[derive(Clone)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<Signal>,
}

impl Emitter {
    /// Pushes a value.
    pub fn item(&self, value: impl Into<Value>) {
        let _ = self.tx.send(Signal::Item(value.into()));
    }

    /// Pushes an error.
    pub fn error(&self, error: Error) {
        let _ = self.tx.send(Signal::Error(error));
    }

    /// Signals completion.
    pub fn complete(&self) {
        let _ = self.tx.send(Signal::Complete);
    }
}

/// A push-based stream of values bound to a single subscriber.
pub struct Observable {
    rx: mpsc::UnboundedReceiver<Signal>,
}

impl Observable {
    /// Creates a producer/observable pair.
    pub fn channel() -> (Emitter, Observable) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Emitter { tx }, Observable { rx })
    }

    /// An observable that emits the given values and completes.
    pub fn of<I>(items: I) -> Observable
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let (emitter, observable) = Self::channel();
        for item in items {
            emitter.item(item);
        }
        emitter.complete();
        observable
    }

    /// Subscribes with item, error and completion callbacks.
    ///
    /// The subscription runs on a spawned task until the completion
    /// signal arrives or every producer handle is dropped; only the
    /// explicit completion signal invokes `on_complete`.
    pub fn subscribe<I, E, C>(self, on_item: I, on_error: E, on_complete: C) -> SubscriptionHandle
    where
        I: FnMut(Value) + Send + 'static,
        E: FnMut(Error) + Send + 'static,
        C: FnMut() + Send + 'static,
    {
        let mut rx = self.rx;
        let mut on_item = on_item;
        let mut on_error = on_error;
        let mut on_complete = on_complete;
        let task = tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                match signal {
                    Signal::Item(value) => on_item(value),
                    Signal::Error(error) => on_error(error),
                    Signal::Complete => {
                        on_complete();
                        break;
                    }
                }
            }
        });
        SubscriptionHandle { task }
    }

    /// Collects every value emitted before completion, in emission
    /// order.
    ///
    /// Resolves early with an error if one is signalled. A producer that
    /// goes away without completing ends the collection with whatever
    /// was emitted.
    pub async fn collect(mut self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        while let Some(signal) = self.rx.recv().await {
            match signal {
                Signal::Item(value) => items.push(value),
                Signal::Error(error) => return Err(error),
                Signal::Complete => break,
            }
        }
        Ok(items)
    }

    /// Resolves with the first emitted value, or `None` if the sequence
    /// completes without emitting.
    pub async fn first(mut self) -> Result<Option<Value>> {
        while let Some(signal) = self.rx.recv().await {
            match signal {
                Signal::Item(value) => return Ok(Some(value)),
                Signal::Error(error) => return Err(error),
                Signal::Complete => break,
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

/// Handle to a running subscription task.
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Aborts the subscription task.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Returns true once the subscription task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the subscription task to finish.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_of_collects_in_order() {
        let observable = Observable::of([json!(1), json!(2), json!(3)]);
        assert_eq!(
            observable.collect().await.unwrap(),
            vec![json!(1), json!(2), json!(3)]
        );
    }

    #[tokio::test]
    async fn test_first_takes_only_first() {
        let observable = Observable::of([json!("a"), json!("b")]);
        assert_eq!(observable.first().await.unwrap(), Some(json!("a")));
    }

    #[tokio::test]
    async fn test_first_on_empty_sequence() {
        let observable = Observable::of(Vec::<Value>::new());
        assert_eq!(observable.first().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_collect_stops_on_error() {
        let (emitter, observable) = Observable::channel();
        emitter.item(json!(1));
        emitter.error(Error::Function("boom".to_string()));

        let error = observable.collect().await.unwrap_err();
        assert_eq!(error.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_subscribe_callbacks() {
        let (emitter, observable) = Observable::channel();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(Mutex::new(false));

        let handle = observable.subscribe(
            {
                let seen = Arc::clone(&seen);
                move |value| seen.lock().unwrap().push(value)
            },
            {
                let errors = Arc::clone(&errors);
                move |error| errors.lock().unwrap().push(error.to_string())
            },
            {
                let completed = Arc::clone(&completed);
                move || *completed.lock().unwrap() = true
            },
        );

        emitter.item(json!("x"));
        emitter.error(Error::Function("mid-stream".to_string()));
        emitter.item(json!("y"));
        emitter.complete();
        handle.wait().await;

        assert_eq!(*seen.lock().unwrap(), vec![json!("x"), json!("y")]);
        assert_eq!(*errors.lock().unwrap(), vec!["mid-stream"]);
        assert!(*completed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_dropped_emitter_does_not_complete() {
        let (emitter, observable) = Observable::channel();
        let completed = Arc::new(Mutex::new(false));

        let handle = observable.subscribe(
            |_| {},
            |_| {},
            {
                let completed = Arc::clone(&completed);
                move || *completed.lock().unwrap() = true
            },
        );

        drop(emitter);
        handle.wait().await;

        assert!(!*completed.lock().unwrap());
    }
}
