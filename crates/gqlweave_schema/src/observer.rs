//! Push-to-pull bridge for subscription streams.
//!
//! A subscription field produces a push-based [`Observable`], but the
//! executable schema consumes values by pulling. [`StreamObserver`]
//! pairs the two sides as a rendezvous: every produced item either
//! satisfies the oldest waiting [`StreamObserver::next`] call or is
//! buffered, and every `next` call either drains the buffer or waits
//! its turn. At any instant at most one of the two queues is non-empty.

use gqlweave_core::error::{Error, Result};
use gqlweave_functions::observable::{Observable, SubscriptionHandle};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

/// One step of pull-based iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterStep {
    /// The produced item, wrapped under the observed field's name: the
    /// shape the executable schema expects from a subscription source.
    pub value: Value,
    /// True once the upstream sequence has completed.
    pub done: bool,
}

#[derive(Default)]
struct ObserverState {
    pending: VecDeque<oneshot::Sender<IterStep>>,
    ready: VecDeque<IterStep>,
    done: bool,
}

/// Bridges one stream subscription into pull-based iteration.
///
/// The observer subscribes eagerly at construction and stays bound to
/// that one subscription for its whole life. Items reach consumers in
/// production order, exactly once each; an upstream error is delivered
/// like an item, with the error as the payload, and does not terminate
/// the sequence. Completion delivers exactly one terminal step, after
/// which every further pull resolves immediately as done.
pub struct StreamObserver {
    field_name: String,
    state: Arc<Mutex<ObserverState>>,
    subscription: SubscriptionHandle,
}

impl StreamObserver {
    /// Binds to `observable` and subscribes immediately.
    pub fn new(field: impl Into<String>, observable: Observable) -> Result<Self> {
        let field_name = field.into();
        if field_name.is_empty() {
            return Err(Error::Schema(
                "observer field name must be a non-empty string".to_string(),
            ));
        }

        let state = Arc::new(Mutex::new(ObserverState::default()));
        let on_item = {
            let state = Arc::clone(&state);
            let field = field_name.clone();
            move |item: Value| {
                let mut state = lock(&state);
                deliver(&mut state, &field, item);
            }
        };
        let on_error = {
            let state = Arc::clone(&state);
            let field = field_name.clone();
            move |error: Error| {
                let mut state = lock(&state);
                deliver(&mut state, &field, Value::String(error.to_string()));
            }
        };
        let on_complete = {
            let state = Arc::clone(&state);
            let field = field_name.clone();
            move || {
                let mut state = lock(&state);
                state.done = true;
                deliver(&mut state, &field, Value::Null);
            }
        };
        let subscription = observable.subscribe(on_item, on_error, on_complete);

        Ok(Self {
            field_name,
            state,
            subscription,
        })
    }

    /// The field name items are wrapped under.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Resolves with the next step.
    ///
    /// Buffered steps are returned immediately in production order.
    /// After the upstream completes and the buffer drains, every call
    /// resolves immediately with a terminal step instead of hanging.
    pub async fn next(&self) -> IterStep {
        let receiver = {
            let mut state = lock(&self.state);
            if let Some(step) = state.ready.pop_front() {
                return step;
            }
            if state.done {
                return self.terminal_step();
            }
            let (sender, receiver) = oneshot::channel();
            state.pending.push_back(sender);
            receiver
        };
        match receiver.await {
            Ok(step) => step,
            // The observer was closed or dropped while we waited.
            Err(_) => self.terminal_step(),
        }
    }

    /// Cancels the bridge.
    ///
    /// Marks the sequence done, resolves every outstanding `next` call
    /// with a terminal step and stops consuming the upstream, so no
    /// pull outlives a disconnected consumer.
    pub fn close(&self) {
        self.subscription.abort();
        let mut state = lock(&self.state);
        state.done = true;
        while let Some(sender) = state.pending.pop_front() {
            let _ = sender.send(IterStep {
                value: wrap(&self.field_name, Value::Null),
                done: true,
            });
        }
    }

    /// Consumes the observer as a stream of the non-terminal steps.
    ///
    /// The stream ends when the terminal step is reached; this is the
    /// shape handed to the executable schema for subscription fields.
    pub fn into_stream(self) -> impl futures::Stream<Item = IterStep> + Send {
        futures::stream::unfold(self, |observer| async move {
            let step = observer.next().await;
            if step.done {
                None
            } else {
                Some((step, observer))
            }
        })
    }

    fn terminal_step(&self) -> IterStep {
        IterStep {
            value: wrap(&self.field_name, Value::Null),
            done: true,
        }
    }
}

impl Drop for StreamObserver {
    fn drop(&mut self) {
        self.subscription.abort();
    }
}

impl std::fmt::Debug for StreamObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("StreamObserver")
            .field("field_name", &self.field_name)
            .field("pending", &state.pending.len())
            .field("ready", &state.ready.len())
            .field("done", &state.done)
            .finish()
    }
}

fn wrap(field: &str, payload: Value) -> Value {
    let mut object = serde_json::Map::with_capacity(1);
    object.insert(field.to_string(), payload);
    Value::Object(object)
}

/// Satisfies the oldest waiting consumer or buffers the step.
fn deliver(state: &mut ObserverState, field: &str, payload: Value) {
    let step = IterStep {
        value: wrap(field, payload),
        done: state.done,
    };
    if let Some(sender) = state.pending.pop_front() {
        let _ = sender.send(step);
    } else {
        state.ready.push_back(step);
    }
}

fn lock(state: &Mutex<ObserverState>) -> MutexGuard<'_, ObserverState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use gqlweave_functions::observable::Observable;
    use serde_json::json;

    fn step(field: &str, payload: Value, done: bool) -> IterStep {
        IterStep {
            value: wrap(field, payload),
            done,
        }
    }

    #[test]
    fn test_empty_field_name_is_rejected() {
        let observable = Observable::of(Vec::<Value>::new());
        assert!(StreamObserver::new("", observable).is_err());
    }

    #[tokio::test]
    async fn test_pulls_after_buffered_emissions() {
        let observer =
            StreamObserver::new("foo", Observable::of([json!(1), json!(2), json!(3)])).unwrap();
        // Give the subscription task a chance to drain the source.
        tokio::task::yield_now().await;

        assert_eq!(observer.next().await, step("foo", json!(1), false));
        assert_eq!(observer.next().await, step("foo", json!(2), false));
        assert_eq!(observer.next().await, step("foo", json!(3), false));
        assert_eq!(observer.next().await, step("foo", Value::Null, true));
    }

    #[tokio::test]
    async fn test_pulls_before_emissions() {
        let (emitter, observable) = Observable::channel();
        let observer = Arc::new(StreamObserver::new("foo", observable).unwrap());

        let puller = {
            let observer = Arc::clone(&observer);
            tokio::spawn(async move {
                vec![
                    observer.next().await,
                    observer.next().await,
                    observer.next().await,
                ]
            })
        };

        emitter.item(json!("a"));
        emitter.item(json!("b"));
        emitter.complete();

        let steps = puller.await.unwrap();
        assert_eq!(
            steps,
            vec![
                step("foo", json!("a"), false),
                step("foo", json!("b"), false),
                step("foo", Value::Null, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_next_after_completion_never_hangs() {
        let observer = StreamObserver::new("foo", Observable::of(Vec::<Value>::new())).unwrap();
        tokio::task::yield_now().await;

        for _ in 0..3 {
            assert_eq!(observer.next().await, step("foo", Value::Null, true));
        }
    }

    #[tokio::test]
    async fn test_error_is_delivered_like_an_item() {
        let (emitter, observable) = Observable::channel();
        let observer = StreamObserver::new("foo", observable).unwrap();

        emitter.error(Error::Function("boom".to_string()));
        emitter.item(json!("after"));
        emitter.complete();
        tokio::task::yield_now().await;

        assert_eq!(observer.next().await, step("foo", json!("boom"), false));
        assert_eq!(observer.next().await, step("foo", json!("after"), false));
        assert_eq!(observer.next().await, step("foo", Value::Null, true));
    }

    #[tokio::test]
    async fn test_close_resolves_pending_pulls() {
        let (_emitter, observable) = Observable::channel();
        let observer = Arc::new(StreamObserver::new("foo", observable).unwrap());

        let pending = {
            let observer = Arc::clone(&observer);
            tokio::spawn(async move { observer.next().await })
        };
        tokio::task::yield_now().await;

        observer.close();
        assert_eq!(pending.await.unwrap(), step("foo", Value::Null, true));
        assert_eq!(observer.next().await, step("foo", Value::Null, true));
    }

    #[tokio::test]
    async fn test_into_stream_ends_at_completion() {
        let observer =
            StreamObserver::new("foo", Observable::of([json!(1), json!(2)])).unwrap();
        let steps: Vec<IterStep> = observer.into_stream().collect().await;

        assert_eq!(
            steps,
            vec![step("foo", json!(1), false), step("foo", json!(2), false)]
        );
    }
}
