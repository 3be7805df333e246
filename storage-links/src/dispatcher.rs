// SPDX-License-Identifier: GPL-3.0-only

//! Fan-out of device events to handlers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use storage_contracts::{DeviceEventSource, DeviceEventStream, SourceError};
use storage_types::DeviceEvent;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{DispatchError, EventHandler, HandlerError, HandlerFailure, normalize};

/// Requests a running dispatcher to stop.
///
/// Cheap to clone and safe to use from any task or thread, including a signal
/// listener. Only sets a flag; handler state is never touched from here.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    /// Idempotent. Once this returns, no further event starts delivery.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }
}

/// Result of delivering one event.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of handlers the event was delivered to
    pub delivered: usize,
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Stopped,
}

pub struct Dispatcher<S> {
    source: S,
    handlers: Vec<Box<dyn EventHandler>>,
    state: State,
    subscription: Option<DeviceEventStream>,
    stop: StopHandle,
}

impl<S: DeviceEventSource> Dispatcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            handlers: Vec::new(),
            state: State::Idle,
            subscription: None,
            stop: StopHandle::default(),
        }
    }

    /// Register a handler. Handlers receive events in registration order.
    pub fn add_handler<H: EventHandler + 'static>(&mut self, handler: H) -> Result<(), DispatchError> {
        if self.state != State::Idle {
            return Err(DispatchError::RegistrationClosed);
        }
        debug!("Registered handler {}", handler.name());
        self.handlers.push(Box::new(handler));
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Handler names in delivery order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Subscribe to the event source.
    pub async fn start(&mut self) -> Result<(), DispatchError> {
        match self.state {
            State::Running => return Err(DispatchError::AlreadyRunning),
            State::Stopped => return Err(DispatchError::Stopped),
            State::Idle => {}
        }

        let stream = self.source.subscribe().await?;
        self.subscription = Some(stream);
        self.state = State::Running;
        info!(
            "Dispatching {} events to {} handlers",
            self.source.name(),
            self.handlers.len()
        );
        Ok(())
    }

    /// Deliver events until stopped or the source closes its stream.
    ///
    /// Unsubscribes from the source before returning. A stream that ends without
    /// a stop request is reported as [`SourceError::Closed`].
    pub async fn run(&mut self) -> Result<(), DispatchError> {
        let mut stream = match (self.state, self.subscription.take()) {
            (State::Running, Some(stream)) => stream,
            (State::Stopped, _) => return Err(DispatchError::Stopped),
            _ => return Err(DispatchError::NotStarted),
        };

        let token = self.stop.token.clone();
        let mut closed = false;
        loop {
            let next = tokio::select! {
                biased;

                _ = token.cancelled() => break,
                next = stream.recv() => next,
            };

            let Some(raw) = next else {
                closed = true;
                break;
            };
            if token.is_cancelled() {
                break;
            }

            let event = normalize(raw);
            self.dispatch(&event);
        }

        stream.close();
        drop(stream);
        self.state = State::Stopped;
        self.source.unsubscribe().await?;
        info!("Dispatcher stopped");

        if closed && !token.is_cancelled() {
            return Err(SourceError::Closed.into());
        }
        Ok(())
    }

    /// Deliver one event to every handler, isolating failures.
    pub fn dispatch(&mut self, event: &DeviceEvent) -> DispatchReport {
        let mut report = DispatchReport::default();

        for handler in self.handlers.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event)));
            report.delivered += 1;

            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(payload) => HandlerError::Panicked(panic_message(payload.as_ref())),
            };

            error!(
                "Handler {} failed on {} {}: {}",
                handler.name(),
                event.kind().label(),
                event.id(),
                error
            );
            report.failures.push(HandlerFailure {
                handler: handler.name().to_string(),
                error,
            });
        }

        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use storage_contracts::NotificationSender;
    use storage_types::{DeviceDescription, RawNotification};

    use super::*;

    #[derive(Default)]
    struct SourceCalls {
        subscribed: usize,
        unsubscribed: usize,
    }

    struct ScriptedSource {
        script: Vec<RawNotification>,
        keep_open: bool,
        sender: Option<NotificationSender>,
        calls: Arc<Mutex<SourceCalls>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<RawNotification>, keep_open: bool) -> Self {
            Self {
                script,
                keep_open,
                sender: None,
                calls: Arc::new(Mutex::new(SourceCalls::default())),
            }
        }
    }

    #[async_trait]
    impl DeviceEventSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn subscribe(&mut self) -> Result<DeviceEventStream, SourceError> {
            if self.sender.is_some() {
                return Err(SourceError::AlreadySubscribed("scripted".to_string()));
            }
            let (sender, stream) = DeviceEventStream::channel(self.script.len().max(1));
            for notification in self.script.drain(..) {
                sender.try_send(notification).unwrap();
            }
            if self.keep_open {
                self.sender = Some(sender);
            }
            self.calls.lock().unwrap().subscribed += 1;
            Ok(stream)
        }

        async fn unsubscribe(&mut self) -> Result<(), SourceError> {
            self.sender = None;
            self.calls.lock().unwrap().unsubscribed += 1;
            Ok(())
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Behaviour {
        Record,
        Fail,
        Panic,
    }

    struct Recorder {
        name: &'static str,
        behaviour: Behaviour,
        seen: Arc<Mutex<Vec<DeviceEvent>>>,
        stop_after: Option<(usize, StopHandle)>,
    }

    impl Recorder {
        fn new(name: &'static str, behaviour: Behaviour) -> (Self, Arc<Mutex<Vec<DeviceEvent>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let recorder = Self {
                name,
                behaviour,
                seen: seen.clone(),
                stop_after: None,
            };
            (recorder, seen)
        }
    }

    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn handle(&mut self, event: &DeviceEvent) -> Result<(), HandlerError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(event.clone());
            if let Some((count, stop)) = &self.stop_after
                && seen.len() >= *count
            {
                stop.stop();
            }
            drop(seen);

            match self.behaviour {
                Behaviour::Record => Ok(()),
                Behaviour::Fail => Err(HandlerError::Sink(std::io::Error::other("boom"))),
                Behaviour::Panic => panic!("handler exploded"),
            }
        }
    }

    fn added(name: &str, uuid: &str) -> RawNotification {
        RawNotification::Added {
            object_path: format!("/org/freedesktop/UDisks2/block_devices/{name}"),
            description: DeviceDescription {
                device: format!("/dev/{name}\0").into_bytes(),
                id_uuid: uuid.to_string(),
                partition: true,
                ..Default::default()
            },
        }
    }

    fn removed(name: &str) -> RawNotification {
        RawNotification::Removed {
            object_path: format!("/org/freedesktop/UDisks2/block_devices/{name}"),
        }
    }

    fn script() -> Vec<RawNotification> {
        vec![
            added("sda1", ""),
            added("sdb1", "1234-ABCD"),
            removed("sda1"),
            removed("sdb1"),
        ]
    }

    #[tokio::test]
    async fn start_twice_fails_with_already_running() {
        let mut dispatcher = Dispatcher::new(ScriptedSource::new(vec![], true));
        dispatcher.start().await.unwrap();

        let err = dispatcher.start().await.unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyRunning));
        assert!(dispatcher.is_running());
    }

    #[tokio::test]
    async fn handlers_cannot_be_added_after_start() {
        let mut dispatcher = Dispatcher::new(ScriptedSource::new(vec![], true));
        let (first, _) = Recorder::new("first", Behaviour::Record);
        dispatcher.add_handler(first).unwrap();
        dispatcher.start().await.unwrap();

        let (late, _) = Recorder::new("late", Behaviour::Record);
        let err = dispatcher.add_handler(late).unwrap_err();
        assert!(matches!(err, DispatchError::RegistrationClosed));
        assert_eq!(dispatcher.handler_names(), vec!["first"]);
    }

    #[test]
    fn healthy_handlers_give_a_clean_report() {
        let (first, _) = Recorder::new("first", Behaviour::Record);
        let (second, second_seen) = Recorder::new("second", Behaviour::Record);

        let mut dispatcher = Dispatcher::new(ScriptedSource::new(vec![], true));
        dispatcher.add_handler(first).unwrap();
        dispatcher.add_handler(second).unwrap();
        assert_eq!(dispatcher.handler_names(), vec!["first", "second"]);

        let event = normalize(added("sdd", "BEEF"));
        let report = dispatcher.dispatch(&event);

        assert!(report.is_clean());
        assert_eq!(report.delivered, 2);
        assert_eq!(*second_seen.lock().unwrap(), vec![event]);
    }

    #[tokio::test]
    async fn run_requires_start() {
        let mut dispatcher = Dispatcher::new(ScriptedSource::new(vec![], true));
        let err = dispatcher.run().await.unwrap_err();
        assert!(matches!(err, DispatchError::NotStarted));
    }

    #[tokio::test]
    async fn failing_handler_does_not_affect_neighbours() {
        let (first, first_seen) = Recorder::new("first", Behaviour::Record);
        let (second, second_seen) = Recorder::new("second", Behaviour::Fail);
        let (third, third_seen) = Recorder::new("third", Behaviour::Record);

        let mut dispatcher = Dispatcher::new(ScriptedSource::new(script(), false));
        dispatcher.add_handler(first).unwrap();
        dispatcher.add_handler(second).unwrap();
        dispatcher.add_handler(third).unwrap();
        dispatcher.start().await.unwrap();

        // The scripted stream closes after the last notification.
        let err = dispatcher.run().await.unwrap_err();
        assert!(matches!(err, DispatchError::Source(SourceError::Closed)));

        let (baseline, baseline_seen) = Recorder::new("baseline", Behaviour::Record);
        let mut reference = Dispatcher::new(ScriptedSource::new(script(), false));
        reference.add_handler(baseline).unwrap();
        reference.start().await.unwrap();
        let _ = reference.run().await;

        let expected = baseline_seen.lock().unwrap().clone();
        assert_eq!(expected.len(), 4);
        assert_eq!(*first_seen.lock().unwrap(), expected);
        assert_eq!(*second_seen.lock().unwrap(), expected);
        assert_eq!(*third_seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn panicking_handler_is_isolated() {
        let (first, _) = Recorder::new("first", Behaviour::Panic);
        let (second, second_seen) = Recorder::new("second", Behaviour::Record);

        let mut dispatcher = Dispatcher::new(ScriptedSource::new(vec![], true));
        dispatcher.add_handler(first).unwrap();
        dispatcher.add_handler(second).unwrap();

        let event = normalize(added("sdc", ""));
        let report = dispatcher.dispatch(&event);

        assert_eq!(report.delivered, 2);
        assert!(!report.is_clean());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].handler, "first");
        assert!(matches!(
            &report.failures[0].error,
            HandlerError::Panicked(message) if message == "handler exploded"
        ));
        assert_eq!(*second_seen.lock().unwrap(), vec![event]);
    }

    #[tokio::test]
    async fn stop_before_run_delivers_nothing_and_unsubscribes() {
        let source = ScriptedSource::new(script(), true);
        let calls = source.calls.clone();
        let (recorder, seen) = Recorder::new("recorder", Behaviour::Record);

        let mut dispatcher = Dispatcher::new(source);
        dispatcher.add_handler(recorder).unwrap();
        dispatcher.start().await.unwrap();

        let stop = dispatcher.stop_handle();
        stop.stop();
        stop.stop();
        dispatcher.run().await.unwrap();

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(calls.lock().unwrap().subscribed, 1);
        assert_eq!(calls.lock().unwrap().unsubscribed, 1);
        assert!(!dispatcher.is_running());
    }

    #[tokio::test]
    async fn stop_from_handler_finishes_current_event_only() {
        let (mut stopper, stopper_seen) = Recorder::new("stopper", Behaviour::Record);
        let (after, after_seen) = Recorder::new("after", Behaviour::Record);

        let mut dispatcher = Dispatcher::new(ScriptedSource::new(script(), true));
        stopper.stop_after = Some((2, dispatcher.stop_handle()));
        dispatcher.add_handler(stopper).unwrap();
        dispatcher.add_handler(after).unwrap();
        dispatcher.start().await.unwrap();
        dispatcher.run().await.unwrap();

        // The second event still reaches every handler; nothing after it does.
        assert_eq!(stopper_seen.lock().unwrap().len(), 2);
        assert_eq!(after_seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn restart_after_stop_is_rejected() {
        let mut dispatcher = Dispatcher::new(ScriptedSource::new(vec![], true));
        dispatcher.start().await.unwrap();
        dispatcher.stop_handle().stop();
        dispatcher.run().await.unwrap();

        assert!(matches!(
            dispatcher.start().await.unwrap_err(),
            DispatchError::Stopped
        ));
        assert!(matches!(
            dispatcher.run().await.unwrap_err(),
            DispatchError::Stopped
        ));
    }
}
