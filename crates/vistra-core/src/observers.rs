//! Engine diagnostics observers.
//!
//! The native engine reports warnings and errors through per-object event
//! channels rather than through return values. [`Observer`] subscribes to
//! those channels, parses the engine's structured log lines into
//! [`ObservedEvent`] records, and makes them queryable. [`ErrorCatcher`]
//! wraps a block of engine calls and, when configured, turns a reported
//! error into a `Result` failure at the point it occurs.

use std::sync::{Arc, Mutex};

use crate::error::{Result, VistraError};

/// Severity of a captured engine message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A non-fatal warning.
    Warning,
    /// An error reported by the engine.
    Error,
}

impl EventKind {
    /// Parses the upper-case severity token used in engine log lines.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A named diagnostic event stream exposed by a native engine object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventChannel {
    /// The warning stream.
    Warning,
    /// The error stream.
    Error,
}

impl EventChannel {
    /// The severity assumed for messages on this channel when the message
    /// itself carries no recognizable severity token.
    fn kind(self) -> EventKind {
        match self {
            Self::Warning => EventKind::Warning,
            Self::Error => EventKind::Error,
        }
    }
}

/// Callback invoked by an engine object with the raw message text.
///
/// The engine invokes the callback inline during its processing call. An
/// `Err` return aborts that call; the engine surfaces it as its own failure.
pub type EventCallback = Box<dyn FnMut(&str) -> Result<()> + Send>;

/// A native engine object that exposes diagnostic event channels.
///
/// This is the seam between vistra and the engine's host-controlled observer
/// mechanism. Registration is exclusive per channel: registering again
/// replaces the previous callback, so callers must not rely on stacking
/// multiple observers on one object.
pub trait EventSource {
    /// Registers a callback on the given channel.
    fn register(&mut self, channel: EventChannel, callback: EventCallback);

    /// Removes any callback registered on the given channel.
    fn unregister(&mut self, channel: EventChannel);
}

/// A record of one captured engine message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedEvent {
    /// Severity of the message.
    pub kind: EventKind,
    /// Name of the emitting engine object, empty if the message did not parse.
    pub origin_class: String,
    /// Opaque identity string of the emitting object, used only for display.
    pub origin_address: String,
    /// Free-text payload of the message.
    pub description: String,
    /// The unparsed original message.
    pub raw_text: String,
}

impl ObservedEvent {
    /// Parses one raw engine message arriving on `channel`.
    ///
    /// Messages follow a fixed two-line layout:
    ///
    /// ```text
    /// KIND: In PATH, line N
    /// CLASS (ADDRESS): DESCRIPTION
    /// ```
    ///
    /// Anything that does not match is kept whole as the description with the
    /// channel's severity; parsing never fails. The severity token may be any
    /// upper-case word; tokens other than `WARNING`/`ERROR` take the
    /// channel's severity while the remaining fields are still extracted.
    pub fn parse(raw: &str, channel: EventChannel) -> Self {
        Self::try_parse(raw, channel).unwrap_or_else(|| Self {
            kind: channel.kind(),
            origin_class: String::new(),
            origin_address: String::new(),
            description: raw.to_string(),
            raw_text: raw.to_string(),
        })
    }

    fn try_parse(raw: &str, channel: EventChannel) -> Option<Self> {
        let (first, rest) = raw.split_once('\n')?;

        // "KIND: In PATH, line N"
        let (kind_token, location) = first.split_once(": In ")?;
        if kind_token.is_empty() || !kind_token.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let kind = EventKind::from_token(kind_token).unwrap_or(channel.kind());
        let (_path, line) = location.rsplit_once(", line ")?;
        if line.is_empty() {
            return None;
        }

        // "CLASS (ADDRESS): DESCRIPTION"
        let second = rest.split_once('\n').map_or(rest, |(line, _)| line);
        let (origin, description) = second.split_once("): ")?;
        let (class, address) = origin.split_once(" (")?;
        if class.is_empty() || description.is_empty() {
            return None;
        }

        Some(Self {
            kind,
            origin_class: class.to_string(),
            origin_address: address.to_string(),
            description: description.to_string(),
            raw_text: raw.to_string(),
        })
    }
}

/// Interior observer state shared with the registered callbacks.
#[derive(Default)]
struct ObserverState {
    events: Vec<ObservedEvent>,
    event_occurred: bool,
}

/// Captures warnings and errors emitted by a native engine object.
///
/// An observer attaches to at most one object at a time; captured events
/// accumulate in arrival order until [`Observer::reset`] is called. The
/// engine invokes the callback synchronously on the thread driving the
/// processing call, so no further locking discipline is required beyond the
/// interior mutex.
pub struct Observer {
    state: Arc<Mutex<ObserverState>>,
    attached: bool,
    raise_on_error: bool,
    send_to_log: bool,
}

impl Observer {
    /// Creates a detached observer that forwards captured events to `log`.
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            attached: false,
            raise_on_error: false,
            send_to_log: true,
        }
    }

    /// Sets whether captured events are forwarded to the `log` facade.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.send_to_log = enabled;
        self
    }

    /// Sets whether an error-kind event aborts the in-flight engine call.
    pub fn with_raise_on_error(mut self, raise: bool) -> Self {
        self.raise_on_error = raise;
        self
    }

    /// Attaches this observer to the warning and error channels of `source`.
    ///
    /// Fails with [`VistraError::AlreadyObserving`] if the observer is
    /// already attached; it never silently re-targets.
    pub fn observe(&mut self, source: &mut dyn EventSource) -> Result<()> {
        if self.attached {
            return Err(VistraError::AlreadyObserving);
        }
        source.register(EventChannel::Warning, self.callback(EventChannel::Warning));
        source.register(EventChannel::Error, self.callback(EventChannel::Error));
        self.attached = true;
        Ok(())
    }

    /// Detaches this observer from `source`, leaving it free to be observed
    /// again.
    pub fn detach(&mut self, source: &mut dyn EventSource) {
        source.unregister(EventChannel::Warning);
        source.unregister(EventChannel::Error);
        self.attached = false;
    }

    /// Returns whether this observer is currently attached to an object.
    pub fn is_observing(&self) -> bool {
        self.attached
    }

    /// Returns whether any event has been captured since the last reset.
    pub fn has_event_occurred(&self) -> bool {
        self.lock().event_occurred
    }

    /// Returns the captured events in arrival order.
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.lock().events.clone()
    }

    /// Returns the description of the most recent event.
    ///
    /// Fails with [`VistraError::NoEventCaptured`] if nothing has been
    /// captured since the last reset.
    pub fn message(&self) -> Result<String> {
        self.lock()
            .events
            .last()
            .map(|event| event.description.clone())
            .ok_or(VistraError::NoEventCaptured)
    }

    /// Returns the full raw text of the most recent event, including the
    /// severity and source-path line.
    ///
    /// Fails with [`VistraError::NoEventCaptured`] if nothing has been
    /// captured since the last reset.
    pub fn full_message(&self) -> Result<String> {
        self.lock()
            .events
            .last()
            .map(|event| event.raw_text.clone())
            .ok_or(VistraError::NoEventCaptured)
    }

    /// Clears the captured events and the event-occurred flag.
    pub fn reset(&mut self) {
        let mut state = self.lock();
        state.events.clear();
        state.event_occurred = false;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ObserverState> {
        self.state.lock().expect("observer state poisoned")
    }

    fn callback(&self, channel: EventChannel) -> EventCallback {
        let state = Arc::clone(&self.state);
        let raise_on_error = self.raise_on_error;
        let send_to_log = self.send_to_log;

        Box::new(move |raw| {
            let event = ObservedEvent::parse(raw, channel);
            if send_to_log {
                match event.kind {
                    EventKind::Error => log::error!("{}", event.description),
                    EventKind::Warning => log::warn!("{}", event.description),
                }
            }

            let description = event.description.clone();
            let kind = event.kind;
            {
                let mut state = state.lock().expect("observer state poisoned");
                state.event_occurred = true;
                state.events.push(event);
            }

            if raise_on_error && kind == EventKind::Error {
                return Err(VistraError::EngineError(description));
            }
            Ok(())
        })
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}

/// A scoped capture session over a block of engine calls.
///
/// [`ErrorCatcher::run`] attaches a fresh observer to the source, runs the
/// given block, and detaches on every exit path. With `raise_errors` set, an
/// error-kind event aborts the block at the engine call that produced it; the
/// captured events remain available through [`ErrorCatcher::events`] either
/// way.
pub struct ErrorCatcher {
    raise_errors: bool,
    send_to_logging: bool,
    events: Vec<ObservedEvent>,
}

impl ErrorCatcher {
    /// Creates a catcher that records events without aborting engine calls.
    pub fn new() -> Self {
        Self {
            raise_errors: false,
            send_to_logging: true,
            events: Vec::new(),
        }
    }

    /// Sets whether an error-kind event aborts the block being run.
    pub fn with_raise_errors(mut self, raise: bool) -> Self {
        self.raise_errors = raise;
        self
    }

    /// Sets whether captured events are forwarded to the `log` facade.
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.send_to_logging = enabled;
        self
    }

    /// Runs `op` with a capture session attached to `source`.
    ///
    /// The observer is detached before this returns, on both exit paths, so
    /// the source can be observed again afterwards. Events captured during
    /// the session replace any from a previous run.
    pub fn run<S, T, F>(&mut self, source: &mut S, op: F) -> Result<T>
    where
        S: EventSource,
        F: FnOnce(&mut S) -> Result<T>,
    {
        let mut observer = Observer::new()
            .with_logging(self.send_to_logging)
            .with_raise_on_error(self.raise_errors);
        observer.observe(source)?;

        let outcome = op(source);

        observer.detach(source);
        self.events = observer.events();
        outcome
    }

    /// Returns the events captured during the most recent session.
    pub fn events(&self) -> &[ObservedEvent] {
        &self.events
    }
}

impl Default for ErrorCatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Stand-in for a native engine object with one callback slot per channel.
    #[derive(Default)]
    struct FakeEngineObject {
        warning: Option<EventCallback>,
        error: Option<EventCallback>,
    }

    impl FakeEngineObject {
        /// Drives the registered callback the way the engine would during a
        /// processing call.
        fn emit(&mut self, channel: EventChannel, raw: &str) -> Result<()> {
            let slot = match channel {
                EventChannel::Warning => &mut self.warning,
                EventChannel::Error => &mut self.error,
            };
            match slot {
                Some(callback) => callback(raw),
                None => Ok(()),
            }
        }
    }

    impl EventSource for FakeEngineObject {
        fn register(&mut self, channel: EventChannel, callback: EventCallback) {
            match channel {
                EventChannel::Warning => self.warning = Some(callback),
                EventChannel::Error => self.error = Some(callback),
            }
        }

        fn unregister(&mut self, channel: EventChannel) {
            match channel {
                EventChannel::Warning => self.warning = None,
                EventChannel::Error => self.error = None,
            }
        }
    }

    const WARNING_MSG: &str = "WARNING: In foo.cxx, line 0\nfoo (0x7f): ALERT";

    #[test]
    fn parse_structured_message() {
        let event = ObservedEvent::parse(WARNING_MSG, EventChannel::Warning);
        assert_eq!(event.kind, EventKind::Warning);
        assert_eq!(event.origin_class, "foo");
        assert_eq!(event.origin_address, "0x7f");
        assert_eq!(event.description, "ALERT");
        assert_eq!(event.raw_text, WARNING_MSG);
    }

    #[test]
    fn parse_error_message() {
        let raw = "ERROR: In sphere.cxx, line 42\nSphereSource (0xdeadbeef): radius must be positive";
        let event = ObservedEvent::parse(raw, EventChannel::Error);
        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.origin_class, "SphereSource");
        assert_eq!(event.origin_address, "0xdeadbeef");
        assert_eq!(event.description, "radius must be positive");
    }

    #[test]
    fn parse_unstructured_message_keeps_whole_text() {
        let event = ObservedEvent::parse("foo", EventChannel::Error);
        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.origin_class, "");
        assert_eq!(event.origin_address, "");
        assert_eq!(event.description, "foo");
        assert_eq!(event.raw_text, "foo");
    }

    #[test]
    fn parse_extracts_fields_for_any_uppercase_severity_token() {
        let raw = "KIND: In PATH, line 0\nfoo (ADDRESS): ALERT";
        let event = ObservedEvent::parse(raw, EventChannel::Warning);
        assert_eq!(event.kind, EventKind::Warning);
        assert_eq!(event.origin_class, "foo");
        assert_eq!(event.origin_address, "ADDRESS");
        assert_eq!(event.description, "ALERT");
        assert_eq!(event.raw_text, raw);

        // The unrecognized token takes the severity of the arrival channel.
        let event = ObservedEvent::parse(raw, EventChannel::Error);
        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.description, "ALERT");
    }

    #[test]
    fn parse_rejects_lowercase_severity_token() {
        let raw = "note: In foo.cxx, line 0\nfoo (0x7f): ALERT";
        let event = ObservedEvent::parse(raw, EventChannel::Warning);
        assert_eq!(event.origin_class, "");
        assert_eq!(event.description, raw);
    }

    #[test]
    fn observer_accumulates_events_in_order() {
        let mut source = FakeEngineObject::default();
        let mut observer = Observer::new().with_logging(false);
        observer.observe(&mut source).unwrap();
        assert!(!observer.has_event_occurred());

        source.emit(EventChannel::Warning, WARNING_MSG).unwrap();
        source.emit(EventChannel::Warning, "first plain").unwrap();
        source.emit(EventChannel::Error, "second plain").unwrap();

        assert!(observer.has_event_occurred());
        let events = observer.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].description, "ALERT");
        assert_eq!(events[1].description, "first plain");
        assert_eq!(events[2].description, "second plain");
        assert_eq!(events[2].kind, EventKind::Error);

        assert_eq!(observer.message().unwrap(), "second plain");
        assert_eq!(observer.full_message().unwrap(), "second plain");
    }

    #[test]
    fn observer_messages_for_structured_event() {
        let mut source = FakeEngineObject::default();
        let mut observer = Observer::new().with_logging(false);
        observer.observe(&mut source).unwrap();
        source.emit(EventChannel::Warning, WARNING_MSG).unwrap();

        assert_eq!(observer.message().unwrap(), "ALERT");
        assert_eq!(observer.full_message().unwrap(), WARNING_MSG);
    }

    #[test]
    fn fresh_observer_has_no_message() {
        let observer = Observer::new();
        assert!(!observer.has_event_occurred());
        assert!(matches!(
            observer.message(),
            Err(VistraError::NoEventCaptured)
        ));
        assert!(matches!(
            observer.full_message(),
            Err(VistraError::NoEventCaptured)
        ));
    }

    #[test]
    fn observe_twice_fails() {
        let mut source = FakeEngineObject::default();
        let mut observer = Observer::new();
        observer.observe(&mut source).unwrap();
        assert!(matches!(
            observer.observe(&mut source),
            Err(VistraError::AlreadyObserving)
        ));
    }

    #[test]
    fn detach_allows_reobserving() {
        let mut source = FakeEngineObject::default();
        let mut observer = Observer::new().with_logging(false);
        observer.observe(&mut source).unwrap();
        observer.detach(&mut source);
        assert!(!observer.is_observing());

        source.emit(EventChannel::Error, "dropped").unwrap();
        assert!(!observer.has_event_occurred());

        observer.observe(&mut source).unwrap();
        source.emit(EventChannel::Error, "captured").unwrap();
        assert_eq!(observer.message().unwrap(), "captured");
    }

    #[test]
    fn reset_clears_events_and_flag() {
        let mut source = FakeEngineObject::default();
        let mut observer = Observer::new().with_logging(false);
        observer.observe(&mut source).unwrap();
        source.emit(EventChannel::Warning, "noise").unwrap();
        assert!(observer.has_event_occurred());

        observer.reset();
        assert!(!observer.has_event_occurred());
        assert!(observer.events().is_empty());
        assert!(matches!(
            observer.message(),
            Err(VistraError::NoEventCaptured)
        ));
    }

    #[test]
    fn raise_on_error_aborts_the_engine_call() {
        let mut source = FakeEngineObject::default();
        let mut observer = Observer::new().with_logging(false).with_raise_on_error(true);
        observer.observe(&mut source).unwrap();

        // Warnings never abort.
        source.emit(EventChannel::Warning, "just a warning").unwrap();

        let raw = "ERROR: In foo.cxx, line 1\nfoo (0x1): bad input";
        let err = source.emit(EventChannel::Error, raw).unwrap_err();
        match err {
            VistraError::EngineError(description) => assert_eq!(description, "bad input"),
            other => panic!("unexpected error: {other}"),
        }
        // The event is recorded before the abort.
        assert_eq!(observer.events().len(), 2);
    }

    #[test]
    fn error_catcher_records_without_raising() {
        let mut source = FakeEngineObject::default();
        let mut catcher = ErrorCatcher::new().with_logging(false);

        let value = catcher
            .run(&mut source, |source| {
                source.emit(EventChannel::Error, "first failure")?;
                source.emit(EventChannel::Error, "second failure")?;
                Ok(17)
            })
            .unwrap();

        assert_eq!(value, 17);
        assert_eq!(catcher.events().len(), 2);
        assert_eq!(catcher.events()[1].description, "second failure");
        // The session detached on exit.
        assert!(source.error.is_none());
        assert!(source.warning.is_none());
    }

    #[test]
    fn error_catcher_raises_and_stops_at_first_error() {
        let mut source = FakeEngineObject::default();
        let mut catcher = ErrorCatcher::new().with_logging(false).with_raise_errors(true);

        let outcome: Result<()> = catcher.run(&mut source, |source| {
            source.emit(EventChannel::Error, "boom")?;
            source.emit(EventChannel::Error, "never reached")?;
            Ok(())
        });

        assert!(matches!(outcome, Err(VistraError::EngineError(_))));
        assert_eq!(catcher.events().len(), 1);
        assert_eq!(catcher.events()[0].description, "boom");
        // Detach ran even though the block aborted.
        assert!(source.error.is_none());
    }

    #[test]
    fn error_catcher_empty_session() {
        let mut source = FakeEngineObject::default();
        let mut catcher = ErrorCatcher::new().with_raise_errors(true);
        catcher.run(&mut source, |_| Ok(())).unwrap();
        assert!(catcher.events().is_empty());
    }

    proptest! {
        /// Parsing degrades to a whole-text description; it never drops input.
        #[test]
        fn parse_never_loses_text(raw in ".*") {
            let event = ObservedEvent::parse(&raw, EventChannel::Error);
            prop_assert_eq!(&event.raw_text, &raw);
            if event.origin_class.is_empty() {
                prop_assert_eq!(&event.description, &raw);
            }
        }
    }
}
