//! Typed event delivery for the stream demuxer.
//!
//! Listeners are registered per [`EventKind`] and called in registration
//! order. The bus is a cheap handle around shared state, so a listener may
//! capture a clone of it and subscribe or unsubscribe while an event is
//! being delivered. A listener removed during an emission is skipped for the
//! rest of that emission; a listener added during an emission first runs on
//! the next one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use amf0::Amf0Object;

use crate::error::DemuxErrorKind;
use crate::media_info::MediaInfo;
use crate::stream::MediaSample;
use crate::track::{Sample, TrackKind, TrackMetadata};

/// The names events are subscribed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    MediaInfo,
    MetaData,
    ScriptData,
    MediaData,
    TrackData,
}

/// Something the demuxer has to tell its consumers.
#[derive(Debug, Clone)]
pub enum Event {
    /// A tag was dropped, or the stream cannot be demuxed.
    Error { kind: DemuxErrorKind, message: String },
    /// The media info became complete, or changed while complete.
    MediaInfo(MediaInfo),
    /// A track was configured, or reconfigured.
    MetaData { track: TrackKind, metadata: TrackMetadata },
    /// A script data tag, decoded.
    ScriptData(Amf0Object),
    /// Decoder-ready samples of one track.
    MediaData { track: TrackKind, samples: Vec<MediaSample> },
    /// The raw samples of one track, never empty.
    TrackData { track: TrackKind, samples: Vec<Sample> },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Error { .. } => EventKind::Error,
            Event::MediaInfo(_) => EventKind::MediaInfo,
            Event::MetaData { .. } => EventKind::MetaData,
            Event::ScriptData(_) => EventKind::ScriptData,
            Event::MediaData { .. } => EventKind::MediaData,
            Event::TrackData { .. } => EventKind::TrackData,
        }
    }
}

/// A listener callback.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Identifies one registration, returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    kind: EventKind,
    id: u64,
}

struct Registration {
    id: u64,
    once: bool,
    callback: Rc<RefCell<Listener>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<Registration>>,
}

impl Registry {
    fn contains(&self, token: SubscriptionToken) -> bool {
        self.listeners
            .get(&token.kind)
            .is_some_and(|list| list.iter().any(|r| r.id == token.id))
    }

    fn remove(&mut self, token: SubscriptionToken) -> bool {
        let Some(list) = self.listeners.get_mut(&token.kind) else {
            return false;
        };

        let before = list.len();
        list.retain(|r| r.id != token.id);
        before != list.len()
    }
}

/// Subscribe / unsubscribe / emit registry.
///
/// Single threaded: the bus and its listeners are neither `Send` nor `Sync`.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        let counts: HashMap<_, _> = registry.listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent listener.
    pub fn subscribe(&self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> SubscriptionToken {
        self.register(kind, false, Box::new(listener))
    }

    /// Registers a listener that is removed after its first call.
    pub fn once(&self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> SubscriptionToken {
        self.register(kind, true, Box::new(listener))
    }

    fn register(&self, kind: EventKind, once: bool, callback: Listener) -> SubscriptionToken {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;

        registry.listeners.entry(kind).or_default().push(Registration {
            id,
            once,
            callback: Rc::new(RefCell::new(callback)),
        });

        SubscriptionToken { kind, id }
    }

    /// Removes a listener. Returns false when it was already gone.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.registry.borrow_mut().remove(token)
    }

    /// Whether anything listens for `kind`.
    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.registry
            .borrow()
            .listeners
            .get(&kind)
            .is_some_and(|list| !list.is_empty())
    }

    /// Delivers `event` to the listeners of its kind.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();

        // The registry is not borrowed while callbacks run
        let snapshot: Vec<_> = match self.registry.borrow().listeners.get(&kind) {
            Some(list) => list
                .iter()
                .map(|r| (SubscriptionToken { kind, id: r.id }, r.once, r.callback.clone()))
                .collect(),
            None => return,
        };

        for (token, once, callback) in snapshot {
            if !self.registry.borrow().contains(token) {
                continue;
            }
            if once {
                self.registry.borrow_mut().remove(token);
            }

            // A listener that emits into the bus does not receive its own event
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut **callback)(event),
                Err(_) => tracing::trace!(?kind, "Skipping re-entrant listener"),
            }
        }
    }
}
