//! Voice session composition.
//!
//! Wires ingest, segmentation, arbitration, dispatch and playback into one
//! running session, and defines the events it reports outward.

pub mod error;
pub mod events;
pub mod session;

pub use error::{CollectingReporter, ErrorReporter, LogReporter, TaskError};
pub use events::{
    CollectorEventSink, ControlAction, EventSink, LogEventSink, SessionEvent, WindowCloseReason,
};
pub use session::{Providers, VoiceSession, VoiceSessionHandle};
