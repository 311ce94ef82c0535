//! Session state and command handling.

pub mod context;
pub mod dispatcher;
pub mod lock;
pub mod phrases;

pub use context::{PlaybackStatus, SessionContext, SessionSnapshot};
pub use dispatcher::{CommandDispatcher, DispatchState, DispatcherConfig, Flow};
pub use lock::PriorityLock;
pub use phrases::{PhraseTables, WakeMatch};
