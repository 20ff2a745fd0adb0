//! Session event stream: framing, typed events, and the listener task.

pub mod event;
pub mod framer;
pub mod listener;

pub use event::StreamEvent;
pub use framer::{EventFramer, EventPayload, RawEvent};
pub use listener::{ListenerExit, ListenerHandle, StreamListener};
