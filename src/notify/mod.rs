// src/notify/mod.rs
//! Event model and observer fan-out
//!
//! - **Event**: Typed session events (lifecycle, output, overflow)
//! - **Hub**: Predicate-based subscription and at-most-once delivery
//!
//! Execution never depends on observers: the hub drops what it cannot
//! deliver, and sessions run to completion with zero subscribers.

pub mod event;
pub mod hub;

pub use event::{CompletionReason, EventKind, SessionEvent, StreamKind};
pub use hub::{NotifierHub, Predicate, SubscriberId, Subscription};
