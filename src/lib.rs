//! sweep - bulk mailbox subscription management
//!
//! This crate provides the core engine for bulk-managing email
//! subscriptions: scanning a mailbox into per-sender aggregates,
//! executing unsubscribe directives over HTTP or mailto, and
//! bulk-trashing messages from selected senders.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;
