//! External provider integrations.

pub mod mail;
