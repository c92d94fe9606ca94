//! Port traits: the boundaries the domain depends on.

pub mod config_port;
pub mod price_port;
