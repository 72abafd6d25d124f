//! # Campana Channels
//! Transport implementations behind the `campana_core::Notifier` trait.

pub mod connection;
pub mod whatsapp;

pub use connection::{ConnectionState, ConnectionTracker};
pub use whatsapp::WhatsAppGateway;
