//! Messaging channels: outbound dispatch and the inbound HTTP gateway.
//!
//! Providers plug in through [`traits::Dispatcher`]; the gateway owns the
//! webhook routes and forwards parsed messages to the request router.

pub mod gateway;
pub mod traits;
pub mod whatsapp;

pub use traits::{DispatchError, DispatchReceipt, Dispatcher, InboundMessage};
pub use whatsapp::WhatsAppDispatcher;
