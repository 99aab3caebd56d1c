//! `message` classifies inbound payloads through an ordered [`HandlerChain`]
//!
//! Each handler either classifies the message, declines it or transforms it and
//! re-offers the new form to the next handlers. A message nobody classifies ends as
//! [`MessageError::Unhandled`], carrying the metadata added along the way.
pub mod types;
pub use types::{
    ClassifiedMessage, Message, MessageError, MessageHandler, MetaData, Outcome, TypedMessage,
};

mod chain;
pub use chain::HandlerChain;

mod plugin;
pub use plugin::MessageHandlerPlugin;
