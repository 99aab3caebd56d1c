use std::sync::Arc;

use rst_common::with_logging::log::debug;

use crate::agent::Context;

use super::types::{ClassifiedMessage, Message, MessageError, MessageHandler, Outcome};

/// `HandlerChain` offers a message to its handlers, in order, until one of them
/// classifies it
///
/// A handler may also transform the message and offer the new form to the rest
/// of the chain, this is how enveloped messages get unwrapped before any protocol
/// handler sees them
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Arc<dyn MessageHandler>>) -> Self {
        Self { handlers }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn MessageHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    pub async fn handle(
        &self,
        message: Message,
        ctx: &Context,
    ) -> Result<ClassifiedMessage, MessageError> {
        let mut current = message;
        for handler in self.handlers.iter() {
            match handler.handle(current, ctx).await? {
                Outcome::Handled(classified) => {
                    debug!(
                        "message {} classified by {} as {}",
                        classified.message().id,
                        handler.name(),
                        classified.typ()
                    );

                    return Ok(classified);
                }
                Outcome::Continue(next) => current = next,
            }
        }

        Err(MessageError::Unhandled(Box::new(current)))
    }
}
