use crate::error::constants::{ERR_DISPATCHER_READ_LOCK, ERR_DISPATCHER_WRITE_LOCK};
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{Message, MessageKind};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type HandlerFn = dyn Fn(&Message) -> Result<Option<Message>> + Send + Sync + 'static;

/// Routes decoded messages to handlers registered per message kind.
///
/// A handler may return a reply (typically an
/// [`Acknowledgment`](crate::protocol::status::Acknowledgment) for a command)
/// for the caller to send back on the same link. Clones share the handler table.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<MessageKind, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register `handler` for `kind`, replacing any previous one
    pub fn register<F>(&self, kind: MessageKind, handler: F) -> Result<()>
    where
        F: Fn(&Message) -> Result<Option<Message>> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::Custom(ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        handlers.insert(kind, Box::new(handler));
        Ok(())
    }

    /// Remove the handler for `kind`, reporting whether one was registered
    pub fn unregister(&self, kind: MessageKind) -> Result<bool> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::Custom(ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        Ok(handlers.remove(&kind).is_some())
    }

    pub fn is_registered(&self, kind: MessageKind) -> Result<bool> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::Custom(ERR_DISPATCHER_READ_LOCK.to_string()))?;

        Ok(handlers.contains_key(&kind))
    }

    /// Run the handler registered for the message's kind
    ///
    /// # Errors
    /// `ProtocolError::UnexpectedMessage` if no handler is registered, or
    /// whatever the handler itself returns.
    pub fn dispatch(&self, msg: &Message) -> Result<Option<Message>> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::Custom(ERR_DISPATCHER_READ_LOCK.to_string()))?;

        handlers
            .get(&msg.kind())
            .ok_or(ProtocolError::UnexpectedMessage)
            .and_then(|handler| handler(msg))
    }
}
