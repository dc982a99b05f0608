//! Named callback registry implementing [`CallbackInvoker`].

use std::fmt;

use hashbrown::HashMap;
use log::warn;

use crate::event::CallbackSet;
use crate::host::CallbackInvoker;

type Handler = Box<dyn FnMut() + Send>;

/// Maps callback names to closures and keeps a history of every invoked name.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<String, Handler>,
    history: Vec<String>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("history", &self.history)
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Every name invoked so far, in call order (including names with no handler).
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl CallbackInvoker for CallbackRegistry {
    fn invoke(&mut self, callbacks: &CallbackSet) {
        for name in callbacks.iter() {
            self.history.push(name.to_string());
            match self.handlers.get_mut(name) {
                Some(handler) => handler(),
                None => warn!("no handler registered for callback '{name}'"),
            }
        }
    }
}
