//! Shared configuration cell with change notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use lanewm_config::Config;
use tracing::{debug, warn};

/// Identifies a listener registered on a [`ConfigHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&Config)>;

struct Inner {
    config: RefCell<Rc<Config>>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
}

/// Cheaply clonable handle to the current configuration.
///
/// Every clone observes the same configuration and the same listeners.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Rc<Inner>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Rc::new(Inner {
                config: RefCell::new(Rc::new(config)),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> Rc<Config> {
        self.inner.config.borrow().clone()
    }

    /// Installs a new configuration and notifies every listener.
    ///
    /// Listeners must not register or unregister listeners from inside the callback.
    pub fn replace(&self, config: Config) {
        let config = Rc::new(config);
        *self.inner.config.borrow_mut() = config.clone();

        let listeners = self.inner.listeners.borrow();
        debug!("config replaced, notifying {} listeners", listeners.len());
        for (_, listener) in listeners.iter() {
            listener(&config);
        }
    }

    pub fn register_listener(&self, listener: impl Fn(&Config) + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Box::new(listener)));
        id
    }

    pub fn unregister_listener(&self, id: ListenerId) {
        let mut listeners = self.inner.listeners.borrow_mut();
        let len = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        if listeners.len() == len {
            warn!("unregistering unknown config listener {id:?}");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("config", &self.inner.config.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_notifies_listeners() {
        let handle = ConfigHandle::default();
        let seen = Rc::new(Cell::new(0));

        let seen_clone = seen.clone();
        let id = handle.register_listener(move |config| {
            seen_clone.set(config.layout.resize_jump);
        });

        let mut config = Config::default();
        config.layout.resize_jump = 30;
        handle.replace(config);
        assert_eq!(seen.get(), 30);
        assert_eq!(handle.get().layout.resize_jump, 30);

        handle.unregister_listener(id);
        assert_eq!(handle.listener_count(), 0);

        handle.replace(Config::default());
        assert_eq!(seen.get(), 30);
    }

    #[test]
    fn clones_share_state() {
        let handle = ConfigHandle::default();
        let clone = handle.clone();
        clone.register_listener(|_| ());
        assert_eq!(handle.listener_count(), 1);

        let mut config = Config::default();
        config.layout.border.size = 4;
        clone.replace(config);
        assert_eq!(handle.get().layout.border.size, 4);
    }
}
