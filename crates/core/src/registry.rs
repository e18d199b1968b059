use crate::models::CommandType;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Zero-argument application callback bound to a command slot
pub type CommandCallback = Arc<dyn Fn() + Send + Sync>;

/// Per-command callback slots.
///
/// Each slot holds at most one callback; an empty slot is a normal state.
/// Registration and dispatch may come from different threads (the OS
/// delivers button presses on its own context), so slots sit behind a lock.
/// The callback is cloned out before it runs, which lets a callback
/// re-register slots without deadlocking.
#[derive(Default)]
pub struct CallbackRegistry {
    slots: RwLock<[Option<CommandCallback>; 3]>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callback` for `command`, replacing any previous one.
    ///
    /// Returns false (and stores nothing) for [`CommandType::Unknown`].
    pub fn register<F>(&self, command: CommandType, callback: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        let Some(idx) = command.slot() else {
            debug!("Ignoring callback registration for {}", command);
            return false;
        };

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = slots[idx].replace(Arc::new(callback)).is_some();
        debug!("Registered callback for {} (replaced: {})", command, replaced);
        true
    }

    pub fn is_registered(&self, command: CommandType) -> bool {
        self.get(command).is_some()
    }

    /// Current callback for `command`, if any
    pub fn get(&self, command: CommandType) -> Option<CommandCallback> {
        let idx = command.slot()?;
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots[idx].clone()
    }

    /// Run the callback for `command`.
    ///
    /// Returns true when a callback ran, false when the slot is empty.
    pub fn dispatch(&self, command: CommandType) -> bool {
        match self.get(command) {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<_> = CommandType::SLOTS
            .iter()
            .filter(|c| self.is_registered(**c))
            .collect();
        f.debug_struct("CallbackRegistry")
            .field("registered", &registered)
            .finish()
    }
}
