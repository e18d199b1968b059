/// Process-wide single-bridge lock
///
/// The OS session and its runtime context are process-global resources, so
/// only one bridge may own them at a time. The lock is released when the
/// guard is dropped.
use sap_core::{BridgeError, BridgeResult};
use std::sync::atomic::{AtomicBool, Ordering};

static ACTIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
pub struct InstanceGuard {
    _private: (),
}

impl InstanceGuard {
    /// Try to claim the process-wide bridge slot
    ///
    /// Returns [`BridgeError::AlreadyActive`] if another guard is alive.
    pub fn acquire() -> BridgeResult<Self> {
        if ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Refusing to create a second media session bridge");
            return Err(BridgeError::AlreadyActive);
        }

        tracing::debug!("Acquired media session instance lock");
        Ok(Self { _private: () })
    }

    pub fn is_held() -> bool {
        ACTIVE.load(Ordering::Acquire)
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
        tracing::debug!("Released media session instance lock");
    }
}
