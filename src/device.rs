//! Device lifecycle: a small state machine with three states matching the concurrency model's
//! ownership rules — the accelerator either has no device yet, owns one it created (and must
//! destroy), or borrows one an external provider supplied (and must never destroy).

use std::sync::Arc;

use wgpu::{Device, Queue};

/// The accelerator's device/queue lifecycle state.
pub enum DeviceState {
    /// No device has been created or adopted yet.
    Uninitialized,
    /// The accelerator created this device itself and is responsible for its teardown.
    Owned {
        device: Arc<Device>,
        queue: Arc<Queue>,
    },
    /// An external provider supplied this device; the accelerator must not destroy it.
    Shared {
        device: Arc<Device>,
        queue: Arc<Queue>,
    },
}

impl Default for DeviceState {
    fn default() -> Self {
        DeviceState::Uninitialized
    }
}

impl DeviceState {
    pub fn is_initialized(&self) -> bool {
        !matches!(self, DeviceState::Uninitialized)
    }

    pub fn device_queue(&self) -> Option<(&Arc<Device>, &Arc<Queue>)> {
        match self {
            DeviceState::Uninitialized => None,
            DeviceState::Owned { device, queue } | DeviceState::Shared { device, queue } => {
                Some((device, queue))
            }
        }
    }

    /// Adopts an externally-owned device, transitioning to `Shared`. If the accelerator
    /// currently owns a device, that device is dropped first (its `Arc` teardown runs as soon
    /// as the last reference goes away).
    pub fn adopt_shared(&mut self, device: Arc<Device>, queue: Arc<Queue>) {
        if let DeviceState::Owned { .. } = self {
            *self = DeviceState::Uninitialized;
        }
        *self = DeviceState::Shared { device, queue };
    }

    /// Records a device the accelerator created itself, transitioning to `Owned`.
    pub fn set_owned(&mut self, device: Arc<Device>, queue: Arc<Queue>) {
        *self = DeviceState::Owned { device, queue };
    }

    /// Tears down an owned device. No-op for `Shared`/`Uninitialized`: a shared device must
    /// never be destroyed by the accelerator that borrowed it.
    pub fn release_if_owned(&mut self) {
        if let DeviceState::Owned { .. } = self {
            *self = DeviceState::Uninitialized;
        }
    }
}
