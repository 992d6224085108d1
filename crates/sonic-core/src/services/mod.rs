//! Button-control services.
//!
//! Each service owns one piece of shared state and the locking discipline
//! around it. The controller bundles them into a [`ControllerContext`] that
//! every button handler receives.

mod controller;
mod debounce;
mod dispatcher;
mod long_press;
mod playback;
mod toggle;
mod volume;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{Controller, ControllerContext};
pub use debounce::Debouncer;
pub use dispatcher::Dispatcher;
pub use long_press::{
    LongPressConfig, LongPressDetector, LongPressOutcome, LongPressState, SERVICE_STARTING_MESSAGE,
    SERVICE_STOPPING_MESSAGE, SHUTDOWN_MESSAGE,
};
pub use playback::{PlaybackManager, PlaybackWait};
pub use toggle::ToggleStore;
pub use volume::VolumeControl;
