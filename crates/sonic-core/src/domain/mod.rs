//! Domain types for the button controller.
//!
//! These are pure data types with no infrastructure dependencies.

mod button;
mod clip;
mod toggle;

pub use button::{ButtonAction, EdgePolarity, PinBinding, RawEdge, VolumeDirection};
pub use clip::clip_id;
pub use toggle::ToggleGroup;
