//! Domain models: bodies, events, and time helpers.

pub mod body;
pub mod event;
pub mod time;

pub use body::{BodyConfig, BodyId, BodyRecord, NUM_ORBITING, NUM_SLOTS};
pub use event::{
    filter_by_bodies, Event, LunarEvent, LunarPayload, LunarPhase, ScrollEvent, ScrollPayload,
};
