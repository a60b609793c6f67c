//! Pure computations: positions, reference solving, alignment detection, and
//! the event and lunar-calendar builders.

pub mod alignment;
pub mod lunar;
pub mod orbit;
pub mod reference;
pub mod scan;

pub use alignment::{AlignmentDetector, AlignmentState, UNALIGNED};
pub use lunar::build_lunar_calendar;
pub use orbit::{OrbitalModel, PositionVector};
pub use reference::solve_reference_positions;
pub use scan::{check_step_assumption, classify, EventRangeBuilder, StepAssumption};
