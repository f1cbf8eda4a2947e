//! Schedule resolution.
//!
//! A pack is a [`SegmentModel`]: segments that each start at an [`Anchor`]. The
//! [`resolver`] places anchors on the local timeline around `now` and reports the
//! active segment together with the instant of the next change.
//!
//! Declaration order never determines playback order; it only breaks ties
//! between anchors that resolve to the same instant.

pub mod anchor;
pub mod resolver;
pub mod segment;

pub use anchor::{Anchor, AnchorParseError, weekday_name};
pub use resolver::{ScheduleError, ScheduleResult, resolve, timeline};
pub use segment::{AnchorFallback, ResolvedAnchor, Segment, SegmentModel};
