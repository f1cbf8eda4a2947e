//! A pack's segments and their resolution to instants on a given date.

use chrono::{DateTime, Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::anchor::Anchor;
use crate::geo::{Location, SolarEvent, SolarEvents};

/// One image and the anchor it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub anchor: Anchor,
    pub image: PathBuf,
    pub label: Option<String>,
}

impl Segment {
    pub fn new(anchor: Anchor, image: impl Into<PathBuf>) -> Self {
        Self {
            anchor,
            image: image.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label if given, else the image file name.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self
                .image
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.image.display().to_string()),
        }
    }
}

/// Records that a solar anchor's event did not occur and which event stood in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorFallback {
    pub event: SolarEvent,
    pub substitute: SolarEvent,
}

impl fmt::Display for AnchorFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} does not occur, using {}", self.event, self.substitute)
    }
}

/// An anchor placed on the timeline for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAnchor {
    /// Index into the pack's declaration order.
    pub segment_index: usize,
    pub date: NaiveDate,
    pub at: DateTime<Tz>,
    pub fallback: Option<AnchorFallback>,
}

/// Declaration-ordered segments of one pack.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentModel {
    segments: Vec<Segment>,
}

impl SegmentModel {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn image(&self, index: usize) -> Option<&Path> {
        self.segments.get(index).map(|s| s.image.as_path())
    }

    /// Solar events referenced by any anchor, in daily order.
    pub fn referenced_events(&self) -> BTreeSet<SolarEvent> {
        self.segments
            .iter()
            .filter_map(|s| s.anchor.event())
            .collect()
    }

    /// Largest solar offset in the pack. An anchor for a date lies within this
    /// distance of that local date.
    pub fn offset_reach(&self) -> Duration {
        let minutes = self
            .segments
            .iter()
            .map(|s| match s.anchor {
                Anchor::Solar { offset_minutes, .. } => offset_minutes.abs(),
                Anchor::Clock { .. } | Anchor::Weekly { .. } => 0,
            })
            .max()
            .unwrap_or(0);
        Duration::minutes(minutes)
    }

    /// Event standing in for an undefined `event`: the latest defined event the
    /// pack references that comes before it in the day, else midnight.
    fn substitute_for(
        &self,
        event: SolarEvent,
        referenced: &BTreeSet<SolarEvent>,
        events: &SolarEvents,
    ) -> SolarEvent {
        referenced
            .range(..event)
            .rev()
            .copied()
            .find(|candidate| events.is_defined(*candidate))
            .unwrap_or(SolarEvent::Midnight)
    }

    /// Place every anchor that occurs on `events.date()`, sorted by instant. Equal
    /// instants keep declaration order. Weekly anchors only occur on their weekday.
    pub fn resolve_for_date(&self, events: &SolarEvents, location: &Location) -> Vec<ResolvedAnchor> {
        let date = events.date();
        let referenced = self.referenced_events();

        let mut resolved: Vec<ResolvedAnchor> = self
            .segments
            .iter()
            .enumerate()
            .filter_map(|(segment_index, segment)| {
                let (at, fallback) = match segment.anchor {
                    Anchor::Clock { time } => (location.localize(date, time), None),
                    Anchor::Weekly { weekday, time } => {
                        if date.weekday() != weekday {
                            return None;
                        }
                        (location.localize(date, time), None)
                    }
                    Anchor::Solar {
                        event,
                        offset_minutes,
                    } => {
                        let (base, fallback) = match events.get(event) {
                            Ok(base) => (base, None),
                            Err(_) => {
                                let substitute = self.substitute_for(event, &referenced, events);
                                let base = events
                                    .get(substitute)
                                    .unwrap_or_else(|_| location.start_of_day(date));
                                (
                                    base,
                                    Some(AnchorFallback {
                                        event,
                                        substitute,
                                    }),
                                )
                            }
                        };
                        (base + Duration::minutes(offset_minutes), fallback)
                    }
                };

                Some(ResolvedAnchor {
                    segment_index,
                    date,
                    at,
                    fallback,
                })
            })
            .collect();

        // Stable sort keeps declaration order among ties.
        resolved.sort_by(|a, b| a.at.cmp(&b.at));
        resolved
    }
}
