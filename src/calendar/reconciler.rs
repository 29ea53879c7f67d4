use std::collections::{HashMap, HashSet};

use super::event::{EventId, SummaryEvent};

/// Membership changes between two event snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDelta {
    pub to_add: Vec<SummaryEvent>,
    pub to_remove: Vec<SummaryEvent>,
    /// `next` versions of identities present in both snapshots.
    pub retained: Vec<SummaryEvent>,
}

impl EventDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compares two snapshots by identity only.
pub fn reconcile(previous: &[SummaryEvent], next: &[SummaryEvent]) -> EventDelta {
    let previous_ids: HashSet<&EventId> = previous.iter().map(|event| &event.id).collect();
    let next_ids: HashSet<&EventId> = next.iter().map(|event| &event.id).collect();

    let (retained, to_add): (Vec<SummaryEvent>, Vec<SummaryEvent>) = next
        .iter()
        .cloned()
        .partition(|event| previous_ids.contains(&event.id));
    let to_remove: Vec<SummaryEvent> = previous
        .iter()
        .filter(|event| !next_ids.contains(&event.id))
        .cloned()
        .collect();

    EventDelta {
        to_add,
        to_remove,
        retained,
    }
}

/// Counts reported after a delta is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub added: usize,
    pub removed: usize,
    /// Retained events whose attributes differed from the live copy.
    pub updated: usize,
}

impl ApplySummary {
    pub fn changed(&self) -> bool {
        self.added + self.removed + self.updated > 0
    }
}

/// Events currently shown on the calendar, keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct LiveEventState {
    events: HashMap<EventId, SummaryEvent>,
}

impl LiveEventState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies membership changes, then refreshes every retained event from `next`
    /// so an amount correction under an unchanged identity is never lost.
    pub fn apply(&mut self, delta: EventDelta) -> ApplySummary {
        let mut summary = ApplySummary::default();

        for event in delta.to_remove {
            if self.events.remove(&event.id).is_some() {
                summary.removed += 1;
            }
        }
        for event in delta.to_add {
            if self.events.insert(event.id.clone(), event).is_none() {
                summary.added += 1;
            }
        }
        for event in delta.retained {
            match self.events.get_mut(&event.id) {
                Some(live) if *live == event => {}
                Some(live) => {
                    *live = event;
                    summary.updated += 1;
                }
                None => {
                    self.events.insert(event.id.clone(), event);
                    summary.added += 1;
                }
            }
        }

        summary
    }

    /// Live events in display order.
    pub fn snapshot(&self) -> Vec<SummaryEvent> {
        let mut events: Vec<SummaryEvent> = self.events.values().cloned().collect();
        events.sort_by(|a, b| a.order.cmp(&b.order));
        events
    }

    pub fn get(&self, id: &EventId) -> Option<&SummaryEvent> {
        self.events.get(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
