//! Month view pipeline: aggregation, reconciliation, and the anniversary overlay.

pub mod aggregator;
pub mod anniversary;
pub mod controller;
pub mod event;
pub mod lunar;
pub mod reconciler;

pub use aggregator::{AggregationReport, RecordAggregator};
pub use anniversary::{
    AnniversaryCache, AnniversaryCalculator, AnniversaryEntry, AnniversaryOrigin,
    FixedAnniversary, LunarAnniversary, LunarDay,
};
pub use controller::{CalendarController, CalendarView, DayAction, Phase, RefreshOutcome};
pub use event::{EventId, EventKind, EventOrder, EventSubject, SummaryEvent};
pub use lunar::{LunarDate, LunarError};
pub use reconciler::{reconcile, ApplySummary, EventDelta, LiveEventState};
