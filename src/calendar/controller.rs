use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use super::aggregator::RecordAggregator;
use super::anniversary::{AnniversaryCache, AnniversaryCalculator, AnniversaryEntry};
use super::event::SummaryEvent;
use super::reconciler::{reconcile, ApplySummary, LiveEventState};
use crate::currency::CurrencyRegistry;
use crate::errors::{AggregationError, CalendarError, LedgerError};
use crate::ledger::{
    period, CashKind, DateWindow, ExchangeKind, InstrumentRegistry, LedgerRecord, TradeKind,
};
use crate::storage::LedgerStore;

pub type Result<T> = std::result::Result<T, CalendarError>;

/// Lifecycle of the displayed month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// What the user picked from a day's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayAction {
    AddCash,
    AddTrade,
    AddExchange,
    AddMemo,
    ShowDay,
}

impl DayAction {
    pub const ALL: [DayAction; 5] = [
        DayAction::AddCash,
        DayAction::AddTrade,
        DayAction::AddExchange,
        DayAction::AddMemo,
        DayAction::ShowDay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DayAction::AddCash => "Add cash record",
            DayAction::AddTrade => "Add trade",
            DayAction::AddExchange => "Add exchange",
            DayAction::AddMemo => "Add memo",
            DayAction::ShowDay => "Show day",
        }
    }
}

impl fmt::Display for DayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

type DayActionHandler = Arc<dyn Fn(NaiveDate, DayAction) + Send + Sync>;

/// Result of one refresh of the displayed month.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied {
        period: DateWindow,
        summary: ApplySummary,
        data_errors: Vec<AggregationError>,
    },
    /// A newer refresh started while this one was fetching; its result was dropped.
    Superseded,
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RefreshOutcome::Applied { .. })
    }
}

/// Everything the rendering layer needs to draw the calendar.
#[derive(Debug, Clone)]
pub struct CalendarView {
    pub phase: Phase,
    pub period: Option<DateWindow>,
    pub selected: Option<NaiveDate>,
    pub events: Vec<SummaryEvent>,
    pub anniversaries: Arc<[AnniversaryEntry]>,
    pub data_errors: Vec<AggregationError>,
}

struct ControllerState {
    phase: Phase,
    resume_phase: Phase,
    period: Option<DateWindow>,
    selected: Option<NaiveDate>,
    live: LiveEventState,
    anniversaries: AnniversaryCache,
    data_errors: Vec<AggregationError>,
}

/// Drives the month view: fetch, aggregate, reconcile, overlay anniversaries.
///
/// Pipeline methods take `&self`. Each refresh draws a ticket before fetching and only the
/// holder of the latest ticket may touch state once the fetch resolves.
pub struct CalendarController<S> {
    store: S,
    instruments: Arc<dyn InstrumentRegistry>,
    currencies: CurrencyRegistry,
    generation: AtomicU64,
    state: Mutex<ControllerState>,
    day_action: Mutex<Option<DayActionHandler>>,
}

impl<S: LedgerStore> CalendarController<S> {
    pub fn new(store: S, instruments: Arc<dyn InstrumentRegistry>) -> Self {
        Self {
            store,
            instruments,
            currencies: CurrencyRegistry::default(),
            generation: AtomicU64::new(0),
            state: Mutex::new(ControllerState {
                phase: Phase::Idle,
                resume_phase: Phase::Idle,
                period: None,
                selected: None,
                live: LiveEventState::new(),
                anniversaries: AnniversaryCache::new(AnniversaryCalculator::korean()),
                data_errors: Vec::new(),
            }),
            day_action: Mutex::new(None),
        }
    }

    pub fn with_currencies(mut self, currencies: CurrencyRegistry) -> Self {
        self.currencies = currencies;
        self
    }

    pub fn with_anniversaries(self, calculator: AnniversaryCalculator) -> Self {
        self.lock_state().anniversaries = AnniversaryCache::new(calculator);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn currencies(&self) -> &CurrencyRegistry {
        &self.currencies
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Displays the month containing `date` and selects `date`.
    pub async fn navigate(&self, date: NaiveDate) -> Result<RefreshOutcome> {
        self.refresh(period::resolve(date), Some(date)).await
    }

    /// Reloads the displayed month after the ledger changed.
    pub async fn notify_mutation(&self) -> Result<RefreshOutcome> {
        let window = self.lock_state().period.ok_or(CalendarError::NothingDisplayed)?;
        self.refresh(window, None).await
    }

    pub async fn navigate_previous(&self) -> Result<RefreshOutcome> {
        self.navigate(self.relative_target(-1)).await
    }

    pub async fn navigate_next(&self) -> Result<RefreshOutcome> {
        self.navigate(self.relative_target(1)).await
    }

    fn relative_target(&self, months: i32) -> NaiveDate {
        let state = self.lock_state();
        let anchor = match (state.selected, state.period) {
            (Some(selected), Some(window)) if window.contains(selected) => selected,
            (_, Some(window)) => window.start,
            (Some(selected), None) => selected,
            (None, None) => chrono::Local::now().date_naive(),
        };
        period::shift_month(anchor, months)
    }

    pub fn select_date(&self, date: NaiveDate) {
        self.lock_state().selected = Some(date);
    }

    pub fn on_day_action<F>(&self, handler: F)
    where
        F: Fn(NaiveDate, DayAction) + Send + Sync + 'static,
    {
        *self
            .day_action
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Selects `date` and hands `action` to the registered callback.
    /// Returns `false` when no callback is registered.
    pub fn choose_day_action(&self, date: NaiveDate, action: DayAction) -> bool {
        self.select_date(date);
        let handler = self
            .day_action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                handler(date, action);
                true
            }
            None => {
                tracing::debug!(%date, %action, "no day action handler registered");
                false
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    pub fn displayed_period(&self) -> Option<DateWindow> {
        self.lock_state().period
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.lock_state().selected
    }

    /// Number of whole-year anniversary computations performed so far.
    pub fn anniversary_computations(&self) -> usize {
        self.lock_state().anniversaries.computations()
    }

    pub fn view(&self) -> CalendarView {
        let state = self.lock_state();
        CalendarView {
            phase: state.phase,
            period: state.period,
            selected: state.selected,
            events: state.live.snapshot(),
            anniversaries: state.anniversaries.current(),
            data_errors: state.data_errors.clone(),
        }
    }

    pub fn events_on(&self, date: NaiveDate) -> Vec<SummaryEvent> {
        let mut events = self.lock_state().live.snapshot();
        events.retain(|event| event.date == date);
        events
    }

    pub fn anniversaries_on(&self, date: NaiveDate) -> Vec<AnniversaryEntry> {
        self.lock_state()
            .anniversaries
            .current()
            .iter()
            .filter(|entry| entry.date == date)
            .cloned()
            .collect()
    }

    fn begin_loading(&self) -> u64 {
        let mut state = self.lock_state();
        if state.phase != Phase::Loading {
            state.resume_phase = state.phase;
            state.phase = Phase::Loading;
        }
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn refresh(&self, window: DateWindow, select: Option<NaiveDate>) -> Result<RefreshOutcome> {
        let ticket = self.begin_loading();
        tracing::debug!(period = %window, ticket, "refreshing calendar");

        let fetched = self.fetch(window).await;

        let mut state = self.lock_state();
        if ticket != self.generation.load(Ordering::SeqCst) {
            tracing::debug!(period = %window, ticket, "discarding superseded refresh");
            return Ok(RefreshOutcome::Superseded);
        }

        let records = match fetched {
            Ok(records) => records,
            Err(err) => {
                state.phase = state.resume_phase;
                tracing::error!(period = %window, "calendar refresh failed: {err}");
                return Err(err.into());
            }
        };

        let report =
            RecordAggregator::new(&self.currencies, self.instruments.as_ref()).aggregate(&records);
        let previous = state.live.snapshot();
        let summary = state.live.apply(reconcile(&previous, &report.events));

        if state.anniversaries.switch_to(window.year()) {
            tracing::debug!(year = window.year(), "anniversary overlay switched");
        }

        state.period = Some(window);
        if let Some(date) = select {
            state.selected = Some(date);
        }
        state.data_errors = report.errors.clone();
        state.phase = Phase::Ready;

        tracing::info!(
            period = %window,
            events = state.live.len(),
            added = summary.added,
            removed = summary.removed,
            updated = summary.updated,
            data_errors = report.errors.len(),
            "calendar refreshed"
        );

        Ok(RefreshOutcome::Applied {
            period: window,
            summary,
            data_errors: report.errors,
        })
    }

    async fn fetch(&self, window: DateWindow) -> std::result::Result<Vec<LedgerRecord>, LedgerError> {
        let (cash, trades, exchanges, memos) = futures::try_join!(
            self.store.cash_records(window, &CashKind::ALL),
            self.store.trade_records(window, &TradeKind::ALL),
            self.store.exchange_records(window, &ExchangeKind::ALL),
            self.store.memo_records(window),
        )?;

        let mut records =
            Vec::with_capacity(cash.len() + trades.len() + exchanges.len() + memos.len());
        records.extend(cash.into_iter().map(LedgerRecord::from));
        records.extend(trades.into_iter().map(LedgerRecord::from));
        records.extend(exchanges.into_iter().map(LedgerRecord::from));
        records.extend(memos.into_iter().map(LedgerRecord::from));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use rust_decimal::Decimal;

    use super::*;
    use crate::currency::CurrencyCode;
    use crate::ledger::{CashRecord, InstrumentBook};
    use crate::storage::MemoryLedgerStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn controller() -> CalendarController<Arc<MemoryLedgerStore>> {
        CalendarController::new(Arc::new(MemoryLedgerStore::new()), Arc::new(InstrumentBook::new()))
    }

    #[tokio::test]
    async fn navigate_moves_through_phases() {
        let controller = controller();
        assert_eq!(controller.phase(), Phase::Idle);
        controller.store().add_cash(CashRecord::new(
            CashKind::Income,
            date(2024, 3, 25),
            Decimal::from(3_000_000),
            CurrencyCode::new("KRW"),
        ));

        let outcome = controller.navigate(date(2024, 3, 12)).await.unwrap();
        assert!(outcome.is_applied());

        let view = controller.view();
        assert_eq!(view.phase, Phase::Ready);
        assert_eq!(view.period, Some(DateWindow::month_of(date(2024, 3, 1))));
        assert_eq!(view.selected, Some(date(2024, 3, 12)));
        assert_eq!(view.events.len(), 1);
        assert_eq!(controller.events_on(date(2024, 3, 25)).len(), 1);
        assert!(controller.events_on(date(2024, 3, 24)).is_empty());
    }

    #[tokio::test]
    async fn next_and_previous_keep_the_selected_day() {
        let controller = controller();
        controller.navigate(date(2024, 1, 31)).await.unwrap();
        controller.navigate_next().await.unwrap();
        assert_eq!(controller.selected(), Some(date(2024, 2, 29)));
        controller.navigate_previous().await.unwrap();
        assert_eq!(
            controller.displayed_period(),
            Some(DateWindow::month_of(date(2024, 1, 1)))
        );
    }

    #[test]
    fn day_action_reaches_registered_handler() {
        let controller = controller();
        assert!(!controller.choose_day_action(date(2024, 5, 5), DayAction::AddMemo));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        controller.on_day_action(move |day, action| {
            assert_eq!(day, NaiveDate::from_ymd_opt(2024, 5, 5).unwrap());
            assert_eq!(action, DayAction::AddCash);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(controller.choose_day_action(date(2024, 5, 5), DayAction::AddCash));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.selected(), Some(date(2024, 5, 5)));
    }
}
