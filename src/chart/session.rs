//! Polling-merge refresh loop for one chart view.
//!
//! A [`ChartSession`] keeps a chart current by combining two sources:
//!
//! - a poll task that re-fetches the full snapshot every refresh interval
//!   and replaces the published model;
//! - a live-price subscription whose ticks overwrite only the price fields
//!   of the published model.
//!
//! The latest live price is remembered and re-applied on top of every new
//! snapshot, so a refresh never moves the headline price backwards. Both
//! halves stop when the target changes, when [`ChartSession::stop`] is
//! called, or when the session is dropped.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::chart::live::PriceWatch;
use crate::chart::model::{ChartViewModel, PriceOverlay};
use crate::chart::source::SnapshotSource;
use crate::constants::chart::{MIN_SKELETON_MS, REFRESH_INTERVAL_MS};
use crate::types::{ChartPeriod, Instrument};
use crate::ws::pool::StreamPool;

/// What a chart view should display.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartState {
    /// No snapshot yet for the current target.
    Loading,
    /// Latest snapshot with live prices applied.
    Ready(ChartViewModel),
    /// The first load failed. Later failures keep the last good model.
    Failed(String),
}

/// Timing knobs for a [`ChartSession`].
#[derive(Debug, Clone, Copy)]
pub struct ChartSessionConfig {
    /// Time between snapshot fetches.
    pub refresh_interval: Duration,
    /// Minimum time the loading state is shown before the first snapshot.
    pub min_skeleton: Duration,
}

impl Default for ChartSessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(REFRESH_INTERVAL_MS),
            min_skeleton: Duration::from_millis(MIN_SKELETON_MS),
        }
    }
}

impl ChartSessionConfig {
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn min_skeleton(mut self, min: Duration) -> Self {
        self.min_skeleton = min;
        self
    }
}

// ---------------------------------------------------------------------------
// Published state
// ---------------------------------------------------------------------------

/// The state channel plus the latest live overlay. Every write checks the
/// writer's cancellation token while holding `overlay`, so a stopped target
/// can never publish over its successor.
struct Published {
    state: watch::Sender<ChartState>,
    overlay: Mutex<PriceOverlay>,
}

impl Published {
    fn lock(&self) -> std::sync::MutexGuard<'_, PriceOverlay> {
        self.overlay.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&self) {
        let mut overlay = self.lock();
        *overlay = PriceOverlay::default();
        self.state.send_replace(ChartState::Loading);
    }

    fn snapshot(&self, mut model: ChartViewModel, cancel: &CancellationToken) {
        let overlay = self.lock();
        if cancel.is_cancelled() {
            return;
        }
        model.apply_overlay(&overlay);
        self.state.send_replace(ChartState::Ready(model));
    }

    fn tick(&self, newer: PriceOverlay, cancel: &CancellationToken) {
        let mut overlay = self.lock();
        if cancel.is_cancelled() {
            return;
        }
        overlay.merge(newer);
        self.state.send_if_modified(|state| match state {
            ChartState::Ready(model) => model.apply_overlay(&overlay),
            _ => false,
        });
    }

    fn failed(&self, message: String, cancel: &CancellationToken) {
        let _overlay = self.lock();
        if cancel.is_cancelled() {
            return;
        }
        self.state.send_replace(ChartState::Failed(message));
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct Target {
    instrument: Instrument,
    period: ChartPeriod,
    cancel: CancellationToken,
    poll: JoinHandle<()>,
    prices: Option<PriceWatch>,
}

/// Keeps one chart view current. See the [module docs](self).
///
/// Must be started and switched from within a Tokio runtime.
pub struct ChartSession<S: SnapshotSource> {
    source: Arc<S>,
    streams: StreamPool,
    config: ChartSessionConfig,
    published: Arc<Published>,
    target: Option<Target>,
}

impl<S: SnapshotSource> ChartSession<S> {
    /// Start refreshing `instrument` at `period`.
    pub fn start(
        source: Arc<S>,
        streams: StreamPool,
        instrument: Instrument,
        period: ChartPeriod,
        config: ChartSessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(ChartState::Loading);
        let mut session = Self {
            source,
            streams,
            config,
            published: Arc::new(Published {
                state,
                overlay: Mutex::new(PriceOverlay::default()),
            }),
            target: None,
        };
        session.begin(instrument, period);
        session
    }

    /// Receiver for every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChartState> {
        self.published.state.subscribe()
    }

    /// Current state.
    pub fn current(&self) -> ChartState {
        self.published.state.borrow().clone()
    }

    /// Instrument and period being refreshed, if not stopped.
    pub fn target(&self) -> Option<(&Instrument, ChartPeriod)> {
        self.target.as_ref().map(|t| (&t.instrument, t.period))
    }

    /// Move to a new instrument or period. The old poll task and live
    /// subscription are torn down before the new ones start; switching to
    /// the current target does nothing.
    pub async fn switch(&mut self, instrument: Instrument, period: ChartPeriod) {
        if self
            .target
            .as_ref()
            .is_some_and(|t| t.instrument == instrument && t.period == period)
        {
            return;
        }
        self.halt().await;
        self.begin(instrument, period);
    }

    /// Stop refreshing. The last published state is kept.
    pub async fn stop(&mut self) {
        self.halt().await;
    }

    fn begin(&mut self, instrument: Instrument, period: ChartPeriod) {
        self.published.reset();
        let cancel = CancellationToken::new();

        let prices = {
            let published = Arc::clone(&self.published);
            let cancel = cancel.clone();
            self.streams.watch_price(&instrument, move |overlay| {
                published.tick(overlay, &cancel);
            })
        };
        if prices.is_none() {
            tracing::warn!(%instrument, "No live price stream for instrument");
        }

        let poll = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            instrument.clone(),
            period,
            self.config,
            Arc::clone(&self.published),
            cancel.clone(),
        ));

        tracing::info!(%instrument, %period, "Chart session started");
        self.target = Some(Target {
            instrument,
            period,
            cancel,
            poll,
            prices,
        });
    }

    async fn halt(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };
        target.cancel.cancel();
        drop(target.prices);
        if let Err(e) = target.poll.await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "Chart poll task panicked");
            }
        }
        tracing::info!(instrument = %target.instrument, "Chart session stopped");
    }
}

impl<S: SnapshotSource> Drop for ChartSession<S> {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            target.cancel.cancel();
        }
    }
}

async fn poll_loop<S: SnapshotSource>(
    source: Arc<S>,
    instrument: Instrument,
    period: ChartPeriod,
    config: ChartSessionConfig,
    published: Arc<Published>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut loaded = false;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            r = source.fetch(&instrument, period) => r,
        };

        match result {
            Ok(model) => {
                if !loaded {
                    let remaining = config.min_skeleton.saturating_sub(started.elapsed());
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(remaining) => {}
                    }
                    loaded = true;
                    tracing::debug!(%instrument, %period, "First chart snapshot loaded");
                }
                published.snapshot(model, &cancel);
            }
            Err(e) if !loaded => {
                tracing::warn!(%instrument, error = %e, "Chart load failed");
                published.failed(e.to_string(), &cancel);
            }
            Err(e) => {
                tracing::debug!(%instrument, error = %e, "Chart refresh failed, keeping last snapshot");
            }
        }
    }
}
