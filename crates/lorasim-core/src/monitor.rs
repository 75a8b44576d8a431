// ── Polling log monitor ──
//
// One periodic fetch loop per open log view, bound to a single device.
// Ownership of the loop is explicit: every open/retarget/close bumps a
// generation counter and cancels the previous loop's token under one
// lock, and a fetch result is only applied while its generation is
// still current. A response that was in flight when the session moved
// on is dropped instead of landing in the new session's buffer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::FleetApi;
use crate::model::{EntityId, LogSnapshot, LogStatus, NO_LOGS_PLACEHOLDER};

/// Shortest accepted poll period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owns the log session of one log view.
///
/// Must be used from within a Tokio runtime. Dropping the monitor
/// cancels its loop.
pub struct LogMonitor {
    shared: Arc<Shared>,
}

struct Shared {
    api: Arc<dyn FleetApi>,
    period: Duration,
    owner: Mutex<Owner>,
    state: watch::Sender<LogSnapshot>,
}

#[derive(Default)]
struct Owner {
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl LogMonitor {
    /// Create an idle monitor that polls every `period` once opened.
    /// Periods below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(api: Arc<dyn FleetApi>, period: Duration) -> Self {
        let (state, _) = watch::channel(LogSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                api,
                period: period.max(MIN_POLL_INTERVAL),
                owner: Mutex::new(Owner::default()),
                state,
            }),
        }
    }

    /// Start polling `target`: cancel any running loop, clear the
    /// buffer, fetch immediately, then re-fetch every period.
    pub fn open(&self, target: EntityId) {
        let mut owner = self.shared.lock_owner();
        self.shared.stop(&mut owner);
        info!(target = %target, "opening log session");
        Shared::start(&self.shared, &mut owner, target);
    }

    /// Switch the session to `target`. Equivalent to `close()` then
    /// `open(target)`, performed under a single lock so no tick of the
    /// old target can land afterwards.
    pub fn retarget(&self, target: EntityId) {
        let mut owner = self.shared.lock_owner();
        if self.shared.stop(&mut owner) {
            info!(target = %target, "retargeting log session");
        }
        Shared::start(&self.shared, &mut owner, target);
    }

    /// Cancel the loop and return to `Idle`. No-op when nothing is open.
    pub fn close(&self) {
        let mut owner = self.shared.lock_owner();
        if self.shared.stop(&mut owner) {
            self.shared.state.send_replace(LogSnapshot::default());
            info!("log session closed");
        }
    }

    /// Current session state.
    pub fn snapshot(&self) -> LogSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Receive every session state change.
    pub fn subscribe(&self) -> watch::Receiver<LogSnapshot> {
        self.shared.state.subscribe()
    }

    pub fn target(&self) -> Option<EntityId> {
        self.shared.state.borrow().target.clone()
    }

    /// Whether a fetch loop is currently owned by this monitor.
    pub fn is_polling(&self) -> bool {
        self.shared.lock_owner().cancel.is_some()
    }

    pub fn period(&self) -> Duration {
        self.shared.period
    }
}

impl Drop for LogMonitor {
    fn drop(&mut self) {
        let mut owner = self.shared.lock_owner();
        self.shared.stop(&mut owner);
    }
}

impl Shared {
    fn lock_owner(&self) -> MutexGuard<'_, Owner> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the running loop, if any. Returns whether one was running.
    fn stop(&self, owner: &mut Owner) -> bool {
        match owner.cancel.take() {
            Some(token) => {
                token.cancel();
                owner.generation += 1;
                true
            }
            None => false,
        }
    }

    fn start(this: &Arc<Self>, owner: &mut Owner, target: EntityId) {
        owner.generation += 1;
        let generation = owner.generation;
        let token = CancellationToken::new();
        owner.cancel = Some(token.clone());

        this.state.send_replace(LogSnapshot {
            target: Some(target.clone()),
            status: LogStatus::Loading,
            buffer: Vec::new(),
            last_error: None,
        });

        tokio::spawn(poll_loop(Arc::clone(this), target, generation, token));
    }

    /// Mutate the session state if `generation` still owns it.
    fn apply<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut LogSnapshot),
    {
        let owner = self.lock_owner();
        if owner.generation != generation || owner.cancel.is_none() {
            return false;
        }
        self.state.send_modify(f);
        true
    }
}

async fn poll_loop(
    shared: Arc<Shared>,
    target: EntityId,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(shared.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if !shared.apply(generation, |s| s.status = LogStatus::Loading) {
            break;
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = shared.api.fetch_logs(&target) => result,
        };

        let applied = shared.apply(generation, |s| match fetched {
            Ok(lines) => {
                s.buffer = if lines.is_empty() {
                    vec![NO_LOGS_PLACEHOLDER.to_owned()]
                } else {
                    lines
                };
                s.status = LogStatus::Ready;
                s.last_error = None;
            }
            Err(e) => {
                warn!(target = %target, error = %e, "log fetch failed, retrying next tick");
                s.buffer.clear();
                s.status = LogStatus::Error;
                s.last_error = Some(format!("Failed to fetch logs for {target}: {e}"));
            }
        });
        if !applied {
            break;
        }
    }

    debug!(target = %target, generation, "log polling stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use pretty_assertions::assert_eq;

    const PERIOD: Duration = Duration::from_secs(3);

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn monitor(api: &Arc<FakeApi>) -> LogMonitor {
        LogMonitor::new(Arc::clone(api) as Arc<dyn FleetApi>, PERIOD)
    }

    fn d(id: &str) -> EntityId {
        EntityId::from(id)
    }

    #[tokio::test(start_paused = true)]
    async fn empty_logs_show_placeholder() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D7", Ok(Vec::new()));
        let monitor = monitor(&api);

        monitor.open(d("D7"));
        settle().await;

        assert_eq!(
            monitor.snapshot(),
            LogSnapshot {
                target: Some(d("D7")),
                status: LogStatus::Ready,
                buffer: vec![NO_LOGS_PLACEHOLDER.to_owned()],
                last_error: None,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn open_clears_buffer_and_fetches_immediately() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D1", Ok(vec!["join accepted".into()]));
        api.set_logs("D2", Ok(vec!["uplink fcnt=9".into()]));
        let monitor = monitor(&api);

        monitor.open(d("D1"));
        settle().await;
        assert_eq!(monitor.snapshot().buffer, vec!["join accepted".to_owned()]);

        monitor.open(d("D2"));
        assert_eq!(monitor.snapshot().status, LogStatus::Loading);
        assert!(monitor.snapshot().buffer.is_empty());
        settle().await;
        assert_eq!(monitor.snapshot().buffer, vec!["uplink fcnt=9".to_owned()]);
        assert_eq!(api.log_fetches("D2"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_every_period() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D7", Ok(vec!["a".into()]));
        let monitor = monitor(&api);

        monitor.open(d("D7"));
        tokio::time::sleep(Duration::from_millis(7_500)).await;

        // Immediate fetch plus ticks at 3s and 6s.
        assert_eq!(api.log_fetches("D7"), 3);
        assert!(monitor.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_keeps_polling_and_recovers() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D7", Err(503));
        let monitor = monitor(&api);

        monitor.open(d("D7"));
        settle().await;

        let snap = monitor.snapshot();
        assert_eq!(snap.status, LogStatus::Error);
        assert!(snap.buffer.is_empty());
        assert!(snap.last_error.unwrap().contains("D7"));

        api.set_logs("D7", Ok(vec!["back online".into()]));
        tokio::time::sleep(PERIOD).await;
        settle().await;

        let snap = monitor.snapshot();
        assert_eq!(api.log_fetches("D7"), 2);
        assert_eq!(snap.status, LogStatus::Ready);
        assert_eq!(snap.buffer, vec!["back online".to_owned()]);
        assert!(snap.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn close_stops_polling_and_is_idempotent() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D7", Ok(vec!["a".into()]));
        let monitor = monitor(&api);

        monitor.open(d("D7"));
        settle().await;
        monitor.close();
        monitor.close();

        assert_eq!(monitor.snapshot(), LogSnapshot::default());
        assert!(!monitor.is_polling());

        tokio::time::sleep(PERIOD * 4).await;
        assert_eq!(api.log_fetches("D7"), 1);
        assert_eq!(monitor.snapshot(), LogSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_fetch_is_dropped_after_close() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D7", Ok(vec!["late".into()]));
        let release = api.hold_logs("D7");
        let monitor = monitor(&api);

        monitor.open(d("D7"));
        settle().await;
        assert_eq!(api.log_fetches("D7"), 1);

        monitor.close();
        release.add_permits(8);
        settle().await;
        tokio::time::sleep(PERIOD * 2).await;

        assert_eq!(monitor.snapshot(), LogSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_reaches_new_target() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D1", Ok(vec!["from D1".into()]));
        api.set_logs("D2", Ok(vec!["from D2".into()]));
        let release = api.hold_logs("D1");
        let monitor = monitor(&api);

        monitor.open(d("D1"));
        settle().await;
        monitor.retarget(d("D2"));
        settle().await;
        release.add_permits(8);
        settle().await;

        let snap = monitor.snapshot();
        assert_eq!(snap.target, Some(d("D2")));
        assert_eq!(snap.buffer, vec!["from D2".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_generation_cannot_write() {
        let api = Arc::new(FakeApi::new());
        let release = api.hold_logs("D1");
        let monitor = monitor(&api);

        monitor.open(d("D1"));
        let stale = monitor.shared.lock_owner().generation;
        monitor.retarget(d("D2"));

        assert!(!monitor.shared.apply(stale, |s| s.buffer = vec!["stale".into()]));
        assert!(monitor.snapshot().buffer.iter().all(|l| l != "stale"));
        drop(release);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_monitor_cancels_loop() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D7", Ok(vec!["a".into()]));
        let monitor = monitor(&api);

        monitor.open(d("D7"));
        settle().await;
        drop(monitor);

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(api.log_fetches("D7"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_status_transitions() {
        let api = Arc::new(FakeApi::new());
        api.set_logs("D7", Ok(vec!["a".into()]));
        let monitor = monitor(&api);
        let mut rx = monitor.subscribe();

        monitor.open(d("D7"));
        rx.wait_for(|s| s.status == LogStatus::Ready).await.unwrap();
        assert_eq!(rx.borrow().target, Some(d("D7")));
    }
}
