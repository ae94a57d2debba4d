//! # Debounced League Start
//!
//! Registrations keep arriving while the league waits to start. As soon as the
//! minimum numbers of players and referees are reached, a countdown is armed; every
//! further qualifying registration cancels that countdown and arms a fresh one, so
//! late joiners push the start back.
//!
//! ## At-most-once start
//!
//! Two mechanisms guarantee the league starts exactly once:
//!
//! 1. **Awaited cancellation.** Re-arming cancels the stale [`CancellableTimer`] and
//!    *awaits* its task before spawning the new one. A timer that was already in the
//!    middle of delivering its expiry is aborted at that await point.
//! 2. **Generations.** Every armed timer carries a generation number. An expiry that
//!    was already queued in the manager's mailbox when its timer got replaced still
//!    arrives, but [`LeagueStartCoordinator::on_expiry`] ignores anything but the
//!    latest generation, and ignores everything once `started` is set.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Receives the expiry of an armed countdown.
#[async_trait]
pub trait StartTrigger: Send + Sync + 'static {
    async fn fire(&self, generation: u64);
}

/// A one-shot timer whose callback can be cancelled up to the moment it completes.
pub struct CancellableTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl CancellableTimer {
    pub fn arm<F, Fut>(after: Duration, on_expiry: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = async {
                    tokio::time::sleep(after).await;
                    on_expiry().await;
                } => {}
            }
        });
        Self { token, handle }
    }

    /// Cancels the timer and waits until its task has stopped.
    pub async fn cancel(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

pub struct LeagueStartCoordinator {
    min_players: usize,
    min_referees: usize,
    wait: Duration,
    trigger: Arc<dyn StartTrigger>,
    timer: Option<CancellableTimer>,
    generation: u64,
    deadline: Option<Instant>,
    started: bool,
}

impl LeagueStartCoordinator {
    pub fn new(
        min_players: usize,
        min_referees: usize,
        wait: Duration,
        trigger: Arc<dyn StartTrigger>,
    ) -> Self {
        Self {
            min_players,
            min_referees,
            wait,
            trigger,
            timer: None,
            generation: 0,
            deadline: None,
            started: false,
        }
    }

    /// Re-checks the start condition after a registration.
    ///
    /// Returns the new deadline when a countdown was (re)armed.
    pub async fn evaluate(&mut self, players: usize, referees: usize) -> Option<Instant> {
        if self.started || players < self.min_players || referees < self.min_referees {
            return None;
        }
        if let Some(stale) = self.timer.take() {
            debug!(generation = self.generation, "Cancelling start countdown");
            stale.cancel().await;
        }

        self.generation += 1;
        let generation = self.generation;
        let deadline = Instant::now() + self.wait;
        self.deadline = Some(deadline);

        let trigger = self.trigger.clone();
        self.timer = Some(CancellableTimer::arm(self.wait, move || async move {
            trigger.fire(generation).await;
        }));
        info!(generation, wait_secs = self.wait.as_secs(), players, referees, "Start countdown armed");
        Some(deadline)
    }

    /// Handles a fired countdown. `true` means the league must start now.
    pub fn on_expiry(&mut self, generation: u64) -> bool {
        if self.started {
            debug!(generation, "Countdown fired after start, ignoring");
            return false;
        }
        if generation != self.generation {
            debug!(generation, current = self.generation, "Stale countdown, ignoring");
            return false;
        }
        self.started = true;
        self.timer = None;
        self.deadline = None;
        true
    }

    /// Starts without waiting for the countdown. `false` if already started.
    pub async fn start_now(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.deadline = None;
        if let Some(timer) = self.timer.take() {
            timer.cancel().await;
        }
        true
    }

    /// Cancels a pending countdown without starting.
    pub async fn disarm(&mut self) {
        self.deadline = None;
        if let Some(timer) = self.timer.take() {
            timer.cancel().await;
        }
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records fired generations instead of messaging a manager.
    #[derive(Default)]
    struct Recorder {
        fired: Mutex<Vec<(u64, Instant)>>,
    }

    #[async_trait]
    impl StartTrigger for Recorder {
        async fn fire(&self, generation: u64) {
            self.fired.lock().unwrap().push((generation, Instant::now()));
        }
    }

    fn coordinator(wait: u64) -> (LeagueStartCoordinator, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let coordinator =
            LeagueStartCoordinator::new(2, 1, Duration::from_secs(wait), recorder.clone());
        (coordinator, recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_thresholds() {
        let (mut c, recorder) = coordinator(5);
        assert_eq!(c.evaluate(1, 1).await, None);
        assert_eq!(c.evaluate(2, 0).await, None);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(recorder.fired.lock().unwrap().is_empty());

        assert!(c.evaluate(2, 1).await.is_some());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(recorder.fired.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_joiner_extends_countdown() {
        let (mut c, recorder) = coordinator(10);
        let t0 = Instant::now();
        c.evaluate(2, 1).await;

        tokio::time::sleep(Duration::from_secs(7)).await;
        let second = Instant::now();
        let deadline = c.evaluate(3, 1).await.unwrap();
        assert_eq!(deadline, second + Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(recorder.fired.lock().unwrap().is_empty(), "fired before second deadline");

        tokio::time::sleep(Duration::from_secs(10)).await;
        let fired = recorder.fired.lock().unwrap().clone();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 2);
        assert!(fired[0].1 >= t0 + Duration::from_secs(17));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_generation_starts() {
        let (mut c, _recorder) = coordinator(1);
        c.evaluate(2, 1).await;
        c.evaluate(2, 1).await;
        assert_eq!(c.generation(), 2);

        assert!(!c.on_expiry(1));
        assert!(c.on_expiry(2));
        assert!(!c.on_expiry(2));
        assert!(c.has_started());
        assert_eq!(c.evaluate(5, 5).await, None);
        assert!(!c.start_now().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_now_cancels_countdown() {
        let (mut c, recorder) = coordinator(3);
        c.evaluate(2, 1).await;
        assert!(c.start_now().await);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(recorder.fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_in_flight_expiry() {
        let token_fired = Arc::new(Mutex::new(false));
        let flag = token_fired.clone();
        let timer = CancellableTimer::arm(Duration::from_secs(1), move || async move {
            // Expiry that blocks, like a send into a full mailbox.
            tokio::time::sleep(Duration::from_secs(100)).await;
            *flag.lock().unwrap() = true;
        });
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!timer.is_finished());
        timer.cancel().await;
        tokio::time::sleep(Duration::from_secs(200)).await;
        assert!(!*token_fired.lock().unwrap());
    }
}
