//! Trailing-edge debounce
//!
//! [`DebounceMachine`] is the pure state machine (`Idle` / `Pending`);
//! [`Debounced`] drives it on the tokio timer and publishes settled values
//! through a watch channel.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Debounce state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceState<T> {
    /// Nothing waiting to settle
    Idle,
    /// `value` settles at `deadline` unless another input arrives first
    Pending { value: T, deadline: Instant },
}

/// Debounce state machine, independent of any timer
#[derive(Debug, Clone)]
pub struct DebounceMachine<T> {
    delay: Duration,
    state: DebounceState<T>,
}

impl<T> DebounceMachine<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> &DebounceState<T> {
        &self.state
    }

    /// New input: (re)start the window. Last write wins.
    pub fn input(&mut self, value: T, now: Instant) {
        self.state = DebounceState::Pending {
            value,
            deadline: now + self.delay,
        };
    }

    /// When the pending value settles, if any
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Pending { deadline, .. } => Some(deadline),
            DebounceState::Idle => None,
        }
    }

    /// Timer fired: yields the settled value once the deadline has passed
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                match std::mem::replace(&mut self.state, DebounceState::Idle) {
                    DebounceState::Pending { value, .. } => Some(value),
                    DebounceState::Idle => None,
                }
            }
            _ => None,
        }
    }

    /// Drop any pending value
    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }
}

/// A value that settles `delay` after its last change
///
/// Must be created inside a tokio runtime. Dropping it cancels the pending
/// timer; no settled update is published afterwards.
#[derive(Debug)]
pub struct Debounced<T> {
    input: watch::Sender<T>,
    settled: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start with `initial` as both the raw and the settled value
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (settled_tx, settled) = watch::channel(initial);
        let task = tokio::spawn(run(input_rx, settled_tx, delay));
        Self {
            input,
            settled,
            task,
        }
    }

    /// Feed a new raw value; identical values do not restart the window
    pub fn set(&self, value: T) {
        self.input.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        });
    }

    /// Latest raw value
    pub fn raw(&self) -> T {
        self.input.borrow().clone()
    }

    /// Latest settled value
    pub fn get(&self) -> T {
        self.settled.borrow().clone()
    }

    /// Receiver notified each time a new value settles
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.clone()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(mut input: watch::Receiver<T>, settled: watch::Sender<T>, delay: Duration)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let mut machine = DebounceMachine::new(delay);

    loop {
        match machine.deadline() {
            None => {
                if input.changed().await.is_err() {
                    return;
                }
                machine.input(input.borrow_and_update().clone(), Instant::now());
            }
            Some(deadline) => {
                tokio::select! {
                    changed = input.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        machine.input(input.borrow_and_update().clone(), Instant::now());
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        if let Some(value) = machine.fire(Instant::now()) {
                            settled.send_if_modified(|current| {
                                if *current != value {
                                    *current = value;
                                    true
                                } else {
                                    false
                                }
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_last_write_wins() {
        let t0 = Instant::now();
        let mut machine = DebounceMachine::new(Duration::from_millis(300));

        machine.input("a", t0);
        machine.input("ab", t0 + Duration::from_millis(10));
        machine.input("abc", t0 + Duration::from_millis(20));

        assert_eq!(machine.deadline(), Some(t0 + Duration::from_millis(320)));
        assert_eq!(machine.fire(t0 + Duration::from_millis(319)), None);
        assert_eq!(machine.fire(t0 + Duration::from_millis(320)), Some("abc"));
        assert_eq!(*machine.state(), DebounceState::Idle);
        assert_eq!(machine.fire(t0 + Duration::from_millis(400)), None);
    }

    #[test]
    fn test_machine_cancel() {
        let t0 = Instant::now();
        let mut machine = DebounceMachine::new(Duration::from_millis(50));
        machine.input(1, t0);
        machine.cancel();
        assert_eq!(machine.fire(t0 + Duration::from_secs(1)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_once_after_quiet_period() {
        let start = Instant::now();
        let debounced = Debounced::new(String::new(), Duration::from_millis(300));
        let mut settled = debounced.subscribe();

        debounced.set("a".to_string());
        tokio::time::sleep(Duration::from_millis(10)).await;
        debounced.set("ab".to_string());
        tokio::time::sleep(Duration::from_millis(10)).await;
        debounced.set("abc".to_string());

        settled.changed().await.unwrap();
        let elapsed = start.elapsed();
        assert_eq!(*settled.borrow_and_update(), "abc");
        assert!(elapsed >= Duration::from_millis(320), "settled early: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(330), "settled late: {:?}", elapsed);

        // Observed exactly once
        let again = tokio::time::timeout(Duration::from_secs(5), settled.changed()).await;
        assert!(again.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_not_synchronous() {
        let debounced = Debounced::new(0u32, Duration::ZERO);
        let mut settled = debounced.subscribe();

        debounced.set(7);
        assert_eq!(debounced.get(), 0);
        assert_eq!(debounced.raw(), 7);

        settled.changed().await.unwrap();
        assert_eq!(*settled.borrow(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_update() {
        let debounced = Debounced::new("idle".to_string(), Duration::from_millis(100));
        let mut settled = debounced.subscribe();

        debounced.set("typing".to_string());
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(debounced);

        // Sender side goes away without publishing the pending value
        assert!(settled.changed().await.is_err());
        assert_eq!(*settled.borrow(), "idle");
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_value_does_not_restart_window() {
        let start = Instant::now();
        let debounced = Debounced::new(0u32, Duration::from_millis(100));
        let mut settled = debounced.subscribe();

        debounced.set(5);
        tokio::time::sleep(Duration::from_millis(60)).await;
        debounced.set(5);

        settled.changed().await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(110));
    }
}
