//! Periodic ticker that drives the elapsed-time display

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Tick from a specific run of the timer.
///
/// Ticks already queued when the timer is restarted or cancelled carry an old
/// generation and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub generation: u64,
}

/// Single periodic timer owned by one coordinator
pub struct CallTimer {
    tx: mpsc::UnboundedSender<TimerTick>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl CallTimer {
    pub fn new(tx: mpsc::UnboundedSender<TimerTick>) -> Self {
        Self {
            tx,
            generation: 0,
            task: None,
        }
    }

    /// Start ticking every `interval`, first tick immediately. Restarts if
    /// already running. Must be called from within a tokio runtime.
    pub fn start(&mut self, interval: Duration) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(TimerTick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop ticking. Safe to call when not running.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
            debug!("Call timer {} cancelled", self.generation);
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Whether `tick` belongs to the current run
    pub fn accepts(&self, tick: TimerTick) -> bool {
        self.is_running() && tick.generation == self.generation
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Format seconds as `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_elapsed_time(elapsed_seconds: i64) -> String {
    let total = elapsed_seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_time() {
        assert_eq!(format_elapsed_time(0), "00:00");
        assert_eq!(format_elapsed_time(5), "00:05");
        assert_eq!(format_elapsed_time(65), "01:05");
        assert_eq!(format_elapsed_time(3599), "59:59");
        assert_eq!(format_elapsed_time(3600), "1:00:00");
        assert_eq!(format_elapsed_time(36_125), "10:02:05");
        assert_eq!(format_elapsed_time(-3), "00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_at_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CallTimer::new(tx);

        timer.start(Duration::from_millis(1000));
        assert!(timer.is_running());

        // First tick is immediate
        let first = rx.recv().await.unwrap();
        assert!(timer.accepts(first));

        tokio::time::advance(Duration::from_millis(1000)).await;
        let second = rx.recv().await.unwrap();
        assert_eq!(second.generation, first.generation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_invalidates_old_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CallTimer::new(tx);

        timer.start(Duration::from_millis(1000));
        let old = rx.recv().await.unwrap();

        timer.start(Duration::from_millis(1000));
        assert!(!timer.accepts(old));

        let fresh = rx.recv().await.unwrap();
        assert!(timer.accepts(fresh));
    }

    #[tokio::test]
    async fn test_cancel_is_safe_when_idle() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timer = CallTimer::new(tx);

        timer.cancel();
        timer.start(Duration::from_secs(1));
        timer.cancel();
        timer.cancel();
        assert!(!timer.is_running());
        assert!(!timer.accepts(TimerTick { generation: 1 }));
    }
}
