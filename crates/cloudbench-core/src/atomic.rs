//! Atomic action timers.
//!
//! A benchmark iteration is made of named sub-actions ("nova.boot_server",
//! "cleanup.neutron.pools", ...). Each one is timed and recorded in the order
//! it started; repeated names get a ` (n)` suffix so no measurement is lost.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::metrics::ATOMIC_ACTION_DURATION;

/// One timed sub-action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicAction {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Ordered, shareable collection of atomic action timings.
#[derive(Debug, Clone, Default)]
pub struct AtomicActions {
    inner: Arc<Mutex<Vec<AtomicAction>>>,
}

impl AtomicActions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing `name`; the measurement is recorded when the returned
    /// guard is dropped.
    #[must_use = "the action is recorded when the timer is dropped"]
    pub fn start(&self, name: impl Into<String>) -> ActionTimer {
        ActionTimer {
            actions: self.clone(),
            name: Some(name.into()),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Times a future as one atomic action.
    pub async fn time<F, T>(&self, name: impl Into<String>, fut: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let _timer = self.start(name);
        fut.await
    }

    /// Records a measurement taken elsewhere.
    pub fn record(&self, name: impl Into<String>, started_at: DateTime<Utc>, duration: Duration) {
        let name = name.into();
        ATOMIC_ACTION_DURATION
            .with_label_values(&[&name])
            .observe(duration.as_secs_f64());

        let mut actions = self.inner.lock();
        let name = unique_name(&actions, name);
        actions.push(AtomicAction {
            name,
            started_at,
            duration,
        });
    }

    /// Returns the recorded actions in start order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AtomicAction> {
        self.inner.lock().clone()
    }

    /// Duration of the first action recorded under exactly `name`.
    #[must_use]
    pub fn duration_of(&self, name: &str) -> Option<Duration> {
        self.inner
            .lock()
            .iter()
            .find(|action| action.name == name)
            .map(|action| action.duration)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

fn unique_name(existing: &[AtomicAction], name: String) -> String {
    if !existing.iter().any(|action| action.name == name) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", name, n);
        if !existing.iter().any(|action| action.name == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Guard returned by [`AtomicActions::start`].
#[derive(Debug)]
pub struct ActionTimer {
    actions: AtomicActions,
    name: Option<String>,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Drop for ActionTimer {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            self.actions
                .record(name, self.started_at, self.started.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_records_elapsed_time() {
        let actions = AtomicActions::new();

        actions
            .time("swift.create_3_objects", async {
                tokio::time::sleep(Duration::from_secs(2)).await;
            })
            .await;

        assert_eq!(actions.len(), 1);
        let duration = actions.duration_of("swift.create_3_objects").unwrap();
        assert!(duration >= Duration::from_secs(2));
    }

    #[test]
    fn test_repeated_names_are_suffixed() {
        let actions = AtomicActions::new();
        actions.record("nova.list_servers", Utc::now(), Duration::from_millis(5));
        actions.record("nova.list_servers", Utc::now(), Duration::from_millis(7));
        actions.record("nova.list_servers", Utc::now(), Duration::from_millis(9));

        let names: Vec<_> = actions.snapshot().into_iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            vec![
                "nova.list_servers",
                "nova.list_servers (2)",
                "nova.list_servers (3)"
            ]
        );
    }

    #[test]
    fn test_guard_records_on_drop() {
        let actions = AtomicActions::new();
        {
            let _timer = actions.start("ceilometer.list_samples_in_last_hours");
        }
        assert!(actions
            .duration_of("ceilometer.list_samples_in_last_hours")
            .is_some());
    }
}
