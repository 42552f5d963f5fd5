//! Periodic counter store health check.
//!
//! Publishes `site_counter_store_up` (1 healthy, 0 unreachable) and logs
//! when the store goes down or comes back.

use std::time::Duration;

use anyhow::Result;
use metrics::gauge;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use view_counter::{StoreStatus, ViewCounter};

/// Check the store every `every` until `shutdown` fires. Returns at once
/// when counting is disabled.
pub async fn monitor_store(
    views: ViewCounter,
    every: Duration,
    shutdown: CancellationToken,
) -> Result<()> {
    if !views.is_enabled() {
        tracing::info!("view counters disabled, store health checks off");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = ticker.tick() => {
                let status = views.status().await;
                report_transition(last, status);
                last = Some(status);
            }
        }
    }
}

fn report_transition(previous: Option<StoreStatus>, current: StoreStatus) {
    gauge!("site_counter_store_up").set(if current == StoreStatus::Healthy { 1.0 } else { 0.0 });

    match (previous, current) {
        (Some(StoreStatus::Healthy), StoreStatus::Unreachable) => {
            tracing::warn!("counter store became unreachable");
        }
        (Some(StoreStatus::Unreachable), StoreStatus::Healthy) => {
            tracing::info!("counter store recovered");
        }
        (None, status) => {
            tracing::info!("counter store {}", status.as_str());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingStore;
    use std::sync::Arc;
    use view_counter::CounterStore;

    #[tokio::test]
    async fn test_disabled_counter_returns_immediately() {
        let result = monitor_store(
            ViewCounter::disabled(),
            Duration::from_millis(5),
            CancellationToken::new(),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_checks_repeatedly_until_cancelled() {
        let store = Arc::new(RecordingStore::new());
        let views = ViewCounter::new(store.clone() as Arc<dyn CounterStore>, "pageviews");
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(monitor_store(
            views,
            Duration::from_millis(5),
            shutdown.clone(),
        ));

        tokio::time::timeout(Duration::from_secs(5), async {
            while store.ping_calls() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }
}
