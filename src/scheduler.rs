// src/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::catalog::denylist::Denylist;
use crate::catalog::types::CatalogProvider;
use crate::checker::{self, CheckStatus};
use crate::ledger::NotificationLedger;
use crate::notify::Notifier;

#[derive(Clone, Copy, Debug)]
pub struct CheckSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the periodic check task. Ticks run serially: the loop awaits each
/// check, so a slow cycle delays the next tick rather than overlapping it.
pub fn spawn_check_scheduler(
    cfg: CheckSchedulerCfg,
    provider: Arc<dyn CatalogProvider>,
    ledger: Arc<NotificationLedger>,
    notifier: Arc<dyn Notifier>,
    denylist: Arc<Denylist>,
    status: Arc<CheckStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            let outcome = checker::run_check(
                provider.as_ref(),
                &ledger,
                notifier.as_ref(),
                &denylist,
                &status,
                false,
            )
            .await;

            counter!("check_runs_total").increment(1);
            tracing::info!(
                target: "scheduler",
                candidates = outcome.candidates,
                recipients = outcome.notified_recipients,
                failures = outcome.failures,
                "scheduled check tick"
            );
        }
    })
}
