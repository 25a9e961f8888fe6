//! checker.rs — one detection cycle: fetch the feed, filter it down to
//! genuine free promotions, record them in the ledger, fan the batch out to
//! every registered recipient.

use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, FixedOffset};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::catalog::denylist::Denylist;
use crate::catalog::filter_candidates;
use crate::catalog::types::{CatalogProvider, PromotionCandidate};
use crate::ledger::{reference_now, NotificationLedger};
use crate::notify::{format, Notifier};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "promo_candidates_total",
            "Genuine free promotions detected (pre-ledger duplicates excluded)."
        );
        describe_counter!(
            "promo_notified_total",
            "Promotions recorded in the ledger and announced."
        );
        describe_counter!(
            "notify_failures_total",
            "Per-recipient delivery failures."
        );
        describe_counter!(
            "catalog_fetch_errors_total",
            "Feed fetch/parse errors (cycle treated as zero candidates)."
        );
        describe_histogram!("catalog_fetch_ms", "Feed fetch + parse time in milliseconds.");
        describe_gauge!("check_last_run_ts", "Unix ts when a check last ran.");
        describe_gauge!("recipients", "Registered recipient count.");
    });
}

/// Last-run bookkeeping for the /status surface.
#[derive(Debug, Default)]
pub struct CheckStatus {
    last_check: Mutex<Option<DateTime<FixedOffset>>>,
}

impl CheckStatus {
    pub fn record_run(&self) {
        let mut g = self.last_check.lock().expect("status mutex poisoned");
        *g = Some(reference_now());
    }

    pub fn last_check(&self) -> Option<DateTime<FixedOffset>> {
        *self.last_check.lock().expect("status mutex poisoned")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Newly-detected promotions this cycle.
    pub candidates: usize,
    /// Recipients the batch was delivered to.
    pub notified_recipients: usize,
    /// Per-recipient delivery failures.
    pub failures: usize,
}

/// Run one check. `manual` controls whether an empty result is announced to
/// recipients ("no promotions found") or only logged.
///
/// Every new promotion is persisted in the ledger *before* any send, so a
/// crash mid-batch can drop a notification but never duplicate one.
pub async fn run_check(
    provider: &dyn CatalogProvider,
    ledger: &NotificationLedger,
    notifier: &dyn Notifier,
    denylist: &Denylist,
    status: &CheckStatus,
    manual: bool,
) -> CheckOutcome {
    ensure_metrics_described();

    let t0 = Instant::now();
    let snapshot = match provider.fetch_snapshot().await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = ?e, provider = provider.name(), "catalog fetch failed");
            counter!("catalog_fetch_errors_total").increment(1);
            finish_run(status, ledger);
            return CheckOutcome::default();
        }
    };
    histogram!("catalog_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let candidates = filter_candidates(&snapshot, |id| ledger.is_notified(id), denylist);
    tracing::info!(
        candidates = candidates.len(),
        provider = provider.name(),
        "genuine free promotions found"
    );

    // Record first, then notify. The re-check catches an id appearing twice
    // in one snapshot.
    let mut fresh: Vec<PromotionCandidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if ledger.is_notified(&c.app_id) {
            continue;
        }
        ledger.mark_notified(&c.app_id, &c.name);
        fresh.push(c);
    }
    counter!("promo_candidates_total").increment(fresh.len() as u64);

    let recipients = ledger.recipients();
    finish_run(status, ledger);

    if fresh.is_empty() {
        if manual {
            let text = format::no_promotions_text();
            let (sent, failures) = deliver_to_all(notifier, &recipients, &text).await;
            return CheckOutcome {
                candidates: 0,
                notified_recipients: sent,
                failures,
            };
        }
        tracing::info!("no new promotions this cycle");
        return CheckOutcome::default();
    }

    let text = format::promotions_text(&fresh);
    let (sent, failures) = deliver_to_all(notifier, &recipients, &text).await;
    counter!("promo_notified_total").increment(fresh.len() as u64);
    tracing::info!(
        promotions = fresh.len(),
        recipients = sent,
        failures,
        "promotion batch delivered"
    );

    CheckOutcome {
        candidates: fresh.len(),
        notified_recipients: sent,
        failures,
    }
}

/// Send `text` to every recipient; a failed send is logged and the batch
/// continues with the next chat.
async fn deliver_to_all(notifier: &dyn Notifier, recipients: &[i64], text: &str) -> (usize, usize) {
    let mut sent = 0usize;
    let mut failures = 0usize;
    for &chat_id in recipients {
        match notifier.send_text(chat_id, text).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failures += 1;
                counter!("notify_failures_total").increment(1);
                tracing::warn!(error = ?e, chat_id, "notification failed");
            }
        }
    }
    (sent, failures)
}

fn finish_run(status: &CheckStatus, ledger: &NotificationLedger) {
    status.record_run();
    gauge!("check_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    gauge!("recipients").set(ledger.recipient_count() as f64);
}
