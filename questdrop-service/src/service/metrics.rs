use log::debug;
use prometheus::{Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};
use questdrop_core::foundation::QuestDropError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub webhook_processed: u64,
    pub webhook_unrecognized: u64,
    pub webhook_rejected: u64,
    pub airdrops_issued: u64,
    pub reconcile_completed: u64,
    pub reconcile_failed: u64,
}

pub struct Metrics {
    registry: Registry,
    webhook_events_total: IntCounterVec,
    ledger_syncs_total: IntCounterVec,
    airdrops_issued_total: IntCounter,
    reconcile_entries_total: IntCounterVec,
    started_at: Instant,
    webhook_processed: AtomicU64,
    webhook_unrecognized: AtomicU64,
    webhook_rejected: AtomicU64,
    airdrops_issued: AtomicU64,
    reconcile_completed: AtomicU64,
    reconcile_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Result<Self, QuestDropError> {
        debug!("initializing prometheus metrics");
        let registry = Registry::new();
        let webhook_events_total =
            IntCounterVec::new(prometheus::Opts::new("webhook_events_total", "Webhook deliveries by outcome"), &["outcome"])
                .map_err(|err| QuestDropError::Message(err.to_string()))?;
        let ledger_syncs_total =
            IntCounterVec::new(prometheus::Opts::new("ledger_syncs_total", "Objective syncs by outcome"), &["outcome"])
                .map_err(|err| QuestDropError::Message(err.to_string()))?;
        let airdrops_issued_total = IntCounter::new("airdrops_issued_total", "Airdrop transactions issued")
            .map_err(|err| QuestDropError::Message(err.to_string()))?;
        let reconcile_entries_total =
            IntCounterVec::new(prometheus::Opts::new("reconcile_entries_total", "Reconcile entries by outcome"), &["outcome"])
                .map_err(|err| QuestDropError::Message(err.to_string()))?;

        registry.register(Box::new(webhook_events_total.clone())).map_err(|err| QuestDropError::Message(err.to_string()))?;
        registry.register(Box::new(ledger_syncs_total.clone())).map_err(|err| QuestDropError::Message(err.to_string()))?;
        registry.register(Box::new(airdrops_issued_total.clone())).map_err(|err| QuestDropError::Message(err.to_string()))?;
        registry.register(Box::new(reconcile_entries_total.clone())).map_err(|err| QuestDropError::Message(err.to_string()))?;

        Ok(Self {
            registry,
            webhook_events_total,
            ledger_syncs_total,
            airdrops_issued_total,
            reconcile_entries_total,
            started_at: Instant::now(),
            webhook_processed: AtomicU64::new(0),
            webhook_unrecognized: AtomicU64::new(0),
            webhook_rejected: AtomicU64::new(0),
            airdrops_issued: AtomicU64::new(0),
            reconcile_completed: AtomicU64::new(0),
            reconcile_failed: AtomicU64::new(0),
        })
    }

    pub fn inc_webhook(&self, outcome: &str) {
        self.webhook_events_total.with_label_values(&[outcome]).inc();
        match outcome {
            "processed" => {
                self.webhook_processed.fetch_add(1, Ordering::Relaxed);
            }
            "unrecognized" => {
                self.webhook_unrecognized.fetch_add(1, Ordering::Relaxed);
            }
            "rejected" | "error" => {
                self.webhook_rejected.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn inc_sync(&self, already_synced: bool) {
        let outcome = if already_synced { "cached" } else { "sealed" };
        self.ledger_syncs_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_airdrop_issued(&self) {
        self.airdrops_issued_total.inc();
        self.airdrops_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconcile_entry(&self, failed: bool) {
        let outcome = if failed { "failed" } else { "completed" };
        self.reconcile_entries_total.with_label_values(&[outcome]).inc();
        if failed {
            self.reconcile_failed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.reconcile_completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started_at.elapsed(),
            webhook_processed: self.webhook_processed.load(Ordering::Relaxed),
            webhook_unrecognized: self.webhook_unrecognized.load(Ordering::Relaxed),
            webhook_rejected: self.webhook_rejected.load(Ordering::Relaxed),
            airdrops_issued: self.airdrops_issued.load(Ordering::Relaxed),
            reconcile_completed: self.reconcile_completed.load(Ordering::Relaxed),
            reconcile_failed: self.reconcile_failed.load(Ordering::Relaxed),
        }
    }

    pub fn encode(&self) -> Result<String, QuestDropError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer).map_err(|err| QuestDropError::Message(err.to_string()))?;
        String::from_utf8(buffer).map_err(|err| QuestDropError::Message(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_encoding() {
        let metrics = Metrics::new().expect("metrics");
        metrics.inc_webhook("processed");
        metrics.inc_airdrop_issued();
        metrics.inc_reconcile_entry(true);

        let body = metrics.encode().expect("encode");
        assert!(body.contains("webhook_events_total"));
        assert!(body.contains("airdrops_issued_total 1"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.webhook_processed, 1);
        assert_eq!(snapshot.reconcile_failed, 1);
    }
}
