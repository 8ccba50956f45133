use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use smartpay_core::Intent;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rejected_total: AtomicU64,
    check_balance_total: AtomicU64,
    send_money_total: AtomicU64,
    withdraw_total: AtomicU64,
    unknown_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rejected_total: u64,
    pub check_balance_total: u64,
    pub send_money_total: u64,
    pub withdraw_total: u64,
    pub unknown_total: u64,
    pub avg_latency_micros: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("smartpay_rejected_total").increment(1);
    }

    pub fn record_intent(&self, intent: Intent) {
        let counter = match intent {
            Intent::CheckBalance => &self.check_balance_total,
            Intent::SendMoney => &self.send_money_total,
            Intent::Withdraw => &self.withdraw_total,
            Intent::Unknown => &self.unknown_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("smartpay_intent_total", "intent" => intent.as_label()).increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        let _ = self.total_latency_micros.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |total| Some(total.saturating_add(micros)),
        );
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            check_balance_total: self.check_balance_total.load(Ordering::Relaxed),
            send_money_total: self.send_money_total.load(Ordering::Relaxed),
            withdraw_total: self.withdraw_total.load(Ordering::Relaxed),
            unknown_total: self.unknown_total.load(Ordering::Relaxed),
            avg_latency_micros: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,smartpay_api=info,smartpay_client=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
