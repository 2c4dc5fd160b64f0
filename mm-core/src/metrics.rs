//! Prometheus metrics surface (§1a, §2a): counters/gauges for tick
//! latency, placements, cancels, fills, hedge dispatches, and pause/resume
//! transitions, served on a small HTTP endpoint. This is ambient
//! observability consumed by the out-of-scope dashboard façade, not the
//! façade itself.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use rust_decimal::Decimal;
use tokio::net::TcpListener;

use crate::core::types::Status;

pub struct Metrics {
    registry: Registry,
    placements: IntCounter,
    cancels: IntCounter,
    fills: IntCounter,
    hedge_dispatches: IntCounter,
    pauses: IntCounter,
    resumes: IntCounter,
    status_gauge: Gauge,
    position_gauge: Gauge,
    tick_latency_ms: Gauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let placements = IntCounter::new("mm_placements_total", "Total orders placed")?;
        let cancels = IntCounter::new("mm_cancels_total", "Total orders cancelled")?;
        let fills = IntCounter::new("mm_fills_total", "Total fills processed")?;
        let hedge_dispatches = IntCounter::new("mm_hedge_dispatches_total", "Total hedge orders dispatched")?;
        let pauses = IntCounter::new("mm_pauses_total", "Total pause transitions")?;
        let resumes = IntCounter::new("mm_resumes_total", "Total resume transitions")?;
        let status_gauge = Gauge::new("mm_status", "0=Running,1=Paused,2=Stopped")?;
        let position_gauge = Gauge::new("mm_position", "Current signed position")?;
        let tick_latency_ms = Gauge::new("mm_tick_latency_ms", "Last tick latency in ms")?;

        for c in [&placements, &cancels, &fills, &hedge_dispatches, &pauses, &resumes] {
            registry.register(Box::new(c.clone()))?;
        }
        for g in [&status_gauge, &position_gauge, &tick_latency_ms] {
            registry.register(Box::new(g.clone()))?;
        }

        Ok(Self {
            registry,
            placements,
            cancels,
            fills,
            hedge_dispatches,
            pauses,
            resumes,
            status_gauge,
            position_gauge,
            tick_latency_ms,
        })
    }

    pub fn inc_placement(&self) {
        self.placements.inc();
    }
    pub fn inc_cancel(&self) {
        self.cancels.inc();
    }
    pub fn inc_fill(&self) {
        self.fills.inc();
    }
    pub fn inc_hedge_dispatch(&self) {
        self.hedge_dispatches.inc();
    }
    pub fn inc_pause(&self) {
        self.pauses.inc();
    }
    pub fn inc_resume(&self) {
        self.resumes.inc();
    }

    pub fn observe_tick(&self, status: Status, position: Decimal) {
        let code = match status {
            Status::Running => 0.0,
            Status::Paused(_) => 1.0,
            Status::Stopped => 2.0,
        };
        self.status_gauge.set(code);
        self.position_gauge.set(position.to_string().parse::<f64>().unwrap_or(0.0));
    }

    pub fn observe_tick_latency_ms(&self, latency_ms: f64) {
        self.tick_latency_ms.set(latency_ms);
    }

    fn render(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf).unwrap_or_default();
        buf
    }

    /// Serves `/metrics` on `addr` until the process exits. Intended to be
    /// `tokio::task::spawn`ed once at startup.
    pub async fn serve(self: std::sync::Arc<Self>, addr: &str) -> anyhow::Result<()> {
        let addr = SocketAddr::from_str(addr)?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "metrics server listening");
        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let metrics = self.clone();
            tokio::task::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let metrics = metrics.clone();
                    async move {
                        let _ = req;
                        let body = metrics.render();
                        Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(body))))
                    }
                });
                if let Err(err) = Builder::new(hyper_util::rt::TokioExecutor::new())
                    .serve_connection(io, service)
                    .await
                {
                    tracing::warn!(error = %err, "metrics connection error");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = Metrics::new().unwrap();
        metrics.inc_placement();
        metrics.observe_tick(Status::Running, dec!(0.01));
        let rendered = String::from_utf8(metrics.render()).unwrap();
        assert!(rendered.contains("mm_placements_total"));
        assert!(rendered.contains("mm_status"));
    }
}
