#![allow(dead_code)]

use async_trait::async_trait;
use openweather_core::{PreparedRequest, Transport, TransportOutcome};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::Notify;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Transport double: records every request and answers with a canned outcome,
/// optionally waiting for [`RecordingTransport::release`] first.
#[derive(Debug)]
pub struct RecordingTransport {
    calls: Mutex<Vec<(PreparedRequest, Duration)>>,
    outcome: TransportOutcome,
    gate: Option<Notify>,
}

impl RecordingTransport {
    pub fn returning(outcome: TransportOutcome) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), outcome, gate: None })
    }

    pub fn gated(outcome: TransportOutcome) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), outcome, gate: Some(Notify::new()) })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.calls.lock().unwrap().iter().map(|(req, _)| req.clone()).collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, request: &PreparedRequest, timeout: Duration) -> TransportOutcome {
        self.calls.lock().unwrap().push((request.clone(), timeout));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.outcome.clone()
    }
}
