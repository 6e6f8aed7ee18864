use crate::config::AuditConfig;
use crate::db::{Sender, WhisperId};
use crate::whisper::transport::AuditSink;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Content of an audit copy, built from a whisper that has already been stored
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub whisper_id: WhisperId,
    pub sender: Sender,
    pub target_username: String,
    pub secret_text: String,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn render(&self) -> String {
        format!(
            "📝 Whisper {}\nFrom: @{} ({})\nTo: @{}\nTime: {}\nMessage: {}",
            self.whisper_id,
            self.sender.handle_or("No username"),
            self.sender.id,
            self.target_username,
            self.created_at.format("%Y-%m-%d %H:%M UTC"),
            self.secret_text
        )
    }
}

/// Outcome of one audit fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub delivered: usize,
    pub failed: Vec<i64>,
}

/// Sends a copy of every created whisper to the configured operators.
///
/// Dispatch never blocks the caller and never reports failure back into the
/// creation path; the returned handle is the only channel for the outcome.
#[derive(Clone)]
pub struct AuditNotifier {
    sink: Arc<dyn AuditSink>,
    operator_ids: Arc<[i64]>,
    timeout: Duration,
}

impl std::fmt::Debug for AuditNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditNotifier")
            .field("operator_ids", &self.operator_ids)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AuditNotifier {
    pub fn new(sink: Arc<dyn AuditSink>, config: &AuditConfig) -> Self {
        Self {
            sink,
            operator_ids: config.operator_ids.clone().into(),
            timeout: config.timeout(),
        }
    }

    /// Fan the record out to every operator on a background task
    pub fn dispatch(&self, record: AuditRecord) -> JoinHandle<AuditReport> {
        let sink = self.sink.clone();
        let operator_ids = self.operator_ids.clone();
        let timeout = self.timeout;

        tokio::spawn(async move { notify_all(sink.as_ref(), &operator_ids, timeout, &record).await })
    }
}

async fn notify_all(
    sink: &dyn AuditSink,
    operator_ids: &[i64],
    timeout: Duration,
    record: &AuditRecord,
) -> AuditReport {
    if operator_ids.is_empty() {
        return AuditReport::default();
    }

    let text = record.render();
    let attempts = operator_ids.iter().map(|&operator_id| {
        let text = &text;
        async move {
            let delivered = match tokio::time::timeout(timeout, sink.notify(operator_id, text)).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    warn!(
                        "Failed to send audit copy of whisper {} to {}: {}",
                        record.whisper_id, operator_id, e
                    );
                    false
                }
                Err(_) => {
                    warn!(
                        "Audit copy of whisper {} to {} timed out after {:?}",
                        record.whisper_id, operator_id, timeout
                    );
                    false
                }
            };
            (operator_id, delivered)
        }
    });

    let mut report = AuditReport::default();
    for (operator_id, delivered) in futures::future::join_all(attempts).await {
        if delivered {
            report.delivered += 1;
        } else {
            report.failed.push(operator_id);
        }
    }

    debug!(
        "Audit copy of whisper {} delivered to {}/{} operators",
        record.whisper_id,
        report.delivered,
        operator_ids.len()
    );
    report
}
