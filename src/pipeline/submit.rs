//! Submission: confirmed scores → spreadsheet webhook, fire-and-forget.
//!
//! Delivery is best effort and at most once. The flow moves to the success
//! screen as soon as the send is scheduled; whatever happens to the request
//! afterwards (network error, error status, even a panic inside the sink)
//! is only logged. Nothing is retried and the response body is never read.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::FlowConfig;
use crate::error::BoletimError;
use crate::messages;
use crate::output::{ReportCardData, Score};

/// `toLocaleString('pt-BR')` layout, e.g. `17/10/2025, 14:03:05`.
pub const PT_BR_DATETIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Row appended to the spreadsheet.
///
/// Keys are the column names the Apps Script expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub cpf: String,
    pub nome: String,
    pub natureza: Option<Score>,
    pub humanas: Option<Score>,
    pub linguagens: Option<Score>,
    pub matematica: Option<Score>,
    pub redacao: Option<Score>,
    /// `"SIM"` or `"NÃO"`.
    pub passou: String,
    pub data_envio: String,
}

impl SubmissionPayload {
    /// Build the payload stamped with the current local time.
    pub fn now(cpf: &str, data: &ReportCardData) -> Self {
        Self::at(cpf, data, &Local::now())
    }

    /// Build the payload stamped with `submitted_at`.
    pub fn at<Tz: TimeZone>(cpf: &str, data: &ReportCardData, submitted_at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self {
            cpf: cpf.to_string(),
            nome: data
                .student_name
                .clone()
                .unwrap_or_else(|| messages::NAME_PLACEHOLDER.to_string()),
            natureza: data.natural_sciences,
            humanas: data.human_sciences,
            linguagens: data.languages,
            matematica: data.mathematics,
            redacao: data.essay,
            passou: if data.is_passing {
                messages::PASSING_TOKEN
            } else {
                messages::FAILING_TOKEN
            }
            .to_string(),
            data_envio: submitted_at.format(PT_BR_DATETIME_FORMAT).to_string(),
        }
    }
}

/// Destination for confirmed submissions.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), BoletimError>;
}

/// Posts submissions as JSON to the spreadsheet webhook.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(config: &FlowConfig) -> Result<Self, BoletimError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.webhook_timeout_secs))
            .build()
            .map_err(|e| BoletimError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl SubmissionSink for WebhookSink {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), BoletimError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| BoletimError::WebhookFailed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BoletimError::WebhookFailed {
                url: self.url.clone(),
                reason: format!("HTTP {status}"),
            });
        }
        debug!("Webhook answered HTTP {}", status);
        Ok(())
    }
}

/// Schedules deliveries without ever blocking the flow.
#[derive(Clone)]
pub struct SubmissionDispatcher {
    sink: Arc<dyn SubmissionSink>,
}

impl fmt::Debug for SubmissionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionDispatcher")
            .field("sink", &"<dyn SubmissionSink>")
            .finish()
    }
}

impl SubmissionDispatcher {
    pub fn new(sink: Arc<dyn SubmissionSink>) -> Self {
        Self { sink }
    }

    /// Spawn the delivery on the current Tokio runtime and return at once.
    ///
    /// Outside a runtime the delivery is skipped (and logged); the caller
    /// proceeds either way.
    pub fn dispatch(&self, payload: SubmissionPayload) -> DeliveryHandle {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("No Tokio runtime available, submission for {} not sent", payload.cpf);
            return DeliveryHandle { task: None };
        };

        info!("Sending submission to the spreadsheet (passou: {})", payload.passou);
        let sink = Arc::clone(&self.sink);
        let delivery = runtime.spawn(async move { sink.deliver(&payload).await });

        // Observe the delivery from a second task so a panicking sink is
        // logged even when nobody awaits the handle.
        let task = runtime.spawn(async move {
            match delivery.await {
                Ok(Ok(())) => {
                    info!("Submission delivered");
                    true
                }
                Ok(Err(e)) => {
                    error!("Erro ao enviar dados (mas prosseguindo para sucesso): {e}");
                    false
                }
                Err(join_err) => {
                    error!("Submission task aborted (mas prosseguindo para sucesso): {join_err}");
                    false
                }
            }
        });

        DeliveryHandle { task: Some(task) }
    }
}

/// Handle on a scheduled delivery.
///
/// Dropping it does not cancel the send. The flow never awaits it; a
/// front-end may await [`DeliveryHandle::settled`] before exiting so the
/// process does not end mid-request.
#[derive(Debug)]
#[must_use = "dropping the handle is fine, but await `settled()` before process exit"]
pub struct DeliveryHandle {
    task: Option<JoinHandle<bool>>,
}

impl DeliveryHandle {
    /// Wait for the delivery to finish; `true` if the sink reported success.
    pub async fn settled(self) -> bool {
        match self.task {
            Some(task) => task.await.unwrap_or_else(|e| {
                warn!("Delivery observer failed: {e}");
                false
            }),
            None => false,
        }
    }

    /// Whether a delivery was actually scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.task.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Subject;
    use chrono::FixedOffset;
    use std::sync::Mutex;

    fn report(name: Option<&str>) -> ReportCardData {
        let obj = |v| Score::for_subject(Subject::Mathematics, v);
        ReportCardData::new(
            obj(120.0),
            obj(90.0),
            obj(150.0),
            None,
            Score::for_subject(Subject::Essay, 6.0),
            name.map(str::to_string),
        )
    }

    fn brasilia_afternoon() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 10, 17, 14, 3, 5)
            .unwrap()
    }

    #[test]
    fn payload_fields() {
        let payload = SubmissionPayload::at("123.456.789-01", &report(Some("Maria")), &brasilia_afternoon());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cpf": "123.456.789-01",
                "nome": "Maria",
                "natureza": 120,
                "humanas": 90,
                "linguagens": 150,
                "matematica": null,
                "redacao": 6,
                "passou": "NÃO",
                "data_envio": "17/10/2025, 14:03:05",
            })
        );
    }

    #[test]
    fn missing_name_uses_placeholder_and_pass_token() {
        let data = ReportCardData::new(None, None, None, None, None, None);
        let payload = SubmissionPayload::at("123.456.789-01", &data, &brasilia_afternoon());
        assert_eq!(payload.nome, "Não identificado");
        assert_eq!(payload.passou, "SIM");
    }

    struct RecordingSink(Mutex<Vec<SubmissionPayload>>);

    #[async_trait]
    impl SubmissionSink for RecordingSink {
        async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), BoletimError> {
            self.0.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl SubmissionSink for FailingSink {
        async fn deliver(&self, _payload: &SubmissionPayload) -> Result<(), BoletimError> {
            Err(BoletimError::WebhookFailed {
                url: "http://sheet".into(),
                reason: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
        let dispatcher = SubmissionDispatcher::new(sink.clone());
        let handle = dispatcher.dispatch(SubmissionPayload::now("123.456.789-01", &report(None)));
        assert!(handle.is_scheduled());
        assert!(handle.settled().await);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_delivery_is_reported_not_raised() {
        let dispatcher = SubmissionDispatcher::new(Arc::new(FailingSink));
        let handle = dispatcher.dispatch(SubmissionPayload::now("123.456.789-01", &report(None)));
        assert!(!handle.settled().await);
    }

    #[test]
    fn dispatch_without_runtime_is_skipped() {
        let dispatcher = SubmissionDispatcher::new(Arc::new(FailingSink));
        let handle = dispatcher.dispatch(SubmissionPayload::now("123.456.789-01", &report(None)));
        assert!(!handle.is_scheduled());
    }
}
