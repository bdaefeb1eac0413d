//! Crash report uploader
//!
//! Walks the report store and POSTs every pending report to the collection
//! endpoint, one request per report. A report is deleted only when the server
//! answers with a status in `[200, 400)` and a non-empty body; anything else
//! leaves it on disk for the next pass. There is no retry within a pass.

use std::sync::Arc;
use std::time::Duration;

use quincy_core::config::EndpointConfig;
use quincy_core::{report, ContextSnapshot, ReportStore};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::{ReporterError, UploadError};
use crate::payload::{self, CrashPayload};
use crate::response::ServerStatus;

/// Successful delivery of one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP status code of the response
    pub status: u16,
    /// Status decoded from the response body, if the server sent one
    pub server_status: Option<ServerStatus>,
}

/// Outcome of one upload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Reports delivered and deleted
    pub delivered: Vec<String>,
    /// Reports left on disk, with the reason
    pub retained: Vec<(String, String)>,
}

impl UploadSummary {
    /// `true` when every report of the pass was delivered.
    pub fn is_clean(&self) -> bool {
        self.retained.is_empty()
    }
}

/// Delivers stored reports to the collection endpoint.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: Client,
    url: String,
    identifier: String,
    snapshot: Arc<ContextSnapshot>,
    store: ReportStore,
}

impl Uploader {
    /// Creates an uploader for `endpoint`.
    ///
    /// Certificate and hostname validation stay on unless the endpoint opts
    /// out with `insecure_skip_tls_verify`.
    pub fn new(
        endpoint: &EndpointConfig,
        identifier: impl Into<String>,
        snapshot: Arc<ContextSnapshot>,
        store: ReportStore,
    ) -> Result<Self, ReporterError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(endpoint.connect_timeout_secs))
            .user_agent(endpoint.user_agent.clone());

        if endpoint.insecure_skip_tls_verify {
            warn!(
                url = %endpoint.url,
                "TLS certificate and hostname verification disabled for crash uploads"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(ReporterError::HttpClient)?;

        Ok(Self {
            client,
            url: endpoint.url.clone(),
            identifier: identifier.into(),
            snapshot,
            store,
        })
    }

    /// Application identifier this uploader reports for.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Store the uploader reads from.
    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Returns `true` if the store holds at least one report.
    pub fn has_pending(&self) -> bool {
        self.store.has_pending()
    }

    /// Runs one upload pass over the reports pending right now.
    ///
    /// Reports written while the pass runs are left for the next one.
    /// Failures are logged and recorded in the summary; they never stop the
    /// pass.
    pub async fn submit(&self) -> UploadSummary {
        let mut summary = UploadSummary::default();

        let names = match self.store.list() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to list pending crash reports");
                return summary;
            }
        };

        if names.is_empty() {
            debug!(dir = %self.store.dir().display(), "No pending crash reports");
            return summary;
        }

        info!(
            app = %self.identifier,
            count = names.len(),
            url = %self.url,
            "Submitting pending crash reports"
        );

        for name in names {
            match self.submit_report(&name).await {
                Ok(delivery) => {
                    info!(
                        report = %name,
                        status = delivery.status,
                        server_status = ?delivery.server_status,
                        "Crash report delivered"
                    );
                    summary.delivered.push(name);
                }
                Err(e) => {
                    warn!(report = %name, error = %e, "Crash report kept for the next pass");
                    summary.retained.push((name, e.to_string()));
                }
            }
        }

        summary
    }

    /// Delivers one report and deletes it on success.
    pub async fn submit_report(&self, name: &str) -> Result<Delivery, UploadError> {
        let content = self.store.read(name)?;
        let parsed = report::parse(&content)?;

        let crash = CrashPayload::from_report(&parsed, &self.snapshot);
        let body = payload::multipart_body(&crash.to_document());

        debug!(report = name, bytes = body.len(), "Posting crash report");
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, payload::content_type())
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..400).contains(&status) || text.is_empty() {
            return Err(UploadError::Rejected { status, body: text });
        }

        let server_status = ServerStatus::parse(&text);
        if server_status.is_some_and(|s| s.is_failure()) {
            warn!(report = name, server_status = ?server_status, "Server reported a failure status");
        }

        self.store.delete(name);
        Ok(Delivery {
            status,
            server_status,
        })
    }
}
