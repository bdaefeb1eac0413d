//! Registration facade
//!
//! [`CrashManager::register`] wires everything together for a host
//! application: it loads the context snapshot, installs the panic capture
//! hook and, when reports from earlier runs are waiting, starts an upload
//! pass on a background thread.

use std::sync::Arc;
use std::thread;

use quincy_core::{Config, ContextSnapshot, IHostEnvironment, ReportStore, SystemEnvironment};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::error::ReporterError;
use crate::hook::{self, CaptureHook, Installation};
use crate::uploader::{UploadSummary, Uploader};

/// Name of the background upload thread.
pub const UPLOAD_THREAD_NAME: &str = "quincy-upload";

// ============================================================================
// UploadHandle
// ============================================================================

/// Completion handle of a background upload pass.
///
/// Dropping the handle leaves the pass running to completion on its own.
#[derive(Debug)]
pub struct UploadHandle {
    receiver: oneshot::Receiver<UploadSummary>,
}

impl UploadHandle {
    /// Waits for the pass to finish.
    ///
    /// Returns `None` if the pass could not run to completion, e.g. because
    /// its runtime failed to start.
    pub async fn wait(self) -> Option<UploadSummary> {
        self.receiver.await.ok()
    }

    /// Blocks the current thread until the pass finishes.
    ///
    /// Must not be called from within an async runtime; use
    /// [`UploadHandle::wait`] there.
    pub fn join(self) -> Option<UploadSummary> {
        self.receiver.blocking_recv().ok()
    }
}

/// Starts one upload pass on a dedicated thread with its own runtime.
///
/// Returns `None` when the thread cannot be spawned; the reports then stay
/// on disk for the next registration.
pub fn spawn_upload(uploader: Uploader) -> Option<UploadHandle> {
    let (sender, receiver) = oneshot::channel();

    let spawned = thread::Builder::new()
        .name(UPLOAD_THREAD_NAME.to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!(error = %e, "Failed to start upload runtime");
                    return;
                }
            };

            let summary = runtime.block_on(uploader.submit());
            debug!(
                delivered = summary.delivered.len(),
                retained = summary.retained.len(),
                "Upload pass finished"
            );
            // The receiver may already be gone.
            let _ = sender.send(summary);
        });

    match spawned {
        Ok(_) => Some(UploadHandle { receiver }),
        Err(e) => {
            warn!(error = %e, "Failed to spawn upload thread");
            None
        }
    }
}

// ============================================================================
// CrashManager
// ============================================================================

/// A registered crash reporter.
///
/// Keeps the snapshot, store and uploader of one registration. The panic
/// hook stays installed for the rest of the process even after the manager
/// is dropped.
#[derive(Debug)]
pub struct CrashManager {
    identifier: String,
    snapshot: Arc<ContextSnapshot>,
    store: ReportStore,
    uploader: Result<Uploader, ReporterError>,
    installation: Installation,
    upload: Option<UploadHandle>,
}

impl CrashManager {
    /// Registers the reporter for the current process, reading device and
    /// package metadata from the local system.
    pub fn register(config: Config) -> Self {
        let env = SystemEnvironment::new(config.app.clone(), config.reports.dir.clone());
        Self::register_with(config, &env)
    }

    /// Registers with the default configuration for everything but the
    /// endpoint and, optionally, the application identifier.
    pub fn register_endpoint(url: impl Into<String>, identifier: Option<String>) -> Self {
        let mut config = Config::default();
        config.endpoint.url = url.into();
        config.app.identifier = identifier;
        Self::register(config)
    }

    /// Registers the reporter with a custom host environment.
    ///
    /// Registration never fails: the capture hook is always installed. An
    /// unusable endpoint only disables uploads, see
    /// [`CrashManager::upload_error`]; reports keep accumulating on disk.
    pub fn register_with(config: Config, env: &dyn IHostEnvironment) -> Self {
        let snapshot = Arc::new(ContextSnapshot::load(env, &config.app));

        let identifier = config
            .app
            .identifier
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| snapshot.app_package.clone())
            .unwrap_or_default();

        let reports_dir = config
            .reports
            .dir
            .clone()
            .or_else(|| snapshot.files_dir.clone())
            .unwrap_or_else(ReportStore::default_dir);
        let store = ReportStore::new(reports_dir);

        let capture = Arc::new(CaptureHook::new(Arc::clone(&snapshot), store.clone()));
        let installation = hook::install(capture);

        let uploader = build_uploader(&config, &identifier, &snapshot, &store);
        let upload = match &uploader {
            Ok(uploader) if uploader.has_pending() => spawn_upload(uploader.clone()),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Crash uploads disabled, reports stay on disk");
                None
            }
        };

        info!(
            app = %identifier,
            reports_dir = %store.dir().display(),
            installation = ?installation,
            upload_started = upload.is_some(),
            "Crash reporter registered"
        );

        Self {
            identifier,
            snapshot,
            store,
            uploader,
            installation,
            upload,
        }
    }

    /// Takes the handle of the upload pass started at registration, if any.
    pub fn take_upload(&mut self) -> Option<UploadHandle> {
        self.upload.take()
    }

    /// Runs an upload pass on the current runtime.
    ///
    /// With uploads disabled every pending report is retained.
    pub async fn submit(&self) -> UploadSummary {
        match &self.uploader {
            Ok(uploader) => uploader.submit().await,
            Err(e) => {
                warn!(error = %e, "Crash uploads disabled, skipping upload pass");
                let reason = format!("uploads disabled: {e}");
                let retained = self
                    .store
                    .list()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|name| (name, reason.clone()))
                    .collect();
                UploadSummary {
                    delivered: Vec::new(),
                    retained,
                }
            }
        }
    }

    /// Why uploads are disabled for this registration, if they are.
    pub fn upload_error(&self) -> Option<&ReporterError> {
        self.uploader.as_ref().err()
    }

    /// Returns `true` if reports are waiting to be delivered.
    pub fn has_pending(&self) -> bool {
        self.store.has_pending()
    }

    /// Deletes every pending report without sending it.
    pub fn delete_all(&self) -> u32 {
        self.store.delete_all()
    }

    /// Identifier reports are filed under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// How this registration installed the capture hook.
    pub fn installation(&self) -> Installation {
        self.installation
    }
}

/// Builds the uploader if the endpoint section is usable.
///
/// Only `endpoint.*` settings are checked; the rest of the configuration
/// has no bearing on delivery.
fn build_uploader(
    config: &Config,
    identifier: &str,
    snapshot: &Arc<ContextSnapshot>,
    store: &ReportStore,
) -> Result<Uploader, ReporterError> {
    let errors: Vec<_> = config
        .validate()
        .into_iter()
        .filter(|e| e.field.starts_with("endpoint."))
        .collect();
    if !errors.is_empty() {
        return Err(ReporterError::InvalidConfig(errors));
    }

    Uploader::new(
        &config.endpoint,
        identifier,
        Arc::clone(snapshot),
        store.clone(),
    )
}
