//! Shared application state

use civicport_backend::BackendClient;
use civicport_core::PortalConfig;
use civicport_notify::Dispatcher;
use civicport_portal::{AppointmentService, DocumentService, IssueService, SessionRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct AppState {
    pub config: PortalConfig,
    pub backend: Arc<BackendClient>,
    pub sessions: Arc<SessionRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub appointments: AppointmentService,
    pub issues: IssueService,
    pub documents: DocumentService,
    pub started_at: Instant,
}

impl AppState {
    pub fn from_config(config: PortalConfig) -> Self {
        let backend = Arc::new(BackendClient::from_config(&config.backend));
        let dispatcher = Arc::new(Dispatcher::from_config(&config.notify));
        let sessions = Arc::new(SessionRegistry::new(
            Duration::from_secs(config.gateway.session_ttl_secs),
            Duration::from_millis(config.backend.profile_timeout_ms),
        ));

        let appointments = AppointmentService::new(
            backend.clone(),
            dispatcher.clone(),
            config.qr.signing_secret.as_bytes().to_vec(),
            config.qr.module_size,
        );
        let issues = IssueService::new(backend.clone(), dispatcher.clone());
        let documents = DocumentService::new(backend.clone(), dispatcher.clone());

        Self {
            config,
            backend,
            sessions,
            dispatcher,
            appointments,
            issues,
            documents,
            started_at: Instant::now(),
        }
    }

    pub fn profile_timeout(&self) -> Duration {
        Duration::from_millis(self.config.backend.profile_timeout_ms)
    }
}
