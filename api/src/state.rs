use sea_orm::DatabaseConnection;
use services::access_code::AccessCodeManager;
use services::backend::EventBackend;
use services::scan_recorder::ScanRecorder;
use services::station::ScanStation;
use services::volunteer_session::VolunteerSessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use util::{config, ws::WebSocketManager};

/// Everything a handler needs, built once at startup and cloned per request.
///
/// The scanning flow is singular per device, so the [`ScanStation`] sits behind
/// one mutex; access codes are per event and carry their own locking.
#[derive(Clone)]
pub struct AppState {
    ws: WebSocketManager,
    backend: Arc<dyn EventBackend>,
    access_codes: Arc<AccessCodeManager>,
    station: Arc<Mutex<ScanStation>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, backend: Arc<dyn EventBackend>) -> Self {
        let ttl = Duration::from_secs(config::access_code_ttl_seconds());
        let access_codes = Arc::new(AccessCodeManager::new(backend.clone(), ttl));
        let station = ScanStation::new(
            VolunteerSessionManager::new(db.clone(), backend.clone()),
            ScanRecorder::new(db.clone(), backend.clone()),
            backend.clone(),
        );

        Self {
            ws: WebSocketManager::new(),
            backend,
            access_codes,
            station: Arc::new(Mutex::new(station)),
        }
    }

    pub fn ws(&self) -> &WebSocketManager {
        &self.ws
    }

    pub fn ws_clone(&self) -> WebSocketManager {
        self.ws.clone()
    }

    pub fn backend(&self) -> &Arc<dyn EventBackend> {
        &self.backend
    }

    pub fn access_codes(&self) -> &Arc<AccessCodeManager> {
        &self.access_codes
    }

    pub fn station(&self) -> &Arc<Mutex<ScanStation>> {
        &self.station
    }
}
