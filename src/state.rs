use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::data_api::DataApiClient;
use crate::services::ScheduleBoard;
use crate::services::auth::LoginMode;
use crate::session::SessionContext;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub data_api: Arc<dyn DataApiClient>,
    pub session: Arc<SessionContext>,
    pub board: Arc<Mutex<ScheduleBoard>>,
    pub login_mode: LoginMode,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        data_api: Arc<dyn DataApiClient>,
        session: SessionContext,
        login_mode: LoginMode,
    ) -> Self {
        Self {
            db,
            data_api,
            session: Arc::new(session),
            board: Arc::new(Mutex::new(ScheduleBoard::default())),
            login_mode,
        }
    }
}
