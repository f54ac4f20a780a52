// ============================================================================
// APP STATE - Estado global del dashboard
// ============================================================================
// Agrega los stores y los servicios cableados sobre los puertos inyectados
// (API, storage, reloj, timers, spawner, canal entre pestañas).
// ============================================================================

use std::rc::Rc;

use crate::config::CONFIG;
use crate::services::api_client::DashboardApi;
use crate::services::auth_service::AuthService;
use crate::services::refresh_scheduler::RefreshScheduler;
use crate::services::token_events::TokenChannel;
use crate::services::website_service::WebsiteService;
use crate::state::session_state::SessionState;
use crate::state::website_state::WebsiteState;
use crate::utils::spawn::Spawner;
use crate::utils::storage::TokenStorage;
use crate::utils::time::Clock;
use crate::utils::timers::OneShotTimer;

pub struct AppState {
    pub session: SessionState,
    pub websites: WebsiteState,
    pub auth: Rc<AuthService>,
    pub website_service: Rc<WebsiteService>,
    pub scheduler: Rc<RefreshScheduler>,
}

impl AppState {
    pub fn new(
        api: Rc<dyn DashboardApi>,
        storage: Rc<dyn TokenStorage>,
        clock: Rc<dyn Clock>,
        timers: Rc<dyn OneShotTimer>,
        spawner: Rc<dyn Spawner>,
        channel: Rc<dyn TokenChannel>,
    ) -> Self {
        let session = SessionState::new(storage);
        let websites = WebsiteState::new();

        let auth = Rc::new(AuthService::new(
            api.clone(),
            session.clone(),
            websites.clone(),
            channel.clone(),
            clock.clone(),
        ));
        let website_service = Rc::new(WebsiteService::new(
            api,
            session.clone(),
            websites.clone(),
            clock.clone(),
        ));
        let scheduler = RefreshScheduler::new(
            auth.clone(),
            session.clone(),
            clock,
            timers,
            spawner,
            channel,
            CONFIG.refresh_lead_ms(),
        );

        Self {
            session,
            websites,
            auth,
            website_service,
            scheduler,
        }
    }
}
