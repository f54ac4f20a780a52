// ============================================================================
// WEBSITE SERVICE - Mutaciones optimistas sobre la colección de sitios
// ============================================================================
// Patrón en tres fases: apply local inmediato → confirmación remota →
// confirm o rollback. El rollback es el inverso exacto del apply (item en su
// posición canónica + reversión del mismo delta de métricas), nunca parcial.
// Los fallos de mutación no se reintentan: el transporte no garantiza
// idempotencia y no hay clave de deduplicación.
//
// La secuencia capture-apply-confirm de UN item no se entrelaza con otra
// mutación sobre ese mismo item: la superficie de UI que la dispara se
// deshabilita mientras hay una en vuelo.
// ============================================================================

use std::rc::Rc;

use crate::models::stats::StatsDelta;
use crate::models::website::{Website, WebsiteStatus};
use crate::models::SessionError;
use crate::services::api_client::DashboardApi;
use crate::state::session_state::SessionState;
use crate::state::website_state::WebsiteState;
use crate::utils::time::Clock;

/// Transacción optimista de borrado: captura el item y el delta aplicado
/// para que el rollback sea estructuralmente el inverso exacto
pub struct DeleteTransaction {
    website: Website,
    delta: StatsDelta,
}

impl DeleteTransaction {
    /// Fase 1: aplicar localmente como si el borrado ya estuviera confirmado
    pub fn apply(state: &WebsiteState, id: &str, now_ms: i64) -> Option<Self> {
        let website = state.remove_website(id)?;
        let delta = StatsDelta::for_removal(&website, now_ms);
        state.apply_stats_delta(&delta);
        Some(Self { website, delta })
    }

    /// Fase 2a: el servidor confirmó; el estado local ya es correcto
    pub fn confirm(self, state: &WebsiteState, now_ms: i64) {
        state.touch(now_ms);
    }

    /// Fase 2b: el servidor rechazó; revertir exactamente lo aplicado
    pub fn rollback(self, state: &WebsiteState) {
        state.revert_stats_delta(&self.delta);
        state.insert_website(self.website);
    }
}

/// Transacción optimista de cambio de estado (misma forma en tres fases)
pub struct StatusTransaction {
    id: String,
    previous: WebsiteStatus,
    delta: StatsDelta,
}

impl StatusTransaction {
    pub fn apply(state: &WebsiteState, id: &str, new_status: WebsiteStatus) -> Option<Self> {
        let previous = state.set_status(id, new_status)?;
        let delta = StatsDelta::for_status_change(previous, new_status);
        state.apply_stats_delta(&delta);
        Some(Self {
            id: id.to_string(),
            previous,
            delta,
        })
    }

    pub fn confirm(self, state: &WebsiteState, now_ms: i64) {
        state.touch(now_ms);
    }

    pub fn rollback(self, state: &WebsiteState) {
        state.revert_stats_delta(&self.delta);
        state.set_status(&self.id, self.previous);
    }
}

pub struct WebsiteService {
    api: Rc<dyn DashboardApi>,
    session: SessionState,
    websites: WebsiteState,
    clock: Rc<dyn Clock>,
}

impl WebsiteService {
    pub fn new(
        api: Rc<dyn DashboardApi>,
        session: SessionState,
        websites: WebsiteState,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            session,
            websites,
            clock,
        }
    }

    pub fn websites(&self) -> &WebsiteState {
        &self.websites
    }

    fn bearer(&self) -> Result<String, SessionError> {
        self.session.access_token().ok_or(SessionError::InvalidToken)
    }

    /// Carga inicial completa: único punto donde las métricas se recalculan
    /// recorriendo toda la colección
    pub async fn load_websites(&self) -> Result<(), SessionError> {
        let token = self.bearer()?;
        self.websites.set_loading(true);

        match self.api.fetch_websites(&token).await {
            Ok(items) => {
                self.websites.set_websites(items, self.clock.now_ms());
                Ok(())
            }
            Err(e) => {
                log::error!("❌ Error cargando sitios: {}", e);
                self.websites.set_loading(false);
                self.websites.set_error(e.clone());
                Err(e)
            }
        }
    }

    /// Borrado optimista: el item desaparece (y las métricas bajan) antes de
    /// la confirmación del servidor; si el servidor rechaza, item y métricas
    /// vuelven exactamente a su estado anterior.
    pub async fn delete_website(&self, id: &str) -> Result<(), SessionError> {
        let token = self.bearer()?;
        let txn = DeleteTransaction::apply(&self.websites, id, self.clock.now_ms())
            .ok_or_else(|| SessionError::MutationFailed(format!("sitio {} no encontrado", id)))?;

        match self.api.delete_website(&token, id).await {
            Ok(()) => {
                log::info!("🗑️ Sitio {} eliminado", id);
                txn.confirm(&self.websites, self.clock.now_ms());
                Ok(())
            }
            Err(e) => {
                let error = SessionError::MutationFailed(e.to_string());
                log::warn!("↩️ Borrado de {} rechazado, revirtiendo: {}", id, e);
                txn.rollback(&self.websites);
                // El fallo queda acotado a la colección; la sesión no se toca
                self.websites.set_error(error.clone());
                Err(error)
            }
        }
    }

    /// Cambio de estado optimista, misma forma en tres fases que el borrado
    pub async fn set_website_status(
        &self,
        id: &str,
        status: WebsiteStatus,
    ) -> Result<(), SessionError> {
        let token = self.bearer()?;
        let txn = StatusTransaction::apply(&self.websites, id, status)
            .ok_or_else(|| SessionError::MutationFailed(format!("sitio {} no encontrado", id)))?;

        match self.api.update_website_status(&token, id, status).await {
            Ok(()) => {
                txn.confirm(&self.websites, self.clock.now_ms());
                Ok(())
            }
            Err(e) => {
                let error = SessionError::MutationFailed(e.to_string());
                log::warn!("↩️ Cambio de estado de {} rechazado, revirtiendo: {}", id, e);
                txn.rollback(&self.websites);
                self.websites.set_error(error.clone());
                Err(error)
            }
        }
    }

    /// Alta de sitio: confirmada por el servidor (la identidad del item nace
    /// en la respuesta), insertada en posición canónica con delta incremental
    pub async fn create_website(&self, domain: &str, name: &str) -> Result<Website, SessionError> {
        let token = self.bearer()?;
        let request = crate::models::website::CreateWebsiteRequest {
            domain: domain.to_string(),
            name: name.to_string(),
        };

        match self.api.create_website(&token, &request).await {
            Ok(website) => {
                let delta = StatsDelta::for_insert(&website, self.clock.now_ms());
                self.websites.insert_website(website.clone());
                self.websites.apply_stats_delta(&delta);
                self.websites.touch(self.clock.now_ms());
                log::info!("🌐 Sitio {} creado", website.domain);
                Ok(website)
            }
            Err(e) => {
                let error = SessionError::MutationFailed(e.to_string());
                self.websites.set_error(error.clone());
                Err(error)
            }
        }
    }
}
