// ============================================================================
// AUTH SERVICE - Operaciones de sesión contra el backend
// ============================================================================
// Orquesta login / validación / renovación / logout sobre SessionState.
// La renovación es single-flight: el guard `is_refreshing` se toma con un
// test-and-set y se libera en todos los caminos de salida mediante un drop
// guard, incluido un pánico a mitad de la llamada remota.
// ============================================================================

use std::rc::Rc;

use crate::models::auth::LoginRequest;
use crate::models::SessionError;
use crate::services::api_client::DashboardApi;
use crate::services::token_events::{TokenChannel, TokenRefreshedEvent};
use crate::state::session_state::SessionState;
use crate::state::website_state::WebsiteState;
use crate::utils::time::Clock;

/// Resultado de una petición de renovación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewOutcome {
    /// Esta llamada ejecutó la renovación
    Renewed,
    /// Otra renovación ya estaba en vuelo; esta llamada no emitió nada.
    /// El resultado autoritativo se leerá de SessionState cuando asiente.
    AlreadyInFlight,
}

pub struct AuthService {
    api: Rc<dyn DashboardApi>,
    session: SessionState,
    websites: WebsiteState,
    channel: Rc<dyn TokenChannel>,
    clock: Rc<dyn Clock>,
}

/// Libera el guard de renovación pase lo que pase (equivalente a `finally`)
struct RefreshFlagGuard {
    session: SessionState,
}

impl Drop for RefreshFlagGuard {
    fn drop(&mut self) {
        self.session.clear_refreshing();
    }
}

impl AuthService {
    pub fn new(
        api: Rc<dyn DashboardApi>,
        session: SessionState,
        websites: WebsiteState,
        channel: Rc<dyn TokenChannel>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            session,
            websites,
            channel,
            clock,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Login con credenciales. En éxito persiste tokens y fija la ventana de
    /// expiración (vida declarada por el servidor, o el default de config).
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.api.login(&request).await {
            Ok(response) => {
                self.session.login_success(
                    response.user,
                    response.access_token,
                    response.refresh_token,
                    response.expires_in_secs,
                    self.clock.now_ms(),
                );
                Ok(())
            }
            Err(e) => {
                log::error!("❌ Login fallido: {}", e);
                self.session.set_error(e.clone());
                Err(e)
            }
        }
    }

    /// Valida un token rehidratado al arrancar y re-deriva el usuario.
    /// El fallo es silencioso: un token residual caducado es lo esperado,
    /// no una condición de error visible. Devuelve si quedó autenticado.
    pub async fn validate(&self) -> bool {
        if self.session.is_authenticated() {
            return true;
        }
        let access_token = match self.session.access_token() {
            Some(token) => token,
            None => return false,
        };

        match self.api.validate(&access_token).await {
            Ok(response) => {
                self.session.validated(response.user, self.clock.now_ms());
                true
            }
            Err(e) => {
                log::info!("ℹ️ Token persistido rechazado ({}), limpiando en silencio", e);
                self.session.invalidate_silently();
                false
            }
        }
    }

    /// Renueva el par de tokens. Single-flight: si ya hay una renovación en
    /// vuelo no se emite una segunda llamada remota. Un fallo es terminal
    /// para la sesión; nunca se reintenta automáticamente.
    pub async fn renew(&self) -> Result<RenewOutcome, SessionError> {
        if !self.session.begin_refresh() {
            log::info!("⏳ Renovación ya en vuelo, esta llamada no emite nada");
            return Ok(RenewOutcome::AlreadyInFlight);
        }
        let _guard = RefreshFlagGuard {
            session: self.session.clone(),
        };

        let refresh_token = match self.session.refresh_token() {
            Some(token) => token,
            None => {
                let error = SessionError::RefreshFailed("sin refresh token".to_string());
                self.session.refresh_failure(error.clone());
                return Err(error);
            }
        };

        match self.api.refresh(&refresh_token).await {
            Ok(response) => {
                self.session.refresh_success(
                    response.access_token.clone(),
                    response.refresh_token.clone(),
                    response.expires_in_secs,
                    self.clock.now_ms(),
                );
                // Las demás pestañas adoptan estos tokens en vez de renovar
                self.channel.publish(&TokenRefreshedEvent {
                    access_token: response.access_token,
                    refresh_token: response.refresh_token,
                });
                Ok(RenewOutcome::Renewed)
            }
            Err(e) => {
                let error = SessionError::RefreshFailed(e.to_string());
                self.session.refresh_failure(error.clone());
                Err(error)
            }
        }
    }

    /// Otra pestaña renovó por nosotros: adoptar sus tokens tal cual
    pub fn adopt_external_tokens(&self, event: &TokenRefreshedEvent) {
        self.session.apply_external_tokens(
            event.access_token.clone(),
            event.refresh_token.clone(),
            self.clock.now_ms(),
        );
    }

    /// Logout: limpia sesión, storage y los datos ligados a la identidad
    pub fn logout(&self) {
        self.session.logout();
        self.websites.reset();
    }
}
