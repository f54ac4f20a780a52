// ============================================================================
// SESSION STATE - Estado de sesión y ventana de validez de credenciales
// ============================================================================
// Fuente única de verdad de la identidad autenticada. Todas las mutaciones
// pasan por el conjunto cerrado de transiciones de este store; ningún otro
// componente toca los campos directamente. Los tokens se persisten de forma
// síncrona con cada transición que los cambia.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::CONFIG;
use crate::models::{SessionError, User};
use crate::state::reactivity::Subscribers;
use crate::utils::storage::{normalize_token, TokenStorage};
use crate::utils::{STORAGE_KEY_ACCESS_TOKEN, STORAGE_KEY_REFRESH_TOKEN};

/// Snapshot de la sesión en un instante dado
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Flag interno de autenticación; ver `is_authenticated()`
    pub authenticated: bool,
    /// Instante (ms epoch) a partir del cual el access token deja de valer
    pub expires_at: Option<i64>,
    /// Guard de exclusión mutua: true mientras hay una renovación en vuelo
    pub is_refreshing: bool,
    /// Última renovación exitosa, para diagnóstico
    pub last_refresh_at: Option<i64>,
    /// Último error; lo sobreescribe el siguiente error y lo limpia el éxito
    pub error: Option<SessionError>,
}

impl Session {
    /// Derivado: autenticado solo si el flag Y un access token real coinciden.
    /// Un literal "null"/"undefined" rehidratado del storage no cuenta como token.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated && normalize_token(self.access_token.clone()).is_some()
    }
}

/// Store de sesión; único dueño y mutador del snapshot
#[derive(Clone)]
pub struct SessionState {
    session: Rc<RefCell<Session>>,
    storage: Rc<dyn TokenStorage>,
    subscribers: Subscribers,
}

impl SessionState {
    pub fn new(storage: Rc<dyn TokenStorage>) -> Self {
        Self {
            session: Rc::new(RefCell::new(Session::default())),
            storage,
            subscribers: Subscribers::new(),
        }
    }

    // ------------------------------------------------------------------
    // Lectura
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    pub fn is_refreshing(&self) -> bool {
        self.session.borrow().is_refreshing
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.borrow().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.session.borrow().refresh_token.clone()
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.session.borrow().expires_at
    }

    pub fn last_refresh_at(&self) -> Option<i64> {
        self.session.borrow().last_refresh_at
    }

    pub fn error(&self) -> Option<SessionError> {
        self.session.borrow().error.clone()
    }

    pub fn subscribe<F: Fn() + 'static>(&self, callback: F) {
        self.subscribers.subscribe(callback);
    }

    // ------------------------------------------------------------------
    // Transiciones
    // ------------------------------------------------------------------

    /// Rehidrata tokens persistidos al arrancar. Devuelve true si quedó un
    /// token utilizable pendiente de validar. Los literales "null"/"undefined"
    /// se tratan como ausencia y se purgan del storage.
    pub fn hydrate(&self) -> bool {
        let raw_access = self.storage.get(STORAGE_KEY_ACCESS_TOKEN);
        let raw_refresh = self.storage.get(STORAGE_KEY_REFRESH_TOKEN);

        let had_garbage = (raw_access.is_some() || raw_refresh.is_some())
            && normalize_token(raw_access.clone()).is_none();
        let access = normalize_token(raw_access);
        let refresh = normalize_token(raw_refresh);

        if had_garbage {
            log::info!("🗑️ Tokens residuales inválidos en storage, purgando");
            self.purge_tokens();
        }

        let has_token = access.is_some();
        {
            let mut session = self.session.borrow_mut();
            session.access_token = access;
            session.refresh_token = refresh;
            // Autenticado solo tras validar contra el servidor
            session.authenticated = false;
        }
        if has_token {
            log::info!("💾 Token persistido encontrado, pendiente de validación");
        }
        self.subscribers.notify();
        has_token
    }

    /// Login exitoso: identidad + tokens + ventana de expiración
    pub fn login_success(
        &self,
        user: User,
        access_token: String,
        refresh_token: String,
        expires_in_secs: Option<i64>,
        now_ms: i64,
    ) {
        self.persist_tokens(&access_token, &refresh_token);
        {
            let mut session = self.session.borrow_mut();
            session.user = Some(user);
            session.access_token = Some(access_token);
            session.refresh_token = Some(refresh_token);
            session.authenticated = true;
            session.expires_at = Some(now_ms + lifetime_ms(expires_in_secs));
            session.error = None;
        }
        log::info!("✅ Sesión iniciada");
        self.subscribers.notify();
    }

    /// Validación exitosa de un token rehidratado: re-deriva el usuario.
    /// La expiración real no se persiste, así que se asume la vida por defecto.
    pub fn validated(&self, user: User, now_ms: i64) {
        {
            let mut session = self.session.borrow_mut();
            session.user = Some(user);
            session.authenticated = true;
            session.expires_at = Some(now_ms + CONFIG.default_token_lifetime_ms());
            session.error = None;
        }
        log::info!("✅ Token persistido validado");
        self.subscribers.notify();
    }

    /// Fallo de validación al arrancar: purga silenciosa, sin error visible
    /// (un token residual expirado es una condición esperada)
    pub fn invalidate_silently(&self) {
        self.purge_tokens();
        {
            let mut session = self.session.borrow_mut();
            *session = Session::default();
        }
        log::info!("🗑️ Token residual inválido, sesión limpiada en silencio");
        self.subscribers.notify();
    }

    /// Test-and-set del guard de renovación. Devuelve false si otra renovación
    /// ya está en vuelo (el caller NO debe emitir una segunda llamada remota).
    pub fn begin_refresh(&self) -> bool {
        let mut session = self.session.borrow_mut();
        if session.is_refreshing {
            return false;
        }
        session.is_refreshing = true;
        true
    }

    /// Renovación exitosa: tokens nuevos, nueva ventana, guard liberado
    pub fn refresh_success(
        &self,
        access_token: String,
        refresh_token: String,
        expires_in_secs: Option<i64>,
        now_ms: i64,
    ) {
        self.persist_tokens(&access_token, &refresh_token);
        {
            let mut session = self.session.borrow_mut();
            session.access_token = Some(access_token);
            session.refresh_token = Some(refresh_token);
            session.authenticated = true;
            session.expires_at = Some(now_ms + lifetime_ms(expires_in_secs));
            session.last_refresh_at = Some(now_ms);
            session.is_refreshing = false;
            session.error = None;
        }
        log::info!("🔄 Tokens renovados");
        self.subscribers.notify();
    }

    /// Renovación fallida: terminal. Credenciales fuera, storage purgado,
    /// error registrado. Nunca se reintenta automáticamente.
    pub fn refresh_failure(&self, error: SessionError) {
        self.purge_tokens();
        {
            let mut session = self.session.borrow_mut();
            *session = Session {
                error: Some(error),
                ..Session::default()
            };
        }
        log::warn!("❌ Renovación fallida, sesión terminada");
        self.subscribers.notify();
    }

    /// Libera el guard de renovación sin tocar nada más. Idempotente; es el
    /// equivalente a un `finally` para el camino de pánico/salida temprana.
    pub fn clear_refreshing(&self) {
        let mut session = self.session.borrow_mut();
        session.is_refreshing = false;
    }

    /// Otra pestaña renovó por nosotros: adoptar sus tokens. Recibir tokens
    /// frescos implica validez, así que autenticado queda en true sin validar.
    pub fn apply_external_tokens(&self, access_token: String, refresh_token: String, now_ms: i64) {
        self.persist_tokens(&access_token, &refresh_token);
        {
            let mut session = self.session.borrow_mut();
            session.access_token = Some(access_token);
            session.refresh_token = Some(refresh_token);
            session.authenticated = true;
            // El evento solo trae tokens; se asume la vida por defecto
            session.expires_at = Some(now_ms + CONFIG.default_token_lifetime_ms());
            session.error = None;
        }
        log::info!("📡 Tokens adoptados de otra pestaña");
        self.subscribers.notify();
    }

    /// Logout: sesión vacía y storage purgado
    pub fn logout(&self) {
        self.purge_tokens();
        {
            let mut session = self.session.borrow_mut();
            *session = Session::default();
        }
        log::info!("👋 Logout");
        self.subscribers.notify();
    }

    pub fn set_error(&self, error: SessionError) {
        self.session.borrow_mut().error = Some(error);
        self.subscribers.notify();
    }

    pub fn dismiss_error(&self) {
        self.session.borrow_mut().error = None;
        self.subscribers.notify();
    }

    // ------------------------------------------------------------------
    // Persistencia síncrona de tokens
    // ------------------------------------------------------------------

    fn persist_tokens(&self, access_token: &str, refresh_token: &str) {
        self.storage.set(STORAGE_KEY_ACCESS_TOKEN, access_token);
        self.storage.set(STORAGE_KEY_REFRESH_TOKEN, refresh_token);
    }

    fn purge_tokens(&self) {
        self.storage.remove(STORAGE_KEY_ACCESS_TOKEN);
        self.storage.remove(STORAGE_KEY_REFRESH_TOKEN);
    }
}

fn lifetime_ms(expires_in_secs: Option<i64>) -> i64 {
    match expires_in_secs {
        Some(secs) => secs * 1000,
        None => CONFIG.default_token_lifetime_ms(),
    }
}
