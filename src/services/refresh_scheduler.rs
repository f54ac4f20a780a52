// ============================================================================
// REFRESH SCHEDULER - Ciclo de vida del access token
// ============================================================================
// Garantiza que el token se renueva antes de expirar sin emitir jamás dos
// renovaciones concurrentes. Un único timer pendiente: el handle se cancela
// SIEMPRE antes de programar el siguiente, y un contador de generación
// neutraliza cualquier disparo obsoleto. Una renovación fallida es terminal
// (sesión fuera), nunca un bucle de reintentos.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::services::auth_service::{AuthService, RenewOutcome};
use crate::services::token_events::TokenChannel;
use crate::state::session_state::SessionState;
use crate::utils::spawn::Spawner;
use crate::utils::time::Clock;
use crate::utils::timers::{OneShotTimer, TimerHandle};

pub struct RefreshScheduler {
    auth: Rc<AuthService>,
    session: SessionState,
    clock: Rc<dyn Clock>,
    timers: Rc<dyn OneShotTimer>,
    spawner: Rc<dyn Spawner>,
    channel: Rc<dyn TokenChannel>,
    /// Margen de seguridad: se renueva `lead_ms` antes de la expiración
    lead_ms: i64,
    /// El único timer de renovación pendiente
    pending: RefCell<Option<Box<dyn TimerHandle>>>,
    /// Invalida disparos de timers ya reemplazados
    generation: Cell<u64>,
    /// Auto-referencia para capturarse en timers y callbacks del canal
    me: Weak<RefreshScheduler>,
}

impl RefreshScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        auth: Rc<AuthService>,
        session: SessionState,
        clock: Rc<dyn Clock>,
        timers: Rc<dyn OneShotTimer>,
        spawner: Rc<dyn Spawner>,
        channel: Rc<dyn TokenChannel>,
        lead_ms: i64,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            auth,
            session,
            clock,
            timers,
            spawner,
            channel,
            lead_ms,
            pending: RefCell::new(None),
            generation: Cell::new(0),
            me: me.clone(),
        })
    }

    /// Suscribe el canal entre pestañas (exactamente una vez por contexto)
    /// y programa la primera renovación si procede.
    pub fn start(&self) {
        let Some(scheduler) = self.me.upgrade() else { return };
        self.channel.set_onmessage(Box::new(move |event| {
            log::info!("📡 token-refreshed recibido de otra pestaña");
            scheduler.auth.adopt_external_tokens(&event);
            scheduler.reschedule();
        }));
        self.reschedule();
    }

    /// Recalcula la renovación pendiente a partir de la expiración vigente.
    /// Invocar tras cada cambio de `expires_at` o del estado de autenticación.
    pub fn reschedule(&self) {
        // Nunca se apilan timers: el handle anterior se cancela primero
        if let Some(mut handle) = self.pending.borrow_mut().take() {
            handle.cancel();
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        if !self.session.is_authenticated() {
            return;
        }
        let expires_at = match self.session.expires_at() {
            Some(value) => value,
            None => return,
        };

        let due_in = expires_at - self.clock.now_ms() - self.lead_ms;
        if due_in <= 0 {
            if self.session.is_refreshing() {
                // Otra llamada es dueña de la renovación en curso
                return;
            }
            log::info!("⏰ Renovación ya vencida, renovando ahora");
            self.trigger_renewal();
            return;
        }

        log::info!("⏰ Renovación programada en {} ms", due_in);
        let Some(scheduler) = self.me.upgrade() else { return };
        let handle = self.timers.schedule(
            due_in,
            Box::new(move || {
                // Un timer reemplazado después de programarse es un no-op
                if scheduler.generation.get() != generation {
                    return;
                }
                scheduler.trigger_renewal();
            }),
        );
        *self.pending.borrow_mut() = Some(handle);
    }

    /// La pestaña volvió a primer plano: si la renovación venció mientras el
    /// timer no podía disparar (pestaña suspendida), renovar ya.
    pub fn on_visibility_change(&self, visible: bool) {
        if !visible || !self.session.is_authenticated() {
            return;
        }
        let expires_at = match self.session.expires_at() {
            Some(value) => value,
            None => return,
        };
        let due_in = expires_at - self.clock.now_ms() - self.lead_ms;
        if due_in <= 0 && !self.session.is_refreshing() {
            log::info!("👀 Pestaña visible con renovación vencida, renovando");
            self.trigger_renewal();
        }
    }

    fn trigger_renewal(&self) {
        let Some(scheduler) = self.me.upgrade() else { return };
        self.spawner.spawn_local(Box::pin(async move {
            match scheduler.auth.renew().await {
                // Reprogramar desde la nueva expiración
                Ok(RenewOutcome::Renewed) => scheduler.reschedule(),
                Ok(RenewOutcome::AlreadyInFlight) => {}
                Err(e) => {
                    // Terminal: la sesión ya quedó limpia; sin reintentos
                    log::warn!("❌ Renovación fallida, se requiere re-autenticación: {}", e);
                }
            }
        }));
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(mut handle) = self.pending.borrow_mut().take() {
            handle.cancel();
        }
        self.channel.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{RefreshResponse, User};
    use crate::models::SessionError;
    use crate::services::api_client::fake::FakeApi;
    use crate::services::token_events::{LocalTokenBus, TokenRefreshedEvent};
    use crate::state::website_state::WebsiteState;
    use crate::utils::spawn::PoolSpawner;
    use crate::utils::storage::{MemoryStorage, TokenStorage};
    use crate::utils::time::FakeClock;
    use crate::utils::timers::fake::FakeTimers;
    use futures::executor::LocalPool;

    const NOW_MS: i64 = 1_718_452_800_000;
    const MIN_MS: i64 = 60 * 1000;
    const LEAD_MS: i64 = 5 * MIN_MS;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: "ana@acme.fr".to_string(),
            name: "Ana".to_string(),
        }
    }

    struct Harness {
        api: Rc<FakeApi>,
        clock: Rc<FakeClock>,
        timers: FakeTimers,
        bus: LocalTokenBus,
        storage: Rc<MemoryStorage>,
        session: SessionState,
        scheduler: Rc<RefreshScheduler>,
        pool: LocalPool,
    }

    fn harness() -> Harness {
        let api = Rc::new(FakeApi::new());
        let clock = Rc::new(FakeClock::new(NOW_MS));
        let timers = FakeTimers::new();
        let bus = LocalTokenBus::new();
        let pool = LocalPool::new();
        let storage = Rc::new(MemoryStorage::new());
        let session = SessionState::new(storage.clone());
        let channel: Rc<dyn TokenChannel> = Rc::new(bus.channel());
        let auth = Rc::new(AuthService::new(
            api.clone(),
            session.clone(),
            WebsiteState::new(),
            channel.clone(),
            clock.clone(),
        ));
        let scheduler = RefreshScheduler::new(
            auth,
            session.clone(),
            clock.clone(),
            Rc::new(timers.clone()),
            Rc::new(PoolSpawner(pool.spawner())),
            channel,
            LEAD_MS,
        );
        Harness {
            api,
            clock,
            timers,
            bus,
            storage,
            session,
            scheduler,
            pool,
        }
    }

    fn logged_in(h: &Harness, lifetime_ms: i64) {
        h.session.login_success(
            user(),
            "a1".to_string(),
            "r1".to_string(),
            Some(lifetime_ms / 1000),
            h.clock.now_ms(),
        );
    }

    #[test]
    fn test_schedules_at_expiry_minus_lead() {
        let mut h = harness();
        // expiresAt = now + 10min, lead = 5min → timer a los 5min
        logged_in(&h, 10 * MIN_MS);
        h.scheduler.start();

        assert_eq!(h.timers.pending().len(), 1);
        assert_eq!(h.timers.pending()[0].1, 5 * MIN_MS);
        assert_eq!(h.api.refresh_calls.get(), 0);

        // Disparo exitoso: renueva y reprograma desde la nueva expiración
        h.api.push_refresh(Ok(RefreshResponse {
            access_token: "a2".to_string(),
            refresh_token: "r2".to_string(),
            expires_in_secs: Some(15 * 60),
        }));
        h.clock.advance(5 * MIN_MS);
        h.timers.fire_latest();
        h.pool.run_until_stalled();

        assert_eq!(h.api.refresh_calls.get(), 1);
        assert_eq!(h.session.expires_at(), Some(NOW_MS + 5 * MIN_MS + 15 * MIN_MS));
        // Nuevo timer a expiración − lead = 10min
        assert_eq!(h.timers.pending().len(), 1);
        assert_eq!(h.timers.pending()[0].1, 10 * MIN_MS);
    }

    #[test]
    fn test_no_schedule_when_anonymous() {
        let h = harness();
        h.scheduler.start();
        assert_eq!(h.timers.pending_count(), 0);
        assert_eq!(h.api.refresh_calls.get(), 0);
    }

    #[test]
    fn test_hydrated_sentinel_token_schedules_nothing() {
        let h = harness();
        // Un "null" residual en storage no es un token: al arrancar no hay
        // autenticación y no se programa ninguna renovación
        h.storage.set(crate::utils::STORAGE_KEY_ACCESS_TOKEN, "null");
        assert!(!h.session.hydrate());

        h.scheduler.start();

        assert!(!h.session.is_authenticated());
        assert_eq!(h.timers.pending_count(), 0);
        assert_eq!(h.api.refresh_calls.get(), 0);
    }

    #[test]
    fn test_immediate_renewal_when_already_due() {
        let mut h = harness();
        // Vida de 4min < lead de 5min → vencida desde el arranque
        logged_in(&h, 4 * MIN_MS);
        h.api.push_refresh(Ok(RefreshResponse {
            access_token: "a2".to_string(),
            refresh_token: "r2".to_string(),
            expires_in_secs: Some(3600),
        }));

        h.scheduler.start();
        h.pool.run_until_stalled();

        // Renovación inmediata, sin pasar por timer
        assert_eq!(h.api.refresh_calls.get(), 1);
        assert_eq!(h.timers.pending().len(), 1);
        assert_eq!(h.timers.pending()[0].1, 55 * MIN_MS);
    }

    #[test]
    fn test_reschedule_cancels_previous_timer() {
        let mut h = harness();
        logged_in(&h, 10 * MIN_MS);
        h.scheduler.start();
        assert_eq!(h.timers.pending_count(), 1);

        // Nueva expiración → el timer anterior se cancela, nunca se apila
        logged_in(&h, 20 * MIN_MS);
        h.scheduler.reschedule();

        assert_eq!(h.timers.pending_count(), 1);
        assert_eq!(h.timers.pending()[0].1, 15 * MIN_MS);

        // El slot cancelado no dispara nada
        h.timers.fire(0);
        h.pool.run_until_stalled();
        assert_eq!(h.api.refresh_calls.get(), 0);
    }

    #[test]
    fn test_timer_firing_after_logout_emits_nothing() {
        let mut h = harness();
        logged_in(&h, 10 * MIN_MS);
        h.scheduler.start();

        // Logout sin reprogramación: el timer sobrevive pero al disparar no
        // queda refresh token y la renovación muere sin llamada remota
        h.session.logout();
        h.timers.fire_latest();
        h.pool.run_until_stalled();

        assert_eq!(h.api.refresh_calls.get(), 0);
        assert!(!h.session.is_authenticated());
    }

    #[test]
    fn test_visibility_triggers_overdue_renewal() {
        let mut h = harness();
        logged_in(&h, 10 * MIN_MS);
        h.scheduler.start();

        // La pestaña estuvo suspendida: el tiempo pasó sin que el timer dispare
        h.clock.set(NOW_MS + 11 * MIN_MS);
        h.api.push_refresh(Ok(RefreshResponse {
            access_token: "a2".to_string(),
            refresh_token: "r2".to_string(),
            expires_in_secs: Some(3600),
        }));

        h.scheduler.on_visibility_change(true);
        h.pool.run_until_stalled();

        assert_eq!(h.api.refresh_calls.get(), 1);
        assert_eq!(h.session.access_token(), Some("a2".to_string()));
    }

    #[test]
    fn test_visibility_noop_when_not_due() {
        let mut h = harness();
        logged_in(&h, 10 * MIN_MS);
        h.scheduler.start();

        h.scheduler.on_visibility_change(true);
        h.pool.run_until_stalled();

        assert_eq!(h.api.refresh_calls.get(), 0);
    }

    #[test]
    fn test_visibility_respects_inflight_guard() {
        let mut h = harness();
        logged_in(&h, 10 * MIN_MS);
        h.scheduler.start();
        h.clock.set(NOW_MS + 11 * MIN_MS);

        // Renovación en curso de otra llamada
        assert!(h.session.begin_refresh());
        h.scheduler.on_visibility_change(true);
        h.pool.run_until_stalled();

        assert_eq!(h.api.refresh_calls.get(), 0);
        h.session.clear_refreshing();
    }

    #[test]
    fn test_failed_renewal_is_terminal_and_stops_scheduling() {
        let mut h = harness();
        logged_in(&h, 4 * MIN_MS);
        h.api
            .push_refresh(Err(SessionError::NetworkError("HTTP 500".to_string())));

        h.scheduler.start();
        h.pool.run_until_stalled();

        assert_eq!(h.api.refresh_calls.get(), 1);
        assert!(!h.session.is_authenticated());
        assert!(matches!(
            h.session.error(),
            Some(SessionError::RefreshFailed(_))
        ));
        // Sin timers vivos: nada de bucles de reintento
        assert_eq!(h.timers.pending_count(), 0);
    }

    #[test]
    fn test_external_event_adopts_tokens_without_own_renewal() {
        let mut h = harness();
        h.scheduler.start();
        assert!(!h.session.is_authenticated());

        // Otra pestaña renovó y publicó sus tokens
        let other_tab = h.bus.channel();
        other_tab.publish(&TokenRefreshedEvent {
            access_token: "a7".to_string(),
            refresh_token: "r7".to_string(),
        });
        h.pool.run_until_stalled();

        assert!(h.session.is_authenticated());
        assert_eq!(h.session.access_token(), Some("a7".to_string()));
        // Adoptó sin emitir renovación propia, y reprogramó su propio timer
        assert_eq!(h.api.refresh_calls.get(), 0);
        assert_eq!(h.timers.pending_count(), 1);
        assert_eq!(h.timers.pending()[0].1, 55 * MIN_MS);
    }
}
