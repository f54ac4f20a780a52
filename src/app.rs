// ============================================================================
// APP - Raíz de composición del navegador
// ============================================================================
// Cablea los adaptadores reales (localStorage, gloo-timers, spawn_local,
// BroadcastChannel, cliente HTTP) sobre el núcleo, rehidrata la sesión,
// valida el token persistido en segundo plano y arranca el scheduler de
// renovación. La capa de vista se suscribe a los stores desde JavaScript.
// ============================================================================

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::services::api_client::HttpApiClient;
use crate::services::token_events::BroadcastTokenChannel;
use crate::state::app_state::AppState;
use crate::utils::spawn::{Spawner, WasmSpawner};
use crate::utils::storage::LocalStorage;
use crate::utils::time::SystemClock;
use crate::utils::timers::GlooTimer;

/// Construye el estado global con los adaptadores del navegador y arranca
/// el ciclo de vida de la sesión.
pub fn bootstrap() -> Result<AppState, JsValue> {
    let spawner = Rc::new(WasmSpawner);
    let channel = Rc::new(BroadcastTokenChannel::new()?);

    let state = AppState::new(
        Rc::new(HttpApiClient::new()),
        Rc::new(LocalStorage),
        Rc::new(SystemClock),
        Rc::new(GlooTimer),
        spawner.clone(),
        channel,
    );

    // Rehidratar tokens persistidos; si hay uno, validar en segundo plano y
    // recién entonces programar la renovación
    let has_token = state.session.hydrate();
    if has_token {
        let auth = state.auth.clone();
        let scheduler = state.scheduler.clone();
        spawner.spawn_local(Box::pin(async move {
            if auth.validate().await {
                scheduler.reschedule();
            }
        }));
    }

    // Suscripción entre pestañas + programación inicial
    state.scheduler.start();
    attach_visibility_listener(&state)?;

    Ok(state)
}

/// Renovación oportunista cuando la pestaña vuelve a primer plano: cubre el
/// caso del timer que no pudo disparar con la pestaña suspendida.
fn attach_visibility_listener(state: &AppState) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("sin window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("sin document"))?;

    let scheduler = state.scheduler.clone();
    let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        let visible = web_sys::window()
            .and_then(|w| w.document())
            .map(|d| d.visibility_state() == web_sys::VisibilityState::Visible)
            .unwrap_or(false);
        scheduler.on_visibility_change(visible);
    }) as Box<dyn FnMut(web_sys::Event)>);

    document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())?;
    // El listener se registra una sola vez en el bootstrap; forget() lo
    // mantiene vivo durante toda la vida de la app
    closure.forget();

    Ok(())
}
