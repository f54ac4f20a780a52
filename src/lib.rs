// ============================================================================
// CHATLIFT DASHBOARD - Núcleo del dashboard de clientes (Rust + WASM)
// ============================================================================
// Arquitectura:
// - Models: contrato remoto y entidades compartidas con el backend
// - Services: comunicación API, ciclo de vida del token, mutaciones optimistas
// - State: stores con Rc<RefCell> y transiciones cerradas
// - Utils: puertos (storage, reloj, timers, spawner) y sus adaptadores
// La capa de vista es un colaborador externo: se suscribe a los stores y
// dispara operaciones de los servicios, nada más.
// ============================================================================

pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(target_arch = "wasm32")]
mod app;

#[cfg(target_arch = "wasm32")]
mod wasm_entry {
    use crate::state::app_state::AppState;
    use std::cell::RefCell;
    use wasm_bindgen::prelude::*;

    // Instancia global de la app mientras vive la página
    thread_local! {
        static APP: RefCell<Option<AppState>> = RefCell::new(None);
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        // Panic hook para debugging en consola
        console_error_panic_hook::set_once();

        if crate::config::CONFIG.is_logging_enabled() {
            wasm_logger::init(wasm_logger::Config::default());
        }
        log::info!("🚀 Chatlift Dashboard");

        let state = crate::app::bootstrap()?;
        APP.with(|cell| {
            *cell.borrow_mut() = Some(state);
        });

        Ok(())
    }
}
