// ============================================================================
// TOKEN EVENTS - Difusión de renovaciones entre contextos (pestañas)
// ============================================================================
// Cuando una pestaña renueva tokens, las demás los adoptan en vez de renovar
// por su cuenta (con rotación de refresh tokens, dos renovaciones paralelas
// se invalidarían mutuamente). El canal replica la semántica de
// BroadcastChannel: un contexto nunca recibe sus propias publicaciones.
// ============================================================================

use serde::{Deserialize, Serialize};

/// Payload del evento `token-refreshed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRefreshedEvent {
    pub access_token: String,
    pub refresh_token: String,
}

/// Puerto del canal de eventos de renovación. Se suscribe exactamente una vez
/// por contexto y se cierra en el teardown.
pub trait TokenChannel {
    fn publish(&self, event: &TokenRefreshedEvent);
    /// Registra (o reemplaza) el listener de este contexto
    fn set_onmessage(&self, callback: Box<dyn Fn(TokenRefreshedEvent)>);
    fn close(&self);
}

// ----------------------------------------------------------------------------
// Bus en proceso: despliegues de un solo proceso y tests
// ----------------------------------------------------------------------------

use std::cell::RefCell;
use std::rc::Rc;

type Listener = (u64, Rc<dyn Fn(TokenRefreshedEvent)>);

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Hub compartido; cada contexto abre su propio canal con `channel()`
#[derive(Clone, Default)]
pub struct LocalTokenBus {
    inner: Rc<RefCell<BusInner>>,
}

impl LocalTokenBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self) -> LocalTokenChannel {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            inner.next_id
        };
        LocalTokenChannel {
            id,
            inner: self.inner.clone(),
        }
    }
}

/// Extremo de un contexto sobre el bus en proceso
pub struct LocalTokenChannel {
    id: u64,
    inner: Rc<RefCell<BusInner>>,
}

impl TokenChannel for LocalTokenChannel {
    fn publish(&self, event: &TokenRefreshedEvent) {
        // Se copian los listeners ajenos antes de invocar para soltar el borrow
        let listeners: Vec<Rc<dyn Fn(TokenRefreshedEvent)>> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(id, _)| *id != self.id)
            .map(|(_, cb)| cb.clone())
            .collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    fn set_onmessage(&self, callback: Box<dyn Fn(TokenRefreshedEvent)>) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.retain(|(id, _)| *id != self.id);
        inner.listeners.push((self.id, Rc::from(callback)));
    }

    fn close(&self) {
        self.inner.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
    }
}

// ----------------------------------------------------------------------------
// Adaptador BroadcastChannel del navegador
// ----------------------------------------------------------------------------

#[cfg(target_arch = "wasm32")]
pub struct BroadcastTokenChannel {
    channel: web_sys::BroadcastChannel,
    // El closure debe mantenerse vivo mientras el canal escuche
    onmessage: RefCell<Option<wasm_bindgen::closure::Closure<dyn FnMut(web_sys::MessageEvent)>>>,
}

#[cfg(target_arch = "wasm32")]
impl BroadcastTokenChannel {
    pub fn new() -> Result<Self, wasm_bindgen::JsValue> {
        let channel = web_sys::BroadcastChannel::new(crate::utils::TOKEN_EVENT_CHANNEL)?;
        Ok(Self {
            channel,
            onmessage: RefCell::new(None),
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenChannel for BroadcastTokenChannel {
    fn publish(&self, event: &TokenRefreshedEvent) {
        match serde_json::to_string(event) {
            Ok(json) => {
                if self
                    .channel
                    .post_message(&wasm_bindgen::JsValue::from_str(&json))
                    .is_err()
                {
                    log::error!("❌ Error publicando token-refreshed");
                }
            }
            Err(e) => log::error!("❌ Error serializando token-refreshed: {}", e),
        }
    }

    fn set_onmessage(&self, callback: Box<dyn Fn(TokenRefreshedEvent)>) {
        use wasm_bindgen::JsCast;

        let closure = wasm_bindgen::closure::Closure::wrap(Box::new(
            move |event: web_sys::MessageEvent| {
                if let Some(json) = event.data().as_string() {
                    match serde_json::from_str::<TokenRefreshedEvent>(&json) {
                        Ok(parsed) => callback(parsed),
                        Err(e) => log::warn!("⚠️ Evento token-refreshed ilegible: {}", e),
                    }
                }
            },
        )
            as Box<dyn FnMut(web_sys::MessageEvent)>);

        self.channel
            .set_onmessage(Some(closure.as_ref().unchecked_ref()));
        *self.onmessage.borrow_mut() = Some(closure);
    }

    fn close(&self) {
        self.channel.set_onmessage(None);
        *self.onmessage.borrow_mut() = None;
        self.channel.close();
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for BroadcastTokenChannel {
    fn drop(&mut self) {
        self.close();
    }
}
