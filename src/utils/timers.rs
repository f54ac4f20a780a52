// ============================================================================
// TIMERS - Temporizador one-shot con handle cancelable explícito
// ============================================================================
// El invariante "una sola renovación pendiente" se materializa con un handle
// que siempre se cancela antes de crear el siguiente; un timer obsoleto que
// dispare tras la cancelación es un no-op.
// ============================================================================

/// Handle de un timer programado; cancelarlo dos veces es inofensivo
pub trait TimerHandle {
    fn cancel(&mut self);
}

/// Puerto de programación de timers one-shot
pub trait OneShotTimer {
    fn schedule(&self, delay_ms: i64, callback: Box<dyn FnOnce()>) -> Box<dyn TimerHandle>;
}

/// Adaptador del navegador sobre gloo-timers (setTimeout)
#[cfg(target_arch = "wasm32")]
pub struct GlooTimer;

#[cfg(target_arch = "wasm32")]
struct GlooTimerHandle {
    inner: Option<gloo_timers::callback::Timeout>,
}

#[cfg(target_arch = "wasm32")]
impl TimerHandle for GlooTimerHandle {
    fn cancel(&mut self) {
        if let Some(timeout) = self.inner.take() {
            timeout.cancel();
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl OneShotTimer for GlooTimer {
    fn schedule(&self, delay_ms: i64, callback: Box<dyn FnOnce()>) -> Box<dyn TimerHandle> {
        let millis = delay_ms.clamp(0, u32::MAX as i64) as u32;
        let timeout = gloo_timers::callback::Timeout::new(millis, callback);
        Box::new(GlooTimerHandle {
            inner: Some(timeout),
        })
    }
}
