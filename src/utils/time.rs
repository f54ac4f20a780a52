/// Reloj inyectable: milisegundos epoch
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Reloj real (navegador y nativo)
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Reloj manual para tests
#[cfg(test)]
pub(crate) struct FakeClock {
    now: std::cell::Cell<i64>,
}

#[cfg(test)]
impl FakeClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: std::cell::Cell::new(now_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }
}

#[cfg(test)]
impl Clock for FakeClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}
