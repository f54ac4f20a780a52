// ============================================================================
// REACTIVITY - Lista de subscribers para notificar cambios de estado
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

type Callback = Rc<dyn Fn()>;

/// Subscribers de un store; la capa de vista se suscribe para re-renderizar
#[derive(Clone, Default)]
pub struct Subscribers {
    listeners: Rc<RefCell<Vec<Callback>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suscribirse a cambios
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn() + 'static,
    {
        self.listeners.borrow_mut().push(Rc::new(callback));
    }

    /// Notificar a todos los subscribers
    pub fn notify(&self) {
        // Se clonan los callbacks para soltar el borrow antes de invocarlos
        let listeners: Vec<Callback> = self.listeners.borrow().iter().cloned().collect();
        for callback in listeners {
            callback();
        }
    }
}
