// ============================================================================
// STORAGE - Almacenamiento clave/valor durable para los tokens de sesión
// ============================================================================
// En el navegador es localStorage; en nativo (y en tests) un mapa en memoria.
// La escritura es síncrona con la transición de estado correspondiente, de
// modo que un reload nunca observa memoria y storage en desacuerdo.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;

/// Puerto de almacenamiento durable de tokens
pub trait TokenStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Sanea un valor leído del storage: los literales "null"/"undefined" y la
/// cadena vacía se tratan como ausencia de token (pueden quedar serializados
/// así por versiones anteriores del dashboard).
pub fn normalize_token(raw: Option<String>) -> Option<String> {
    match raw {
        Some(value) if value.is_empty() || value == "null" || value == "undefined" => None,
        other => other,
    }
}

/// Adaptador en memoria: embebidos nativos y tests
#[derive(Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}

/// Adaptador localStorage del navegador
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, value).is_err() {
                log::error!("❌ Error guardando {} en localStorage", key);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token_sentinels() {
        assert_eq!(normalize_token(None), None);
        assert_eq!(normalize_token(Some("".to_string())), None);
        assert_eq!(normalize_token(Some("null".to_string())), None);
        assert_eq!(normalize_token(Some("undefined".to_string())), None);
        assert_eq!(
            normalize_token(Some("eyJhbGciOi".to_string())),
            Some("eyJhbGciOi".to_string())
        );
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.set("k", "v");
        assert_eq!(storage.get("k"), Some("v".to_string()));
        storage.remove("k");
        assert_eq!(storage.get("k"), None);
    }
}
