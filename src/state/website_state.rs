// ============================================================================
// WEBSITE STATE - Colección de sitios gestionados + métricas derivadas
// ============================================================================
// Store único de la colección. Las métricas se actualizan por deltas en las
// mutaciones y solo se recalculan enteras en la carga inicial. Las primitivas
// de mutación fina son pub(crate): solo el coordinador de mutaciones
// optimistas (services::website_service) las usa, siempre en pares
// apply/revert exactos.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::stats::{StatsDelta, WebsiteStats};
use crate::models::website::{canonical_cmp, Website, WebsiteStatus};
use crate::models::SessionError;
use crate::state::reactivity::Subscribers;

#[derive(Clone, Default)]
pub struct WebsiteState {
    websites: Rc<RefCell<Vec<Website>>>,
    stats: Rc<RefCell<WebsiteStats>>,
    loading: Rc<RefCell<bool>>,
    error: Rc<RefCell<Option<SessionError>>>,
    /// Última carga/confirmación contra el servidor; decide si un futuro
    /// read puede servirse de la copia local
    last_fetch_time: Rc<RefCell<Option<i64>>>,
    subscribers: Subscribers,
}

impl WebsiteState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Lectura
    // ------------------------------------------------------------------

    pub fn websites(&self) -> Vec<Website> {
        self.websites.borrow().clone()
    }

    pub fn stats(&self) -> WebsiteStats {
        self.stats.borrow().clone()
    }

    pub fn get_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn error(&self) -> Option<SessionError> {
        self.error.borrow().clone()
    }

    pub fn last_fetch_time(&self) -> Option<i64> {
        *self.last_fetch_time.borrow()
    }

    pub fn subscribe<F: Fn() + 'static>(&self, callback: F) {
        self.subscribers.subscribe(callback);
    }

    // ------------------------------------------------------------------
    // Transiciones
    // ------------------------------------------------------------------

    /// Carga completa desde el servidor: orden canónico + recálculo entero
    pub fn set_websites(&self, mut websites: Vec<Website>, now_ms: i64) {
        websites.sort_by(canonical_cmp);
        *self.stats.borrow_mut() = WebsiteStats::recompute(&websites, now_ms);
        log::info!("📋 {} sitios cargados", websites.len());
        *self.websites.borrow_mut() = websites;
        *self.loading.borrow_mut() = false;
        *self.error.borrow_mut() = None;
        *self.last_fetch_time.borrow_mut() = Some(now_ms);
        self.subscribers.notify();
    }

    pub fn set_loading(&self, loading: bool) {
        *self.loading.borrow_mut() = loading;
        self.subscribers.notify();
    }

    pub fn set_error(&self, error: SessionError) {
        *self.error.borrow_mut() = Some(error);
        self.subscribers.notify();
    }

    pub fn dismiss_error(&self) {
        *self.error.borrow_mut() = None;
        self.subscribers.notify();
    }

    /// Vacía la colección (logout: los datos están ligados a la identidad)
    pub fn reset(&self) {
        *self.websites.borrow_mut() = Vec::new();
        *self.stats.borrow_mut() = WebsiteStats::default();
        *self.loading.borrow_mut() = false;
        *self.error.borrow_mut() = None;
        *self.last_fetch_time.borrow_mut() = None;
        self.subscribers.notify();
    }

    /// Sella el instante de la última confirmación contra el servidor
    pub(crate) fn touch(&self, now_ms: i64) {
        *self.last_fetch_time.borrow_mut() = Some(now_ms);
        self.subscribers.notify();
    }

    // ------------------------------------------------------------------
    // Primitivas de mutación fina (solo coordinador optimista)
    // ------------------------------------------------------------------

    /// Extrae el item; las métricas NO se tocan (el delta lo aplica el caller)
    pub(crate) fn remove_website(&self, id: &str) -> Option<Website> {
        let mut websites = self.websites.borrow_mut();
        let idx = websites.iter().position(|w| w.id == id)?;
        let removed = websites.remove(idx);
        drop(websites);
        self.subscribers.notify();
        Some(removed)
    }

    /// Reinserta en la posición canónica (nunca al final)
    pub(crate) fn insert_website(&self, website: Website) {
        {
            let mut websites = self.websites.borrow_mut();
            let pos = websites
                .binary_search_by(|probe| canonical_cmp(probe, &website))
                .unwrap_or_else(|pos| pos);
            websites.insert(pos, website);
        }
        self.subscribers.notify();
    }

    /// Cambia el estado de un item; devuelve el estado anterior
    pub(crate) fn set_status(&self, id: &str, status: WebsiteStatus) -> Option<WebsiteStatus> {
        let old = {
            let mut websites = self.websites.borrow_mut();
            let site = websites.iter_mut().find(|w| w.id == id)?;
            let old = site.status;
            site.status = status;
            old
        };
        self.subscribers.notify();
        Some(old)
    }

    pub(crate) fn apply_stats_delta(&self, delta: &StatsDelta) {
        self.stats.borrow_mut().apply(delta);
        self.subscribers.notify();
    }

    pub(crate) fn revert_stats_delta(&self, delta: &StatsDelta) {
        self.stats.borrow_mut().revert(delta);
        self.subscribers.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const NOW_MS: i64 = 1_718_452_800_000;

    fn site(id: &str, ts: i64) -> Website {
        Website {
            id: id.to_string(),
            domain: format!("{}.example.com", id),
            name: id.to_string(),
            status: WebsiteStatus::Active,
            created_at: Utc.timestamp_millis_opt(ts).unwrap(),
        }
    }

    #[test]
    fn test_set_websites_sorts_and_recomputes() {
        let state = WebsiteState::new();
        state.set_websites(vec![site("a", 100), site("c", 300), site("b", 200)], NOW_MS);

        let ids: Vec<String> = state.websites().iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(state.stats().total, 3);
        assert_eq!(state.last_fetch_time(), Some(NOW_MS));
    }

    #[test]
    fn test_remove_and_insert_restore_position() {
        let state = WebsiteState::new();
        state.set_websites(vec![site("a", 100), site("b", 200), site("c", 300)], NOW_MS);
        let before = state.websites();

        let removed = state.remove_website("b").unwrap();
        assert_eq!(state.websites().len(), 2);

        state.insert_website(removed);
        assert_eq!(state.websites(), before);
    }

    #[test]
    fn test_insert_tiebreak_by_id() {
        let state = WebsiteState::new();
        state.set_websites(vec![site("a", 100), site("c", 100)], NOW_MS);

        state.insert_website(site("b", 100));
        let ids: Vec<String> = state.websites().iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reset_clears_collection_and_stats() {
        let state = WebsiteState::new();
        state.set_websites(vec![site("a", 100)], NOW_MS);

        state.reset();

        assert!(state.websites().is_empty());
        assert_eq!(state.stats(), WebsiteStats::default());
        assert_eq!(state.last_fetch_time(), None);
    }
}
