// ============================================================================
// STATS - Métricas agregadas derivadas de la colección de sitios
// ============================================================================
// Las métricas se mantienen de forma incremental (StatsDelta) en el camino
// caliente; el recálculo completo queda reservado para la carga inicial.
// Invariante: tras cada mutación asentada, el resultado incremental coincide
// exactamente con `recompute` sobre la colección resultante.
// ============================================================================

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::website::{Website, WebsiteStatus};

/// Métricas agregadas del dashboard
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WebsiteStats {
    pub total: usize,
    /// Sub-contadores por estado; los estados a cero no aparecen en el mapa
    pub by_status: HashMap<WebsiteStatus, usize>,
    /// Sitios creados en el mes de calendario actual
    pub created_this_month: usize,
}

impl WebsiteStats {
    /// Recalcula las métricas desde cero recorriendo toda la colección.
    /// Solo para la carga inicial; las mutaciones usan deltas incrementales.
    pub fn recompute(websites: &[Website], now_ms: i64) -> Self {
        let mut stats = WebsiteStats {
            total: websites.len(),
            ..Default::default()
        };

        for site in websites {
            *stats.by_status.entry(site.status).or_insert(0) += 1;
            if created_in_current_month(&site.created_at, now_ms) {
                stats.created_this_month += 1;
            }
        }

        stats
    }

    pub fn count_for(&self, status: WebsiteStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Aplica el delta exacto implicado por una mutación
    pub fn apply(&mut self, delta: &StatsDelta) {
        self.total = adjust(self.total, delta.total);
        self.created_this_month = adjust(self.created_this_month, delta.created_this_month);
        for (status, d) in &delta.by_status {
            let next = self.count_for(*status) as i64 + d;
            if next <= 0 {
                self.by_status.remove(status);
            } else {
                self.by_status.insert(*status, next as usize);
            }
        }
    }

    /// Revierte un delta previamente aplicado (inverso exacto de `apply`)
    pub fn revert(&mut self, delta: &StatsDelta) {
        self.apply(&delta.inverse());
    }
}

/// Delta exacto que una mutación estructural implica sobre las métricas
#[derive(Debug, Clone, PartialEq)]
pub struct StatsDelta {
    pub total: i64,
    pub by_status: Vec<(WebsiteStatus, i64)>,
    pub created_this_month: i64,
}

impl StatsDelta {
    /// Delta de eliminar `website` de la colección
    pub fn for_removal(website: &Website, now_ms: i64) -> Self {
        Self::for_website(website, now_ms, -1)
    }

    /// Delta de insertar `website` en la colección
    pub fn for_insert(website: &Website, now_ms: i64) -> Self {
        Self::for_website(website, now_ms, 1)
    }

    /// Delta de un cambio de estado in situ (total y mes no cambian)
    pub fn for_status_change(old: WebsiteStatus, new: WebsiteStatus) -> Self {
        Self {
            total: 0,
            by_status: vec![(old, -1), (new, 1)],
            created_this_month: 0,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            total: -self.total,
            by_status: self.by_status.iter().map(|(s, d)| (*s, -d)).collect(),
            created_this_month: -self.created_this_month,
        }
    }

    fn for_website(website: &Website, now_ms: i64, sign: i64) -> Self {
        let month_delta = if created_in_current_month(&website.created_at, now_ms) {
            sign
        } else {
            0
        };
        Self {
            total: sign,
            by_status: vec![(website.status, sign)],
            created_this_month: month_delta,
        }
    }
}

/// ¿Cae `created_at` en el mes de calendario de `now_ms`?
fn created_in_current_month(created_at: &DateTime<Utc>, now_ms: i64) -> bool {
    match DateTime::from_timestamp_millis(now_ms) {
        Some(now) => now.year() == created_at.year() && now.month() == created_at.month(),
        None => false,
    }
}

fn adjust(count: usize, delta: i64) -> usize {
    (count as i64 + delta).max(0) as usize
}
