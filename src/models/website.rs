use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Estado del widget de chat en un sitio gestionado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteStatus {
    Active,
    Pending,
    Inactive,
}

impl WebsiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebsiteStatus::Active => "active",
            WebsiteStatus::Pending => "pending",
            WebsiteStatus::Inactive => "inactive",
        }
    }
}

/// Sitio web gestionado por el cliente (item de la colección compartida)
///
/// La identidad (`id`, `created_at`) la asigna siempre el servidor en la
/// respuesta de creación; el cliente nunca genera ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub id: String,
    pub domain: String,
    pub name: String,
    pub status: WebsiteStatus,
    pub created_at: DateTime<Utc>,
}

/// Orden canónico de la colección: más reciente primero, id como desempate.
/// El rollback de una mutación optimista reinserta por esta clave, nunca al final.
pub fn canonical_cmp(a: &Website, b: &Website) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct CreateWebsiteRequest {
    pub domain: String,
    pub name: String,
}
