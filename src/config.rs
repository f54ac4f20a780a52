use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url_development: String,
    pub backend_url_production: String,
    pub environment: String,
    pub enable_logging: bool,
    /// Minutos de antelación con los que se renueva el access token
    pub refresh_lead_minutes: i64,
    /// Vida útil por defecto del access token si el servidor no la declara
    pub default_token_lifetime_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url_development: "http://localhost:3000".to_string(),
            backend_url_production: "https://api.chatlift.io".to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            refresh_lead_minutes: 5,
            default_token_lifetime_minutes: 60,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        Self {
            backend_url_development: option_env!("BACKEND_URL_DEVELOPMENT")
                .unwrap_or("http://localhost:3000").to_string(),
            backend_url_production: option_env!("BACKEND_URL_PRODUCTION")
                .unwrap_or("https://api.chatlift.io").to_string(),
            environment: option_env!("ENVIRONMENT")
                .unwrap_or("development").to_string(),
            enable_logging: option_env!("ENABLE_LOGGING")
                .unwrap_or("true").parse().unwrap_or(true),
            refresh_lead_minutes: option_env!("REFRESH_LEAD_MINUTES")
                .unwrap_or("5").parse().unwrap_or(5),
            default_token_lifetime_minutes: option_env!("DEFAULT_TOKEN_LIFETIME_MINUTES")
                .unwrap_or("60").parse().unwrap_or(60),
        }
    }

    /// Obtiene la URL del backend según el entorno actual
    pub fn backend_url(&self) -> &str {
        match self.environment.as_str() {
            "production" => &self.backend_url_production,
            _ => &self.backend_url_development,
        }
    }

    /// Antelación de renovación en milisegundos
    pub fn refresh_lead_ms(&self) -> i64 {
        self.refresh_lead_minutes * 60 * 1000
    }

    /// Vida útil por defecto del access token en milisegundos
    pub fn default_token_lifetime_ms(&self) -> i64 {
        self.default_token_lifetime_minutes * 60 * 1000
    }

    /// Verifica si el modo de logging está habilitado
    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
