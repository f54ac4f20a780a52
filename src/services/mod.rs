pub mod api_client;
pub mod auth_service;
pub mod refresh_scheduler;
pub mod token_events;
pub mod website_service;

pub use api_client::DashboardApi;
pub use auth_service::{AuthService, RenewOutcome};
pub use refresh_scheduler::RefreshScheduler;
pub use token_events::{TokenChannel, TokenRefreshedEvent};
pub use website_service::WebsiteService;

#[cfg(target_arch = "wasm32")]
pub use api_client::HttpApiClient;
