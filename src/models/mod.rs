pub mod auth;
pub mod error;
pub mod stats;
pub mod website;

pub use auth::{LoginRequest, LoginResponse, RefreshResponse, User, ValidateResponse};
pub use error::SessionError;
pub use stats::{StatsDelta, WebsiteStats};
pub use website::{CreateWebsiteRequest, Website, WebsiteStatus};
