pub mod app_state;
pub mod reactivity;
pub mod session_state;
pub mod website_state;

pub use app_state::AppState;
pub use reactivity::Subscribers;
pub use session_state::{Session, SessionState};
pub use website_state::WebsiteState;
