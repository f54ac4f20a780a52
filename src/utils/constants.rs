/// Slot persistente del access token
pub const STORAGE_KEY_ACCESS_TOKEN: &str = "chatlift_access_token";

/// Slot persistente del refresh token
pub const STORAGE_KEY_REFRESH_TOKEN: &str = "chatlift_refresh_token";

/// Canal de difusión entre pestañas para renovaciones de token
pub const TOKEN_EVENT_CHANNEL: &str = "token-refreshed";
