pub mod constants;
pub mod spawn;
pub mod storage;
pub mod time;
pub mod timers;

pub use constants::{STORAGE_KEY_ACCESS_TOKEN, STORAGE_KEY_REFRESH_TOKEN, TOKEN_EVENT_CHANNEL};
pub use spawn::Spawner;
pub use storage::{normalize_token, MemoryStorage, TokenStorage};
pub use time::{Clock, SystemClock};
pub use timers::{OneShotTimer, TimerHandle};
