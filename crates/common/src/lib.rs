pub mod clock;
pub mod config;
pub mod errors;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, PollConfig, SessionConfig};
pub use errors::{ApiError, ApiResult};
