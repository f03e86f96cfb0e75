pub mod metrics;
pub mod schema;
pub mod session;
pub mod snapshot;

pub use metrics::{current_humidity, current_temperature};
pub use session::authenticate;
pub use snapshot::{fetch_snapshot, AccountSnapshot};
