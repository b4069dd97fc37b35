pub mod error;
pub mod handler;
pub mod upstream;

pub use error::{RelayError, RelayResult};
pub use handler::RelayHandler;
pub use upstream::UpstreamClient;
