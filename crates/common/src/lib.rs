pub mod config;
pub mod error;
pub mod feed;
pub mod sink;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use feed::TickSource;
pub use sink::EventSink;
pub use types::*;
