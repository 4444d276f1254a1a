pub mod stream;

pub use stream::{parse_tick_message, DerivStream};
