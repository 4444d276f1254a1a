pub mod deriv;
pub mod replay;

pub use deriv::DerivStream;
pub use replay::ReplaySource;
