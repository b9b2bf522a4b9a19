mod activation;
mod active_formatter;
mod chain;
mod executor;
mod recursion_guard;

pub use activation::*;
pub use active_formatter::*;
pub use chain::*;
pub use executor::*;
pub use recursion_guard::*;
