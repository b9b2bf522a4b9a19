mod fingerprint;
mod logging;

pub use fingerprint::*;
pub use logging::*;
