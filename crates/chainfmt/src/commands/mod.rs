mod conflicts;
mod formatting;
mod general;
mod registry;
mod workspace;

pub use conflicts::*;
pub use formatting::*;
pub use general::*;
pub use registry::*;
pub use workspace::*;
