mod keys;
mod languages;
mod layer;
mod load_settings;
mod resolve_chain;
mod scope;
mod settings;

pub use keys::*;
pub use languages::*;
pub use layer::*;
pub use load_settings::*;
pub use resolve_chain::*;
pub use scope::*;
pub use settings::*;
