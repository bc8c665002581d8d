mod config;
mod engine;
mod lifecycle;
mod rule_set;
mod store;
mod window;

pub use config::*;
pub use engine::*;
pub use lifecycle::*;
pub use rule_set::*;
pub use store::*;
pub use window::*;
