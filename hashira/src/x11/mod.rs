mod atoms;
mod backend;
mod events;

pub use atoms::*;
pub use backend::*;
pub use events::*;
