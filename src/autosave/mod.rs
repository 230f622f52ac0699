mod autosave;
mod builder;

pub use autosave::*;
pub use builder::*;
