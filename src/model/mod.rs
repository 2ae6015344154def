pub mod config;
pub mod folder;
pub mod ticket;

pub use config::*;
pub use folder::*;
pub use ticket::*;
