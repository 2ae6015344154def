pub mod archive_io;
pub mod config_io;
pub mod inspect;
pub mod lock;
pub mod opener;
pub mod store;
