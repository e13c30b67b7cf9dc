pub mod config;
pub mod domain;
pub mod errors;
pub mod list;

pub use domain::item::{normalize_item_name, Item};
pub use errors::{BackendError, DomainError, InterfaceError};
pub use list::ListBackend;
