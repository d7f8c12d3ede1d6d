pub mod csv_store;
pub mod figure_persister;
pub mod folder_resolver;

pub use csv_store::*;
pub use figure_persister::*;
pub use folder_resolver::*;
