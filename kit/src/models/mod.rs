pub mod folder_spec;
pub mod indicator_table;

pub use folder_spec::*;
pub use indicator_table::*;
