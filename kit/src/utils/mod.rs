pub mod logger;
pub mod sanitize;
pub mod stats;
pub mod version;

pub use logger::*;
pub use sanitize::*;
pub use stats::*;
pub use version::*;
