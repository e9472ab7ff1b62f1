pub mod date;
pub mod registry;
pub mod table;

pub use date::*;
pub use registry::*;
pub use table::*;
