pub mod categories;
pub mod dates;
pub mod dedup;
pub mod flatten;
pub mod literal;

pub use categories::*;
pub use dates::*;
pub use dedup::*;
pub use flatten::*;
pub use literal::*;
