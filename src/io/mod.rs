pub mod fetch;
pub mod input;
pub mod output;

pub use fetch::*;
pub use input::*;
pub use output::*;
