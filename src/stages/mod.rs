pub mod generation;
pub mod stage1_flatten;
pub mod stage2_dates;
pub mod stage3_prune;
pub mod stage4_render;

pub use generation::*;
pub use stage1_flatten::*;
pub use stage2_dates::*;
pub use stage3_prune::*;
pub use stage4_render::*;
