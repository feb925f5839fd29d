pub mod analysis;
pub mod dataset;
pub mod operations;
pub mod split;

pub use analysis::*;
pub use dataset::*;
pub use operations::*;
pub use split::*;
