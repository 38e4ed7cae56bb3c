pub mod condition;
pub mod deal;
pub mod offer;
pub mod scan;
pub mod stats;

pub use condition::*;
pub use deal::*;
pub use offer::*;
pub use scan::*;
pub use stats::*;
