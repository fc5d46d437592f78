pub mod ad_unit;
pub mod placement;
pub mod state;

pub use ad_unit::*;
pub use placement::*;
pub use state::*;
