mod ogb_mag;
pub use ogb_mag::*;

mod traits;
pub use traits::*;

mod utils;
pub use utils::*;
