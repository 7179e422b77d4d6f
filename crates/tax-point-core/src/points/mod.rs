pub mod finder;
pub mod iterator;
pub mod utils;
pub mod validators;

pub use finder::TaxPointFinder;
pub use iterator::TaxPointIterator;
pub use utils::{RangeScope, TaxPointRange};
pub use validators::{FurthestValidator, MatchPolicy, PointValidator, TaxPointValidator};
