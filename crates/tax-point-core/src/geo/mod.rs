pub mod geo_path;
pub mod itin;
pub mod properties;

pub use geo_path::{Geo, GeoPath, Loc};
pub use itin::{FlightUsage, Itin};
pub use properties::{TaxPointProperties, TaxPointsProperties};
