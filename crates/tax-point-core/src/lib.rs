pub mod error;
pub mod geo;
pub mod payment;
pub mod points;
pub mod resolution;
pub mod rules;
pub mod services;
pub mod types;

pub use error::TaxPointError;
pub use types::*;

/// Standard result type for all tax point resolution
pub type TaxPointResult<T> = Result<T, TaxPointError>;
