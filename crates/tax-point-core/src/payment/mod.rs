pub mod payment_detail;
pub mod subjects;

pub use payment_detail::{PaymentDetail, SubjectRef};
pub use subjects::{
    OptionalService, OptionalServiceTag, SubjectDetail, TaxableYqYr, TaxableYqYrs, YqYrType,
};
