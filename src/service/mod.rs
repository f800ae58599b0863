//! Request validation and the services handlers delegate to.

mod conversions;
mod coops;
mod retailers;
pub mod validation;

pub use conversions::{format_header, to_csv, ConversionService};
pub use coops::CoopService;
pub use retailers::RetailerService;
pub use validation::{FieldError, RequestValidator, Validate};
