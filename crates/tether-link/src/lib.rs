pub mod error;
pub mod link;

pub use error::VehicleError;
pub use link::{AgeUnit, LinkConfig, LinkState, VehicleLink};

pub type Result<T> = std::result::Result<T, VehicleError>;
