//! Core data types for VIN CLI
//!
//! VIN validation, the schema-less vehicle record returned by the lookup API,
//! and the client that fetches it.

pub mod lookup;
pub mod record;
pub mod vin;

pub use lookup::{LookupClient, LookupFailed, VehicleSource, DEFAULT_API_URL};
pub use record::{FieldValue, VehicleRecord};
pub use vin::{InvalidVin, Vin, VIN_LENGTH};
