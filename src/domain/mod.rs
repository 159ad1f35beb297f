mod location_log;
mod location_record;

pub use location_log::{LocationLog, LocationLogError};
pub use location_record::{InvalidPayload, LocationRecord};
