use serde_json::Number;
use time::OffsetDateTime;

use crate::error::{ExtractError, FetchError};

/// Authenticated context returned by the login call.
///
/// Built once per run and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub user_id: String,
    pub access_token: String,
    pub transport_url: String,
}

/// Both metrics of one device, read from a single snapshot.
#[derive(Debug)]
pub struct DeviceReading {
    pub structure_id: String,
    pub device_id: String,
    pub humidity: Result<Number, ExtractError>,
    pub temperature: Result<Number, ExtractError>,
}

/// A structure listed for the user that could not be walked.
#[derive(Debug)]
pub struct SkippedStructure {
    pub structure_id: String,
    pub error: FetchError,
}

/// Everything gathered during one poll cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: OffsetDateTime,
    pub readings: Vec<DeviceReading>,
    pub skipped: Vec<SkippedStructure>,
}

impl CycleReport {
    pub fn failed_readings(&self) -> usize {
        self.readings
            .iter()
            .filter(|r| r.humidity.is_err() || r.temperature.is_err())
            .count()
    }
}
