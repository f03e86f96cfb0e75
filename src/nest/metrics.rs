/// Per-device metric lookup inside an account snapshot
use serde_json::{Number, Value};

use super::schema;
use super::snapshot::AccountSnapshot;
use crate::error::ExtractError;

/// `shared.<device_id>.current_temperature`, in vendor units.
///
/// The number is returned as the vendor sent it, so `20.0` still displays as `20.0`.
pub fn current_temperature(
    snapshot: &AccountSnapshot,
    device_id: &str,
) -> Result<Number, ExtractError> {
    metric(snapshot, schema::SHARED, device_id, schema::CURRENT_TEMPERATURE)
}

/// `device.<device_id>.current_humidity`, as a percentage.
pub fn current_humidity(
    snapshot: &AccountSnapshot,
    device_id: &str,
) -> Result<Number, ExtractError> {
    metric(snapshot, schema::DEVICE, device_id, schema::CURRENT_HUMIDITY)
}

fn metric(
    snapshot: &AccountSnapshot,
    section: &'static str,
    device_id: &str,
    name: &'static str,
) -> Result<Number, ExtractError> {
    let entry = snapshot
        .section(section)
        .and_then(|map| map.get(device_id))
        .ok_or_else(|| ExtractError::UnknownDevice {
            section,
            device_id: device_id.to_string(),
        })?;

    let entry = entry
        .as_object()
        .ok_or_else(|| ExtractError::MalformedEntry {
            section,
            device_id: device_id.to_string(),
        })?;

    match entry.get(name) {
        None | Some(Value::Null) => Err(ExtractError::MissingMetric {
            device_id: device_id.to_string(),
            metric: name,
        }),
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(_) => Err(ExtractError::InvalidMetric {
            device_id: device_id.to_string(),
            metric: name,
        }),
    }
}
