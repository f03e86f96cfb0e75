/// Key names of the login and snapshot documents.

// Login response
pub const USERID: &str = "userid";
pub const ACCESS_TOKEN: &str = "access_token";
pub const TRANSPORT_URL: &str = "transport_url";

// Snapshot sections
pub const USER: &str = "user";
pub const STRUCTURE: &str = "structure";
pub const DEVICE: &str = "device";
pub const SHARED: &str = "shared";

// Reference lists and their prefixes
pub const STRUCTURES: &str = "structures";
pub const DEVICES: &str = "devices";
pub const STRUCTURE_PREFIX: &str = "structure.";
pub const DEVICE_PREFIX: &str = "device.";

// Metrics
pub const CURRENT_HUMIDITY: &str = "current_humidity";
pub const CURRENT_TEMPERATURE: &str = "current_temperature";
