/// Account snapshot: fetching, validation and structure/device traversal
use log::debug;
use serde_json::{Map, Value};

use super::schema;
use crate::error::FetchError;
use crate::models::SessionDescriptor;
use crate::transport::{HttpRequest, Transport};

/// One point-in-time view of the whole account.
///
/// Only the four sections the poller needs are kept; each is guaranteed
/// to be a JSON object once construction succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    user: Map<String, Value>,
    structure: Map<String, Value>,
    device: Map<String, Value>,
    shared: Map<String, Value>,
}

/// `transport_url + rest_path + user_id`, concatenated as-is.
pub fn snapshot_url(session: &SessionDescriptor, rest_path: &str) -> String {
    format!("{}{}{}", session.transport_url, rest_path, session.user_id)
}

/// GET the account state for an authenticated session.
pub async fn fetch_snapshot<T: Transport>(
    transport: &T,
    session: &SessionDescriptor,
    rest_path: &str,
) -> Result<AccountSnapshot, FetchError> {
    let request = HttpRequest::get(snapshot_url(session, rest_path))
        .with_authorization(format!("Basic {}", session.access_token));

    let body = transport.call(request).await?;
    debug!("Snapshot body: {}", body);

    AccountSnapshot::parse(&body)
}

impl AccountSnapshot {
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body).map_err(FetchError::Malformed)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        let mut root = match value {
            Value::Object(map) => map,
            _ => return Err(FetchError::NotAnObject),
        };

        let mut section = |name: &'static str| match root.remove(name) {
            Some(Value::Object(map)) => Ok(map),
            _ => Err(FetchError::MissingSection(name)),
        };

        Ok(AccountSnapshot {
            user: section(schema::USER)?,
            structure: section(schema::STRUCTURE)?,
            device: section(schema::DEVICE)?,
            shared: section(schema::SHARED)?,
        })
    }

    /// Bare ids of the structures listed under `user.<user_id>.structures`, in order.
    pub fn structure_ids(&self, user_id: &str) -> Result<Vec<String>, FetchError> {
        let user = self
            .user
            .get(user_id)
            .and_then(Value::as_object)
            .ok_or_else(|| FetchError::UnknownUser(user_id.to_string()))?;

        let path = format!("{}.{}.{}", schema::USER, user_id, schema::STRUCTURES);
        reference_list(user.get(schema::STRUCTURES), schema::STRUCTURE_PREFIX, path)
    }

    /// Bare ids of the devices listed under `structure.<structure_id>.devices`, in order.
    pub fn device_ids_in(&self, structure_id: &str) -> Result<Vec<String>, FetchError> {
        let structure = self
            .structure
            .get(structure_id)
            .and_then(Value::as_object)
            .ok_or_else(|| FetchError::UnknownStructure(structure_id.to_string()))?;

        let path = format!("{}.{}.{}", schema::STRUCTURE, structure_id, schema::DEVICES);
        reference_list(structure.get(schema::DEVICES), schema::DEVICE_PREFIX, path)
    }

    pub(crate) fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        match name {
            schema::USER => Some(&self.user),
            schema::STRUCTURE => Some(&self.structure),
            schema::DEVICE => Some(&self.device),
            schema::SHARED => Some(&self.shared),
            _ => None,
        }
    }
}

/// Strip the `structure.` / `device.` prefix from a reference.
///
/// A reference without the prefix is already a bare key.
pub fn bare_id<'a>(reference: &'a str, prefix: &str) -> &'a str {
    reference.strip_prefix(prefix).unwrap_or(reference)
}

fn reference_list(
    value: Option<&Value>,
    prefix: &str,
    path: String,
) -> Result<Vec<String>, FetchError> {
    let items = match value {
        Some(Value::Array(items)) => items,
        _ => return Err(FetchError::InvalidList(path)),
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(reference) => Ok(bare_id(reference, prefix).to_string()),
            _ => Err(FetchError::InvalidList(path.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::testing::ScriptedTransport;
    use crate::transport::Method;

    const TWO_HOMES: &str = r#"{
        "user": {"u1": {"structures": ["structure.home", "structure.cabin"]}},
        "structure": {
            "home": {"devices": ["device.hall", "device.kitchen"]},
            "cabin": {"devices": ["device.loft"]}
        },
        "device": {
            "hall": {"current_humidity": 40},
            "kitchen": {"current_humidity": 55},
            "loft": {"current_humidity": 61},
            "orphan": {"current_humidity": 10}
        },
        "shared": {
            "hall": {"current_temperature": 20.5},
            "kitchen": {"current_temperature": 22},
            "loft": {"current_temperature": 14.25}
        },
        "metadata": {"ignored": true}
    }"#;

    fn device_ids(snapshot: &AccountSnapshot, user_id: &str) -> Result<Vec<String>, FetchError> {
        let mut ids = Vec::new();
        for structure_id in snapshot.structure_ids(user_id)? {
            ids.extend(snapshot.device_ids_in(&structure_id)?);
        }
        Ok(ids)
    }

    fn session() -> SessionDescriptor {
        SessionDescriptor {
            user_id: "u1".to_string(),
            access_token: "tok".to_string(),
            transport_url: "https://api.example/".to_string(),
        }
    }

    #[test]
    fn url_is_plain_concatenation() {
        assert_eq!(
            snapshot_url(&session(), "v2/mobile/user."),
            "https://api.example/v2/mobile/user.u1"
        );
    }

    #[tokio::test]
    async fn fetch_sends_basic_token_on_get() {
        let transport = ScriptedTransport::new().respond(TWO_HOMES);

        fetch_snapshot(&transport, &session(), "v2/mobile/user.")
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "https://api.example/v2/mobile/user.u1");
        assert_eq!(requests[0].authorization.as_deref(), Some("Basic tok"));
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn fetch_surfaces_transport_errors() {
        let transport = ScriptedTransport::new().fail_with_status(401);

        let err = fetch_snapshot(&transport, &session(), "/p/").await.unwrap_err();

        assert!(matches!(
            err,
            FetchError::Transport(TransportError::Status { status: 401, .. })
        ));
    }

    #[test]
    fn parse_failures_are_typed() {
        assert!(matches!(
            AccountSnapshot::parse("{not json"),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            AccountSnapshot::parse("[]"),
            Err(FetchError::NotAnObject)
        ));
        assert!(matches!(
            AccountSnapshot::parse(r#"{"user":{},"structure":{},"device":{}}"#),
            Err(FetchError::MissingSection("shared"))
        ));
        assert!(matches!(
            AccountSnapshot::parse(r#"{"user":{},"structure":[],"device":{},"shared":{}}"#),
            Err(FetchError::MissingSection("structure"))
        ));
    }

    #[test]
    fn walks_structures_then_devices_in_order() {
        let snapshot = AccountSnapshot::parse(TWO_HOMES).unwrap();

        assert_eq!(snapshot.structure_ids("u1").unwrap(), vec!["home", "cabin"]);
        assert_eq!(snapshot.device_ids_in("home").unwrap(), vec!["hall", "kitchen"]);
        assert_eq!(
            device_ids(&snapshot, "u1").unwrap(),
            vec!["hall", "kitchen", "loft"]
        );
    }

    #[test]
    fn enumeration_is_repeatable() {
        let snapshot = AccountSnapshot::parse(TWO_HOMES).unwrap();
        assert_eq!(
            device_ids(&snapshot, "u1").unwrap(),
            device_ids(&snapshot, "u1").unwrap()
        );
    }

    #[test]
    fn unlisted_devices_are_never_visited() {
        let snapshot = AccountSnapshot::parse(TWO_HOMES).unwrap();
        let ids = device_ids(&snapshot, "u1").unwrap();
        assert!(!ids.iter().any(|id| id == "orphan"));
    }

    #[test]
    fn unknown_user_and_structure_fail() {
        let snapshot = AccountSnapshot::parse(
            r#"{"user":{"u1":{"structures":["structure.gone"]}},"structure":{},"device":{},"shared":{}}"#,
        )
        .unwrap();

        assert!(matches!(
            snapshot.structure_ids("u2"),
            Err(FetchError::UnknownUser(id)) if id == "u2"
        ));
        assert!(matches!(
            device_ids(&snapshot, "u1"),
            Err(FetchError::UnknownStructure(id)) if id == "gone"
        ));
    }

    #[test]
    fn non_list_references_are_rejected() {
        let snapshot = AccountSnapshot::parse(
            r#"{"user":{"u1":{"structures":"structure.s1"}},"structure":{"s1":{"devices":[7]}},"device":{},"shared":{}}"#,
        )
        .unwrap();

        assert!(matches!(
            snapshot.structure_ids("u1"),
            Err(FetchError::InvalidList(path)) if path == "user.u1.structures"
        ));
        assert!(matches!(
            snapshot.device_ids_in("s1"),
            Err(FetchError::InvalidList(path)) if path == "structure.s1.devices"
        ));
    }

    #[test]
    fn bare_id_strips_only_a_leading_prefix() {
        assert_eq!(bare_id("device.02AA", "device."), "02AA");
        assert_eq!(bare_id("02AA", "device."), "02AA");
        assert_eq!(bare_id("x.device.02AA", "device."), "x.device.02AA");
    }
}
