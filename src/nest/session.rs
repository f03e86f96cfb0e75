/// Login exchange: credentials in, session descriptor out
use log::info;
use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use super::schema;
use crate::error::AuthError;
use crate::models::SessionDescriptor;
use crate::transport::{HttpRequest, Transport};

#[derive(Deserialize)]
struct LoginResponse {
    userid: Option<Value>,
    access_token: Option<Value>,
    urls: Option<LoginUrls>,
}

#[derive(Deserialize)]
struct LoginUrls {
    transport_url: Option<Value>,
}

/// Form body for the login POST.
///
/// Values are percent-encoded, so credentials containing `&` or `=` survive.
pub fn login_body(username: &str, password: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("username", username)
        .append_pair("password", password)
        .finish()
}

/// Exchange username and password for a session with a single POST.
///
/// No retry is attempted; any failure is returned to the caller.
pub async fn authenticate<T: Transport>(
    transport: &T,
    username: &str,
    password: &str,
    login_url: &str,
) -> Result<SessionDescriptor, AuthError> {
    let request = HttpRequest::post(login_url, login_body(username, password));
    let body = transport.call(request).await?;

    let session = parse_login_response(&body)?;
    info!("Authenticated as user {}", session.user_id);
    Ok(session)
}

pub fn parse_login_response(body: &str) -> Result<SessionDescriptor, AuthError> {
    let response: LoginResponse = serde_json::from_str(body).map_err(AuthError::Malformed)?;

    let user_id = text(response.userid).ok_or(AuthError::MissingField(schema::USERID))?;
    let access_token =
        text(response.access_token).ok_or(AuthError::MissingField(schema::ACCESS_TOKEN))?;
    let transport_url = response
        .urls
        .and_then(|urls| text(urls.transport_url))
        .ok_or(AuthError::MissingField(schema::TRANSPORT_URL))?;

    Ok(SessionDescriptor {
        user_id,
        access_token,
        transport_url,
    })
}

// Ids occasionally arrive as JSON numbers; keep their textual form.
fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
