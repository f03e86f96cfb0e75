/// Single request/response HTTP exchanges against the vendor API
use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};

use crate::error::{ConfigError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Sent verbatim as the `Authorization` header, scheme prefix included.
    pub authorization: Option<String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        HttpRequest {
            method: Method::Get,
            url: url.into(),
            authorization: None,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        HttpRequest {
            method: Method::Post,
            url: url.into(),
            authorization: None,
            body: Some(body.into()),
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}

/// One HTTP exchange, returning the raw response body.
///
/// Implementations keep no state between calls and never retry.
pub trait Transport {
    fn call(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// `Transport` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    async fn call(&self, request: HttpRequest) -> Result<String, TransportError> {
        let HttpRequest {
            method,
            url,
            authorization,
            body,
        } = request;

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if let Some(auth) = authorization.filter(|a| !a.is_empty()) {
            builder = builder.header(AUTHORIZATION, auth);
        }

        if let Some(body) = body.filter(|b| !b.is_empty()) {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(CONTENT_LENGTH, body.len())
                .body(body);
        }

        debug!("{:?} {}", method, url);

        let response = builder
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| TransportError::Request { url, source })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(body.to_string()));
            self
        }

        pub fn fail_with_status(self, status: u16) -> Self {
            self.responses.lock().unwrap().push_back(Err(TransportError::Status {
                url: "scripted".to_string(),
                status,
            }));
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        async fn call(&self, request: HttpRequest) -> Result<String, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted response left"))
        }
    }
}
