//! Small HTTP client wrapper over reqwest.
//!
//! Requests are described with a `RequestBuilder` and sent as a whole; the
//! response is read eagerly into a plain `Response` so callers never hold a
//! reqwest type across their own await points.

use std::collections::HashMap;

/// HTTP method for requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    /// Returns true if the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport-level failure: the request never produced a response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("HTTP error: {message}")]
pub struct HttpError {
    pub message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Append a query parameter; values are percent-encoded on send.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let json_bytes = serde_json::to_vec(value)?;
        self.body = Some(json_bytes);
        self.headers
            .insert("content-type".to_owned(), "application/json".to_owned());
        Ok(self)
    }

    pub async fn send(self) -> HttpResult<Response> {
        let client = reqwest::Client::new();

        let mut request = match self.method {
            Method::Get => client.get(&self.url),
            Method::Put => client.put(&self.url),
            Method::Delete => client.delete(&self.url),
        };

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if !self.query.is_empty() {
            request = request.query(&self.query);
        }

        if let Some(body) = self.body {
            request = request.body(body);
        }

        log::debug!("{:?} {}", self.method, self.url);
        let response = request
            .send()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?;

        // Status first; reading the body consumes the response
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?
            .to_vec();

        Ok(Response { status, body })
    }
}

pub struct Client;

impl Client {
    pub fn get(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Method::Get, url)
    }

    pub fn put(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Method::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Method::Delete, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &[u8]) -> Response {
        Response {
            status,
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_response_is_success() {
        assert!(response(200, b"").is_success());
        assert!(response(204, b"").is_success());
        assert!(!response(404, b"").is_success());
        assert!(!response(500, b"").is_success());
    }

    #[test]
    fn test_response_json() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Ack {
            message: String,
        }

        let ack: Ack = response(200, br#"{"message": "ok"}"#)
            .json()
            .expect("body should parse");
        assert_eq!(
            ack,
            Ack {
                message: "ok".to_owned()
            }
        );
    }

    #[test]
    fn test_request_builder_query_and_json() {
        #[derive(serde::Serialize)]
        struct Body {
            status: &'static str,
        }

        let builder = Client::put("https://example.com/api/admin/users/1/status")
            .query("search", "ann smith")
            .json(&Body { status: "Active" })
            .expect("body should serialize");

        assert_eq!(
            builder.query,
            vec![("search".to_owned(), "ann smith".to_owned())]
        );
        assert_eq!(
            builder.headers.get("content-type"),
            Some(&"application/json".to_owned())
        );
        assert_eq!(builder.body.as_deref(), Some(br#"{"status":"Active"}"#.as_slice()));
    }
}
