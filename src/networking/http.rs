use crate::networking::error::NetworkError;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub body: Vec<u8>,
}

#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: String,
    headers: Headers,
    body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Headers(HashMap<String, String>);

#[derive(Debug)]
pub enum Method {
    POST,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub code: u16,
    pub text: String,
}

impl Status {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl Request {
    pub fn new() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut request = Vec::new();

        let method = match self.method {
            Method::POST => "POST",
        };
        request.extend(format!("{} {} HTTP/1.1\r\n", method, self.uri).as_bytes());

        for (name, value) in self.headers.iter() {
            request.extend(format!("{}: {}\r\n", name, value).as_bytes());
        }
        if !self.body.is_empty() && self.headers.get("content-length").is_none() {
            request.extend(format!("content-length: {}\r\n", self.body.len()).as_bytes());
        }

        // Empty line separating headers from body
        request.extend(b"\r\n");
        request.extend(&self.body);

        request
    }
}

pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl RequestBuilder {
    fn new() -> Self {
        Self {
            method: None,
            uri: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, NetworkError> {
        Ok(Request {
            method: self.method.ok_or(NetworkError::MissingMethod)?,
            uri: self.uri.ok_or(NetworkError::MissingUri)?,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Headers {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, name: String, value: String) {
        self.0.insert(name.to_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.0.get(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_post_with_body_and_length() {
        let request = Request::new()
            .method(Method::POST)
            .uri("/v1beta/models/m:generateContent")
            .header("Host", "example.com")
            .header("Content-Type", "application/json")
            .body(b"{\"contents\":[]}".to_vec())
            .build()
            .expect("complete request");

        let wire = String::from_utf8(request.to_bytes()).expect("ascii request");
        assert!(wire.starts_with("POST /v1beta/models/m:generateContent HTTP/1.1\r\n"));
        assert!(wire.contains("host: example.com\r\n"));
        assert!(wire.contains("content-type: application/json\r\n"));
        assert!(wire.contains("content-length: 15\r\n"));
        assert!(wire.ends_with("\r\n\r\n{\"contents\":[]}"));
    }

    #[test]
    fn build_requires_method_and_uri() {
        assert!(Request::new().uri("/x").build().is_err());
        assert!(Request::new().method(Method::POST).build().is_err());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        assert_eq!(
            headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }
}
