use crate::networking::error::NetworkError;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Uri {
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl Uri {
    pub fn parse(uri: &str) -> Result<Self, NetworkError> {
        let (scheme_part, remainder) = uri.split_once("://").ok_or(NetworkError::InvalidUri)?;
        let scheme = scheme_part.to_string();
        if scheme != "http" && scheme != "https" {
            return Err(NetworkError::InvalidUri);
        }

        let (authority, path_and_more) = remainder.split_once('/').unwrap_or((remainder, ""));
        if authority.is_empty() {
            return Err(NetworkError::InvalidUri);
        }

        let (host, port) = if let Some((h, p)) = authority.split_once(':') {
            (
                h.to_string(),
                Some(p.parse().map_err(|_| NetworkError::InvalidUri)?),
            )
        } else {
            (authority.to_string(), None)
        };

        let (path_and_query, _) = path_and_more.split_once('#').unwrap_or((path_and_more, ""));
        let (path_part, query) = path_and_query.split_once('?').unwrap_or((path_and_query, ""));
        let path = if path_part.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", path_part)
        };
        let query = if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        };

        Ok(Self {
            scheme,
            host,
            port,
            path,
            query,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The origin-form request target: path plus query, no authority.
    pub fn request_target(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        write!(f, "{}", self.request_target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_https_uri() {
        let uri = Uri::parse("https://generativelanguage.googleapis.com/v1beta/models/x:generateContent?alt=json")
            .expect("valid uri");
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.host(), "generativelanguage.googleapis.com");
        assert_eq!(uri.port(), None);
        assert_eq!(
            uri.request_target(),
            "/v1beta/models/x:generateContent?alt=json"
        );
    }

    #[test]
    fn parses_explicit_port_and_defaults_path() {
        let uri = Uri::parse("http://127.0.0.1:8080").expect("valid uri");
        assert_eq!(uri.port(), Some(8080));
        assert_eq!(uri.request_target(), "/");
    }

    #[test]
    fn rejects_unknown_schemes_and_empty_hosts() {
        assert!(Uri::parse("ftp://example.com").is_err());
        assert!(Uri::parse("not a uri").is_err());
        assert!(Uri::parse("https:///path-only").is_err());
    }
}
