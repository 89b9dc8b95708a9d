use crate::networking::{error::NetworkError, http, uri::Uri};
use flate2::read::{DeflateDecoder, GzDecoder};
use rustls::pki_types::ServerName;
use std::io::Read;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

pub enum Connection {
    Plain(TcpStream),
    Tls(tokio_rustls::client::TlsStream<TcpStream>),
}

/// One TCP (optionally TLS) connection, used for a single request/response
/// exchange and then dropped.
pub struct TcpConnection {
    connection: Connection,
}

impl TcpConnection {
    const MAX_BODY_BYTES: usize = 32 * 1024 * 1024; // 32 MiB safety cap

    pub async fn connect(uri: &Uri) -> Result<Self, NetworkError> {
        let is_https = uri.scheme() == "https";
        let default_port = if is_https { 443 } else { 80 };
        let port = uri.port().unwrap_or(default_port);
        let addr = format!("{}:{}", uri.host(), port);

        let tcp_stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        let connection = if is_https {
            let mut root_store = RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();
            let connector = TlsConnector::from(Arc::new(config));

            // Clone the host string to satisfy the 'static lifetime requirement
            let server_name = ServerName::try_from(uri.host().to_string())
                .map_err(|e| NetworkError::TlsError(e.to_string()))?;

            let tls_stream = connector
                .connect(server_name, tcp_stream)
                .await
                .map_err(|e| NetworkError::TlsError(e.to_string()))?;

            Connection::Tls(tls_stream)
        } else {
            Connection::Plain(tcp_stream)
        };

        Ok(Self { connection })
    }

    pub async fn send_request(
        &mut self,
        request: &http::Request,
    ) -> Result<http::Response, NetworkError> {
        let wire = request.to_bytes();
        match &mut self.connection {
            Connection::Plain(stream) => stream
                .write_all(&wire)
                .await
                .map_err(|e| NetworkError::SendFailed(e.to_string()))?,
            Connection::Tls(stream) => stream
                .write_all(&wire)
                .await
                .map_err(|e| NetworkError::SendFailed(e.to_string()))?,
        }

        let data = self.read_response().await?;
        if data.is_empty() {
            return Err(NetworkError::ReceiveFailed(
                "Empty response received".to_string(),
            ));
        }
        parse_response(data)
    }

    /// Read a full response: headers first, then the body by Content-Length,
    /// chunked framing, or EOF.
    async fn read_response(&mut self) -> Result<Vec<u8>, NetworkError> {
        let mut data = Vec::new();
        let mut buffer = [0u8; 8192];

        let header_end = loop {
            let n = self.read_some(&mut buffer).await?;
            if n == 0 {
                // Connection closed before headers complete
                break find_header_end(&data).unwrap_or(data.len());
            }
            data.extend_from_slice(&buffer[..n]);
            if let Some(end) = find_header_end(&data) {
                break end;
            }
        };

        let framing = BodyFraming::from_header_block(&data[..header_end]);
        let body_start = header_end;

        match framing {
            BodyFraming::Chunked => {
                while !has_chunked_terminator(&data[body_start..]) {
                    let n = self.read_some(&mut buffer).await?;
                    if n == 0 {
                        log::debug!(target: "network", "EOF while reading chunked body");
                        break;
                    }
                    data.extend_from_slice(&buffer[..n]);
                    if data.len() > Self::MAX_BODY_BYTES {
                        return Err(NetworkError::TooLargeResponse);
                    }
                }
            }
            BodyFraming::ContentLength(len) => {
                let target = body_start.saturating_add(len);
                if target > Self::MAX_BODY_BYTES {
                    return Err(NetworkError::TooLargeResponse);
                }
                while data.len() < target {
                    let n = self.read_some(&mut buffer).await?;
                    if n == 0 {
                        break;
                    }
                    data.extend_from_slice(&buffer[..n]);
                }
            }
            BodyFraming::UntilClose => loop {
                let n = self.read_some(&mut buffer).await?;
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&buffer[..n]);
                if data.len() > Self::MAX_BODY_BYTES {
                    return Err(NetworkError::TooLargeResponse);
                }
            },
        }

        Ok(data)
    }

    /// Read from the underlying stream, returning bytes read or 0 on EOF.
    async fn read_some(&mut self, buffer: &mut [u8]) -> Result<usize, NetworkError> {
        match &mut self.connection {
            Connection::Plain(stream) => stream
                .read(buffer)
                .await
                .map_err(|e| NetworkError::ReceiveFailed(e.to_string())),
            Connection::Tls(stream) => match stream.read(buffer).await {
                Ok(n) => Ok(n),
                Err(e) => {
                    // TLS close_notify is expected EOF
                    if e.to_string().contains("close_notify") {
                        Ok(0)
                    } else {
                        Err(NetworkError::ReceiveFailed(e.to_string()))
                    }
                }
            },
        }
    }
}

/// How the response body is delimited, per RFC 9112 message framing.
enum BodyFraming {
    Chunked,
    ContentLength(usize),
    UntilClose,
}

impl BodyFraming {
    fn from_header_block(header_block: &[u8]) -> Self {
        let header_str = String::from_utf8_lossy(header_block);
        let mut content_length: Option<usize> = None;
        let mut is_chunked = false;

        for line in header_str.split("\r\n").skip(1) {
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_lowercase().as_str() {
                "content-length" => content_length = value.parse().ok(),
                "transfer-encoding" => {
                    is_chunked = value
                        .split(',')
                        .any(|v| v.trim().eq_ignore_ascii_case("chunked"));
                }
                _ => {}
            }
        }

        if is_chunked {
            BodyFraming::Chunked
        } else if let Some(len) = content_length {
            BodyFraming::ContentLength(len)
        } else {
            BodyFraming::UntilClose
        }
    }
}

fn parse_response(data: Vec<u8>) -> Result<http::Response, NetworkError> {
    let header_end = find_header_end(&data).ok_or_else(|| {
        NetworkError::ParseError("Missing header terminator (\\r\\n\\r\\n)".to_string())
    })?;

    let header_str = String::from_utf8_lossy(&data[..header_end]);
    let mut lines = header_str.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| NetworkError::ParseError("Empty response".to_string()))?;
    let mut status_parts = status_line.split_whitespace();

    let version = status_parts
        .next()
        .ok_or_else(|| NetworkError::ParseError("Missing HTTP version".to_string()))?;
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(NetworkError::ParseError("Invalid HTTP version".to_string()));
    }

    let code = status_parts
        .next()
        .ok_or_else(|| NetworkError::ParseError("Missing status code".to_string()))?
        .parse::<u16>()
        .map_err(|_| NetworkError::ParseError("Invalid status code".to_string()))?;
    let text = status_parts.collect::<Vec<_>>().join(" ");

    let mut headers = http::Headers::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(':').ok_or_else(|| {
            NetworkError::HeaderParseError(format!("Invalid header line: {line}"))
        })?;
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    let mut body = data[header_end..].to_vec();

    // Undo chunked framing before any content decoding; the chunk-size lines
    // must not leak into the JSON the caller parses.
    if is_transfer_encoding_chunked(&headers) {
        body = decode_chunked_body(&body)?;
    } else if let Some(content_length) = headers.get("content-length") {
        if let Ok(len) = content_length.trim().parse::<usize>() {
            if body.len() >= len {
                body.truncate(len);
            }
        }
    }

    body = decompress_body(&headers, body)?;

    Ok(http::Response {
        status: http::Status { code, text },
        headers,
        body,
    })
}

fn is_transfer_encoding_chunked(headers: &http::Headers) -> bool {
    headers
        .get("transfer-encoding")
        .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case("chunked")))
        .unwrap_or(false)
}

fn decompress_body(headers: &http::Headers, body: Vec<u8>) -> Result<Vec<u8>, NetworkError> {
    let Some(encoding) = headers.get("content-encoding") else {
        return Ok(body);
    };
    if body.is_empty() {
        return Ok(body);
    }

    match encoding.trim().to_lowercase().as_str() {
        "gzip" | "x-gzip" => {
            // Gzip magic bytes: some servers label plain bodies as gzip.
            if body.len() < 2 || body[0] != 0x1f || body[1] != 0x8b {
                log::warn!(target: "network", "Content-Encoding is gzip but body has no gzip magic, returning as-is");
                return Ok(body);
            }
            let mut decoder = GzDecoder::new(&body[..]);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| NetworkError::ReceiveFailed(format!("gzip decode: {e}")))?;
            Ok(decompressed)
        }
        "deflate" => {
            let mut decoder = DeflateDecoder::new(&body[..]);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| NetworkError::ReceiveFailed(format!("deflate decode: {e}")))?;
            Ok(decompressed)
        }
        "identity" | "" => Ok(body),
        other => Err(NetworkError::ReceiveFailed(format!(
            "Unsupported content-encoding: {other}"
        ))),
    }
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

fn has_chunked_terminator(body: &[u8]) -> bool {
    // The last chunk is "0\r\n", followed by optional trailers and "\r\n".
    body.windows(5).any(|w| w == b"0\r\n\r\n")
}

fn decode_chunked_body(body: &[u8]) -> Result<Vec<u8>, NetworkError> {
    let mut decoded = Vec::new();
    let mut pos = 0;

    loop {
        let line_end = body[pos..]
            .windows(2)
            .position(|w| w == b"\r\n")
            .map(|p| pos + p)
            .ok_or_else(|| NetworkError::ParseError("Truncated chunk size line".to_string()))?;

        let size_str = String::from_utf8_lossy(&body[pos..line_end]);
        let size_token = size_str.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_token, 16)
            .map_err(|_| NetworkError::ParseError(format!("Invalid chunk size: {size_token}")))?;

        if size == 0 {
            break;
        }

        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + size;
        if chunk_end > body.len() {
            return Err(NetworkError::ParseError("Truncated chunk data".to_string()));
        }
        decoded.extend_from_slice(&body[chunk_start..chunk_end]);

        // Skip the CRLF trailing the chunk data.
        pos = chunk_end + 2;
        if pos > body.len() {
            return Err(NetworkError::ParseError("Truncated chunk data".to_string()));
        }
    }

    Ok(decoded)
}
