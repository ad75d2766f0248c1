// Copyright 2020-2021 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::defs;
use crate::schema::FabricStatus;

#[derive(Debug)]
pub enum Error {
    BadUrl,
    ConnectError(std::io::Error),
    HttpStatus(u16),
    IoError(std::io::Error),
    MsgLen,
    ParseError,
    SerdeError(serde_json::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A parsed `http://host[:port]/path` endpoint.
///
/// The status API lives on a link-local plaintext listener, so only the `http`
/// scheme is accepted. Anything else (or an empty authority) is a `BadUrl`.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri.strip_prefix("http://").ok_or(Error::BadUrl)?;
        let (authority, path) = match rest.find('/') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return Err(Error::BadUrl);
        }
        let (host, port) = match authority.rfind(':') {
            Some(pos) => {
                let port = authority[pos + 1..].parse::<u16>().map_err(|_| Error::BadUrl)?;
                (&authority[..pos], port)
            }
            None => (authority, defs::DEFAULT_HTTP_PORT),
        };
        if host.is_empty() {
            return Err(Error::BadUrl);
        }
        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// Append a resource to the endpoint path. This is plain concatenation:
    /// the descriptor contract requires the base URI to end with a separator.
    pub fn join(&self, resource: &str) -> Self {
        Self {
            host: self.host.clone(),
            port: self.port,
            path: format!("{}{}", self.path, resource),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }
}

/// Minimal HTTP/1.1 client for the enclave status API.
///
/// Each `fetch_status()` call opens a fresh connection, issues a single
/// authenticated GET, and reads a single JSON response. No pooling, no
/// keep-alive: the poller treats every attempt as independent, and the
/// request carries `Connection: close`.
///
/// Example exchange:
///
/// ----- REQUEST -----
/// GET /fabric/status HTTP/1.1
/// Host: 169.254.0.7
/// X-Auth-Token: <api key>
/// Content-Type: application/json
/// Accept: application/json
/// Connection: close
/// ----- REQUEST -----
///
/// ----- RESPONSE -----
/// HTTP/1.1 200 OK
/// Content-Type: application/json
/// Content-Length: 92
///
/// {"Profile":{"VirtualAddress":"10.0.0.9","Certificate":{...}}}
/// ----- RESPONSE -----
pub struct StatusClient {
    endpoint: Endpoint,
    auth_token: String,
}

/// The HTTP response headers the status client is interested in.
struct HttpHeaders {
    content_length: Option<usize>,
}

impl StatusClient {
    /// Maximum size (in bytes) of the HTTP response headers section.
    const MAX_HDR_LEN: usize = 4 * 1024;
    /// Maximum size (in bytes) of the HTTP response body.
    const MAX_BODY_LEN: usize = 64 * 1024;

    /// Create a status client from the descriptor's base URI and API key.
    /// The status resource path is joined onto the base URI here, once.
    pub fn new(base_uri: &str, auth_token: &str) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::parse(base_uri)?.join(defs::STATUS_RESOURCE),
            auth_token: auth_token.to_string(),
        })
    }

    /// Issue one authenticated GET against the status endpoint and decode the
    /// response body as a fabric status document.
    pub fn fetch_status(&self) -> Result<FabricStatus> {
        let mut stream = self.connect()?;
        self.send_request(&mut stream)?;
        self.recv_response(&mut stream)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn connect(&self) -> Result<TcpStream> {
        let timeout = Duration::from_millis(defs::STREAM_TIMEOUT_MS);
        let addr = (self.endpoint.host.as_str(), self.endpoint.port)
            .to_socket_addrs()
            .map_err(Error::ConnectError)?
            .next()
            .ok_or(Error::BadUrl)?;
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(Error::ConnectError)?;
        stream
            .set_read_timeout(Some(timeout))
            .and_then(|_| stream.set_write_timeout(Some(timeout)))
            .map_err(Error::ConnectError)?;
        Ok(stream)
    }

    fn send_request(&self, stream: &mut TcpStream) -> Result<()> {
        stream
            .write_all(
                format!(
                    "GET {} HTTP/1.1\r\n\
                    Host: {}\r\n\
                    X-Auth-Token: {}\r\n\
                    Content-Type: application/json\r\n\
                    Accept: application/json\r\n\
                    Connection: close\r\n\
                    \r\n",
                    self.endpoint.path, self.endpoint.host, self.auth_token,
                )
                .as_bytes(),
            )
            .map_err(Error::IoError)
    }

    fn recv_response(&self, stream: &mut TcpStream) -> Result<FabricStatus> {
        // Limit how much we read off the wire while keeping line-by-line
        // input: Take bounds the reader, and since R: Read implies
        // &mut R: Read, the BufReader can borrow the stream for the lifetime
        // of this one response.
        let mut reader = BufReader::new(stream.take(Self::MAX_HDR_LEN as u64));
        let mut ln = String::new();
        reader.read_line(&mut ln).map_err(Error::IoError)?;
        let mut iter = ln.as_str().trim().split_whitespace();
        match (iter.next(), iter.next()) {
            (Some(version), Some("200")) if version.starts_with("HTTP/1.") => (),
            (Some(version), Some(code)) if version.starts_with("HTTP/1.") => {
                return Err(code
                    .parse::<u16>()
                    .map(Error::HttpStatus)
                    .unwrap_or(Error::ParseError));
            }
            _ => return Err(Error::ParseError),
        }

        let headers = Self::read_headers(&mut reader)?;
        let body = match headers.content_length {
            Some(len) => {
                if len > Self::MAX_BODY_LEN {
                    return Err(Error::MsgLen);
                }
                reader.get_mut().set_limit(len as u64);
                let mut buf = vec![0u8; len];
                reader.read_exact(buf.as_mut_slice()).map_err(Error::IoError)?;
                buf
            }
            None => {
                // No Content-Length: the server closes the connection at the
                // end of the body (we asked for Connection: close).
                reader.get_mut().set_limit(Self::MAX_BODY_LEN as u64 + 1);
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).map_err(Error::IoError)?;
                if buf.len() > Self::MAX_BODY_LEN {
                    return Err(Error::MsgLen);
                }
                buf
            }
        };
        serde_json::from_slice(body.as_slice()).map_err(Error::SerdeError)
    }

    /// Read the response headers, keeping only the ones we recognize.
    /// Unknown headers are skipped: unlike our own RPC peers, the status API
    /// server is free to send whatever it likes alongside.
    fn read_headers<R: BufRead>(reader: &mut R) -> Result<HttpHeaders> {
        let mut content_length = None;

        loop {
            let mut ln = String::new();
            reader.read_line(&mut ln).map_err(Error::IoError)?;
            let ln = ln.as_str().trim();

            if ln.is_empty() {
                break;
            }

            let mut iter = ln.splitn(2, ':');
            match (iter.next(), iter.next()) {
                (Some(name), Some(value)) if name.eq_ignore_ascii_case("content-length") => {
                    let len = value.trim().parse::<usize>().map_err(|_| Error::ParseError)?;
                    content_length = Some(len);
                }
                (Some(_), Some(_)) => (),
                _ => return Err(Error::ParseError),
            }
        }

        Ok(HttpHeaders { content_length })
    }
}
