/*
 * request.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Larkspur, an asynchronous networking framework.
 *
 * Larkspur is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Larkspur is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Larkspur.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP request: method, target, query, headers, optional body.
//!
//! Target and query parameters must already be percent-encoded; nothing here encodes.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::protocol::http::connection::Connection;
use crate::protocol::http::headers::Headers;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => *s,
        }
    }

    /// Methods whose requests announce a length even when the body is empty.
    fn expects_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

/// Mutable request builder: method, target, query, headers, body.
///
/// Add query parameters and headers, optionally set a body, then call `send(conn, close_after)`.
/// Caller-supplied headers always win: Host, Content-Length and Connection are only added when
/// the caller did not set them.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: Bytes,
}

impl RequestBuilder {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Append an (already encoded) query parameter.
    pub fn query(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Append a header. Names repeat if added twice.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(&mut self, data: impl Into<Bytes>) -> &mut Self {
        self.body = data.into();
        self
    }

    /// Set body from a slice (copied).
    pub fn body_slice(&mut self, data: &[u8]) -> &mut Self {
        self.body = Bytes::copy_from_slice(data);
        self
    }

    /// Request target: path plus encoded query string.
    pub fn target(&self) -> String {
        let mut target = self.path.clone();
        let mut sep = if target.contains('?') { '&' } else { '?' };
        for (name, value) in &self.query {
            target.push(sep);
            target.push_str(name);
            target.push('=');
            target.push_str(value);
            sep = '&';
        }
        target
    }

    /// Serialize the request. `host` fills in a Host header when the caller set none;
    /// `close_after` adds `Connection: close` under the same rule.
    pub fn to_bytes(&self, host: Option<&str>, close_after: bool) -> Bytes {
        let mut out = BytesMut::with_capacity(256 + self.body.len());
        put_line(&mut out, &[self.method.as_str(), " ", &self.target(), " HTTP/1.1"]);
        if !self.headers.contains("Host") {
            if let Some(host) = host {
                put_line(&mut out, &["Host: ", host]);
            }
        }
        for (name, value) in self.headers.iter() {
            put_line(&mut out, &[name, ": ", value]);
        }
        let wants_length = !self.body.is_empty() || self.method.expects_body();
        if wants_length
            && !self.headers.contains("Content-Length")
            && !self.headers.contains("Transfer-Encoding")
        {
            put_line(&mut out, &["Content-Length: ", &self.body.len().to_string()]);
        }
        if close_after && !self.headers.contains("Connection") {
            put_line(&mut out, &["Connection: close"]);
        }
        out.put_slice(b"\r\n");
        out.put_slice(&self.body);
        out.freeze()
    }

    /// Write the request to `conn`. Returns false, without writing anything, when the connection
    /// is closing or closed. With `close_after` an orderly close follows the write.
    pub fn send<C: Connection + ?Sized>(&self, conn: &mut C, close_after: bool) -> bool {
        if !conn.is_writable() {
            debug!(method = self.method.as_str(), path = %self.path, "connection not writable, request dropped");
            return false;
        }
        let bytes = self.to_bytes(conn.host(), close_after);
        debug!(method = self.method.as_str(), path = %self.path, len = bytes.len(), close_after, "sending request");
        conn.write(bytes);
        if close_after {
            conn.request_close();
        }
        true
    }
}

/// One-shot form of `RequestBuilder::send`.
pub fn send<C: Connection + ?Sized>(
    conn: &mut C,
    method: Method,
    target_uri: &str,
    query_params: &[(&str, &str)],
    headers: &Headers,
    body: &[u8],
    close_after: bool,
) -> bool {
    let mut request = RequestBuilder::new(method, target_uri);
    for (name, value) in query_params {
        request.query(*name, *value);
    }
    request.headers = headers.clone();
    request.body_slice(body);
    request.send(conn, close_after)
}

fn put_line(out: &mut BytesMut, parts: &[&str]) {
    for part in parts {
        out.put_slice(part.as_bytes());
    }
    out.put_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sink {
        written: Vec<u8>,
        closing: bool,
        closed: bool,
    }

    impl Connection for Sink {
        fn is_writable(&self) -> bool {
            !self.closing && !self.closed
        }

        fn write(&mut self, data: Bytes) {
            self.written.extend_from_slice(&data);
        }

        fn request_close(&mut self) {
            self.closing = true;
        }

        fn host(&self) -> Option<&str> {
            Some("example.com")
        }
    }

    fn text(sink: &Sink) -> String {
        String::from_utf8(sink.written.clone()).unwrap()
    }

    #[test]
    fn get_with_query() {
        let mut sink = Sink::default();
        let mut req = RequestBuilder::new(Method::Get, "/search");
        req.query("q", "rust%20lang").query("page", "2");
        assert!(req.send(&mut sink, false));
        assert_eq!(
            text(&sink),
            "GET /search?q=rust%20lang&page=2 HTTP/1.1\r\nHost: example.com\r\n\r\n"
        );
        assert!(!sink.closing);
    }

    #[test]
    fn query_appends_to_existing_query() {
        let mut req = RequestBuilder::new(Method::Get, "/a?x=1");
        req.query("y", "");
        assert_eq!(req.target(), "/a?x=1&y=");
    }

    #[test]
    fn post_body_gets_length() {
        let mut sink = Sink::default();
        let headers: Headers = [("Content-Type", "text/plain")].into_iter().collect();
        assert!(send(&mut sink, Method::Post, "/upload", &[], &headers, b"hello", false));
        assert_eq!(
            text(&sink),
            "POST /upload HTTP/1.1\r\nHost: example.com\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello"
        );
    }

    #[test]
    fn empty_post_announces_zero_length() {
        let mut req = RequestBuilder::new(Method::Post, "/");
        req.header("Host", "h");
        let bytes = req.to_bytes(None, false);
        assert_eq!(&bytes[..], b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn caller_headers_are_not_overridden() {
        let mut sink = Sink::default();
        let mut req = RequestBuilder::new(Method::Put, "/x");
        req.header("host", "other.test:8080")
            .header("Content-Length", "3")
            .header("Connection", "keep-alive")
            .body_slice(b"abc");
        assert!(req.send(&mut sink, true));
        assert_eq!(
            text(&sink),
            "PUT /x HTTP/1.1\r\nhost: other.test:8080\r\nContent-Length: 3\r\nConnection: keep-alive\r\n\r\nabc"
        );
        assert!(sink.closing);
    }

    #[test]
    fn transfer_encoding_suppresses_length() {
        let mut req = RequestBuilder::new(Method::Post, "/");
        req.header("Transfer-Encoding", "chunked")
            .body_slice(b"3\r\nabc\r\n0\r\n\r\n");
        let bytes = req.to_bytes(None, false);
        assert!(!String::from_utf8_lossy(&bytes).contains("Content-Length"));
    }

    #[test]
    fn close_after_adds_connection_close() {
        let mut sink = Sink::default();
        let req = RequestBuilder::new(Method::Delete, "/item/7");
        assert!(req.send(&mut sink, true));
        assert!(text(&sink).ends_with("Connection: close\r\n\r\n"));
        assert!(sink.closing);
    }

    #[test]
    fn not_writable_has_no_side_effects() {
        let mut sink = Sink {
            closing: true,
            ..Sink::default()
        };
        let req = RequestBuilder::new(Method::Get, "/");
        assert!(!req.send(&mut sink, true));
        assert!(sink.written.is_empty());
        sink.closing = false;
        sink.closed = true;
        assert!(!send(&mut sink, Method::Get, "/", &[], &Headers::new(), b"", false));
        assert!(sink.written.is_empty());
    }
}
