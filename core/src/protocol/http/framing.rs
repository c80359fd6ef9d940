/*
 * framing.rs
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

//! Response body framing: where does the entity end?

use crate::protocol::http::error::ProtocolError;
use crate::protocol::http::request::Method;
use crate::protocol::http::response::ResponseHeaders;

/// How the end of a response body is determined. Resolved once per message, after the headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    /// Content-Length (or no body at all when 0).
    Known(u64),
    /// Transfer-Encoding: chunked.
    Chunked,
    /// Body runs until the peer closes the connection.
    UntilClose,
}

impl FramingMode {
    /// Derive the framing mode from a complete response head.
    ///
    /// 1xx, 204 and 304 responses never carry a body. A `chunked` transfer-coding wins over any
    /// Content-Length. Repeated Content-Length fields must agree.
    pub fn resolve(response: &ResponseHeaders) -> Result<FramingMode, ProtocolError> {
        Self::resolve_for_request(response, None)
    }

    /// As `resolve`, knowing the method of the request being answered. A response to HEAD has
    /// no body whatever its headers announce.
    pub fn resolve_for_request(
        response: &ResponseHeaders,
        method: Option<Method>,
    ) -> Result<FramingMode, ProtocolError> {
        if method == Some(Method::Head)
            || response.is_interim()
            || response.code == 204
            || response.code == 304
        {
            return Ok(FramingMode::Known(0));
        }
        let headers = &response.headers;
        if headers.has_token("Transfer-Encoding", "chunked") {
            return Ok(FramingMode::Chunked);
        }
        let mut length: Option<u64> = None;
        for value in headers.get_all("Content-Length") {
            let value = value.trim();
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ProtocolError::InvalidContentLength(value.to_string()));
            }
            let n: u64 = value
                .parse()
                .map_err(|_| ProtocolError::InvalidContentLength(value.to_string()))?;
            match length {
                Some(prev) if prev != n => {
                    return Err(ProtocolError::InvalidContentLength(value.to_string()));
                }
                _ => length = Some(n),
            }
        }
        Ok(match length {
            Some(n) => FramingMode::Known(n),
            None => FramingMode::UntilClose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16, headers: &[(&str, &str)]) -> ResponseHeaders {
        let mut r = ResponseHeaders::new(code);
        for (k, v) in headers {
            r.headers.append(*k, *v);
        }
        r
    }

    #[test]
    fn content_length() {
        let r = response(200, &[("Content-Length", "42")]);
        assert_eq!(FramingMode::resolve(&r), Ok(FramingMode::Known(42)));
        let r = response(200, &[("content-length", "0")]);
        assert_eq!(FramingMode::resolve(&r), Ok(FramingMode::Known(0)));
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let r = response(200, &[("Content-Length", "10"), ("Transfer-Encoding", "CHUNKED")]);
        assert_eq!(FramingMode::resolve(&r), Ok(FramingMode::Chunked));
    }

    #[test]
    fn neither_header_means_until_close() {
        let r = response(200, &[("Content-Type", "text/html")]);
        assert_eq!(FramingMode::resolve(&r), Ok(FramingMode::UntilClose));
    }

    #[test]
    fn head_response_has_no_body() {
        let r = response(200, &[("Content-Length", "5")]);
        assert_eq!(
            FramingMode::resolve_for_request(&r, Some(Method::Head)),
            Ok(FramingMode::Known(0))
        );
        assert_eq!(
            FramingMode::resolve_for_request(&r, Some(Method::Get)),
            Ok(FramingMode::Known(5))
        );
    }

    #[test]
    fn bodyless_statuses() {
        for code in [100, 204, 304] {
            let r = response(code, &[("Transfer-Encoding", "chunked")]);
            assert_eq!(FramingMode::resolve(&r), Ok(FramingMode::Known(0)));
        }
    }

    #[test]
    fn bad_content_length() {
        for value in ["", "-1", "12a", "99999999999999999999999"] {
            let r = response(200, &[("Content-Length", value)]);
            assert!(matches!(
                FramingMode::resolve(&r),
                Err(ProtocolError::InvalidContentLength(_))
            ));
        }
        let r = response(200, &[("Content-Length", "5"), ("Content-Length", "6")]);
        assert!(FramingMode::resolve(&r).is_err());
        let r = response(200, &[("Content-Length", "5"), ("Content-Length", "5")]);
        assert_eq!(FramingMode::resolve(&r), Ok(FramingMode::Known(5)));
    }

    #[test]
    fn deterministic() {
        let r = response(200, &[("Content-Length", "7")]);
        assert_eq!(FramingMode::resolve(&r), FramingMode::resolve(&r));
    }
}
