/*
 * response.rs
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

//! HTTP response head: status line and header fields.

use crate::protocol::http::error::ProtocolError;
use crate::protocol::http::headers::Headers;

/// Protocol version from the status line (`HTTP/<major>.<minor>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_1_0: Version = Version { major: 1, minor: 0 };
    pub const HTTP_1_1: Version = Version { major: 1, minor: 1 };
}

/// Status line plus headers of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    pub headers: Headers,
}

impl ResponseHeaders {
    pub fn new(code: u16) -> Self {
        Self {
            version: Version::HTTP_1_1,
            code,
            reason: String::new(),
            headers: Headers::new(),
        }
    }

    pub fn with_reason(code: u16, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Self::new(code)
        }
    }

    /// Parse `HTTP/1.1 200 OK` (reason optional).
    pub fn parse_status_line(line: &str) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::MalformedStatusLine(line.to_string());
        let mut parts = line.splitn(3, ' ');
        let version = parts.next().and_then(parse_version).ok_or_else(malformed)?;
        let code = parts.next().ok_or_else(malformed)?;
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let code: u16 = code.parse().map_err(|_| malformed())?;
        if code < 100 {
            return Err(malformed());
        }
        let reason = parts.next().unwrap_or("").trim().to_string();
        Ok(Self {
            version,
            code,
            reason,
            headers: Headers::new(),
        })
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// 1xx.
    pub fn is_interim(&self) -> bool {
        (100..200).contains(&self.code)
    }
}

fn parse_version(token: &str) -> Option<Version> {
    let digits = token.strip_prefix("HTTP/")?;
    let (major, minor) = digits.split_once('.')?;
    if major.len() != 1 || minor.len() != 1 {
        return None;
    }
    Some(Version {
        major: major.parse().ok()?,
        minor: minor.parse().ok()?,
    })
}
