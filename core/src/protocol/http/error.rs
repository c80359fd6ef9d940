/*
 * error.rs
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

//! HTTP protocol errors (malformed wire data, premature termination).

use crate::protocol::http::h1::ParserState;
use crate::tls::TlsBootstrapError;

/// Malformed wire data or premature end of a response. Always connection-fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// No line terminator within the configured limit.
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("more than {limit} header lines")]
    TooManyHeaders { limit: usize },

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("invalid chunk size: {0:?}")]
    InvalidChunkSize(String),

    /// Chunk data not followed by CRLF.
    #[error("chunk data not terminated by CRLF")]
    MissingChunkTerminator,

    /// Peer closed the connection in the middle of a message.
    #[error("connection closed by peer while {state:?}")]
    UnexpectedEof { state: ParserState },
}

/// Failure of a driven client connection.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Tls(#[from] TlsBootstrapError),

    #[error("TCP connect timed out")]
    ConnectTimeout,

    #[error("server sent nothing for {0:?} while a response was due")]
    ReadTimeout(std::time::Duration),

    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),
}
