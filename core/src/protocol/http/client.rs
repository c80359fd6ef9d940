/*
 * client.rs
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

//! HTTP client: one connection bound to one response parser.
//!
//! The connection collaborator pushes received bytes and half-close notifications in; requests
//! go out through the same connection.

use tracing::warn;

use crate::protocol::http::connection::Connection;
use crate::protocol::http::error::ProtocolError;
use crate::protocol::http::h1::{ParserOptions, ResponseParser};
use crate::protocol::http::handler::ResponseHandler;
use crate::protocol::http::headers::Headers;
use crate::protocol::http::request::{self, Method, RequestBuilder};

/// HTTP/1.1 client session over any `Connection`. Single-threaded: all parsing and handler
/// callbacks run inline in `on_bytes_available` / `on_half_close`.
pub struct HttpClient<C, H> {
    connection: C,
    parser: ResponseParser<H>,
}

impl<C: Connection, H: ResponseHandler> HttpClient<C, H> {
    pub fn new(connection: C, handler: H) -> Self {
        Self::with_options(connection, handler, ParserOptions::default())
    }

    pub fn with_options(connection: C, handler: H, options: ParserOptions) -> Self {
        Self {
            connection,
            parser: ResponseParser::with_options(handler, options),
        }
    }

    /// Bytes arrived from the peer. A protocol error closes the connection and is returned.
    pub fn on_bytes_available(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let result = self.parser.feed(data);
        if let Err(e) = &result {
            self.abort(e);
        }
        result
    }

    /// The peer shut down its sending side. Ends a read-until-close body normally; an
    /// incomplete message is a protocol error and closes the connection.
    pub fn on_half_close(&mut self) -> Result<(), ProtocolError> {
        let result = self.parser.notify_half_close();
        if let Err(e) = &result {
            self.abort(e);
        }
        result
    }

    /// Serialize and write a request. Returns false if the connection is not writable. A written
    /// request is recorded with the parser so its response is framed by method.
    pub fn send(
        &mut self,
        method: Method,
        target_uri: &str,
        query_params: &[(&str, &str)],
        headers: &Headers,
        body: &[u8],
        close_after: bool,
    ) -> bool {
        let sent = request::send(
            &mut self.connection,
            method,
            target_uri,
            query_params,
            headers,
            body,
            close_after,
        );
        if sent {
            self.parser.expect_response(method);
        }
        sent
    }

    pub fn send_request(&mut self, request: &RequestBuilder, close_after: bool) -> bool {
        let sent = request.send(&mut self.connection, close_after);
        if sent {
            self.parser.expect_response(request.method);
        }
        sent
    }

    fn abort(&mut self, error: &ProtocolError) {
        warn!(%error, "closing connection after protocol error");
        self.connection.request_close();
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    pub fn parser(&self) -> &ResponseParser<H> {
        &self.parser
    }

    pub fn handler(&self) -> &H {
        self.parser.handler()
    }

    pub fn handler_mut(&mut self) -> &mut H {
        self.parser.handler_mut()
    }

    pub fn into_parts(self) -> (C, H) {
        (self.connection, self.parser.into_handler())
    }
}
