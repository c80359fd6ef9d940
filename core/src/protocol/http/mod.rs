/*
 * mod.rs
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

//! HTTP/1.1 client with push-parsed responses.
//!
//! - Callback-based response API: a `ResponseHandler` receives the head once, then body bytes
//!   with their offset in the entity, then completion.
//! - Buffers: `bytes` crate (BytesMut for the receive buffer, Bytes for outgoing requests).
//! - Framing (`FramingMode`) is resolved once per response from status and headers: a known
//!   length, chunked transfer coding, or until the peer closes.
//! - Pipelined responses on a persistent connection are parsed back to back.

mod error;
mod framing;
mod handler;
mod headers;
mod request;
mod response;

pub mod h1;

pub use error::{ClientError, ProtocolError};
pub use framing::FramingMode;
pub use handler::ResponseHandler;
pub use headers::Headers;
pub use request::{send, Method, RequestBuilder};
pub use response::{ResponseHeaders, Version};

pub mod client;
pub mod connection;

pub use client::HttpClient;
pub use connection::{Connection, HttpConnection, HttpStream, StreamConnection};
