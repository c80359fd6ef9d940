/*
 * connection.rs
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

//! Connection collaborator: the `Connection` trait the client writes through, and a tokio
//! driver over one TCP or TLS stream that feeds received bytes to the client.

use bytes::{Bytes, BytesMut};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tracing::{debug, warn};

use crate::config::NetConfig;
use crate::protocol::http::client::HttpClient;
use crate::protocol::http::error::ClientError;
use crate::protocol::http::h1::{ParserOptions, ParserState, ResponseParser};
use crate::protocol::http::handler::ResponseHandler;
use crate::protocol::http::request::RequestBuilder;
use crate::tls::ClientTlsContextFactory;

/// Write side of a transport as seen by the HTTP client.
pub trait Connection {
    /// False once a close was requested or the connection is gone.
    fn is_writable(&self) -> bool;

    /// Queue bytes for the peer.
    fn write(&mut self, data: Bytes);

    /// Close in an orderly way once queued bytes are flushed. Not revocable; repeated calls are
    /// harmless.
    fn request_close(&mut self);

    /// Authority to put in a Host header, if known.
    fn host(&self) -> Option<&str> {
        None
    }
}

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(TokioTlsStream<TcpStream>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Outgoing queue and close state of an `HttpConnection`.
#[derive(Debug)]
pub struct StreamConnection {
    host: String,
    outgoing: BytesMut,
    close_requested: bool,
    write_shut_down: bool,
    peer_closed: bool,
}

impl StreamConnection {
    fn new(host: String) -> Self {
        Self {
            host,
            outgoing: BytesMut::with_capacity(4096),
            close_requested: false,
            write_shut_down: false,
            peer_closed: false,
        }
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Bytes queued but not yet written to the stream.
    pub fn pending(&self) -> usize {
        self.outgoing.len()
    }
}

impl Connection for StreamConnection {
    fn is_writable(&self) -> bool {
        !self.close_requested && !self.write_shut_down && !self.peer_closed
    }

    fn write(&mut self, data: Bytes) {
        self.outgoing.extend_from_slice(&data);
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn host(&self) -> Option<&str> {
        Some(&self.host)
    }
}

/// HTTP/1.1 connection: holds the stream and drives the read loop. Queue requests with `send`,
/// then `read_response` or `run` to flush and process the replies.
pub struct HttpConnection<H> {
    stream: HttpStream,
    client: HttpClient<StreamConnection, H>,
    eof: bool,
    /// Responses already reported by `read_response`.
    returned: u64,
    keep_alive_timeout: Option<Duration>,
}

impl<H: ResponseHandler> HttpConnection<H> {
    /// Connect to `host:port`, optionally performing a TLS handshake with the given client context.
    pub async fn connect(
        host: &str,
        port: u16,
        tls: Option<&ClientTlsContextFactory>,
        handler: H,
        config: &NetConfig,
    ) -> Result<Self, ClientError> {
        let addr = format!("{}:{}", host, port);
        let tcp = timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ClientError::ConnectTimeout)??;
        debug!(%addr, tls = tls.is_some(), "connected");

        let secure = tls.is_some();
        let stream = match tls {
            Some(factory) => {
                let server_name = ServerName::try_from(host.to_string())
                    .map_err(|_| ClientError::InvalidServerName(host.to_string()))?;
                let tls = factory.connector().connect(server_name, tcp).await?;
                HttpStream::Tls(tls)
            }
            None => HttpStream::Plain(tcp),
        };
        let host_header = if (secure && port != 443) || (!secure && port != 80) {
            format!("{}:{}", host, port)
        } else {
            host.to_string()
        };
        let mut conn = Self::new(stream, host_header, handler, config.parser_options());
        conn.set_keep_alive_timeout(config.keep_alive_timeout);
        Ok(conn)
    }

    /// Wrap an already-connected stream. `host` is used for the Host header.
    pub fn new(stream: HttpStream, host: String, handler: H, options: ParserOptions) -> Self {
        Self {
            stream,
            client: HttpClient::with_options(StreamConnection::new(host), handler, options),
            eof: false,
            returned: 0,
            keep_alive_timeout: None,
        }
    }

    /// Bound each wait for server bytes. When it expires on an idle connection the connection is
    /// closed in an orderly way; with a response still due it is a `ReadTimeout`.
    pub fn set_keep_alive_timeout(&mut self, keep_alive_timeout: Option<Duration>) {
        self.keep_alive_timeout = keep_alive_timeout;
    }

    /// Queue a request. Returns false if the connection is closing or closed.
    pub fn send(&mut self, request: &RequestBuilder, close_after: bool) -> bool {
        self.client.send_request(request, close_after)
    }

    /// Write queued bytes; after a requested close, shut down the write side once drained.
    pub async fn flush(&mut self) -> Result<(), ClientError> {
        let conn = self.client.connection_mut();
        if !conn.outgoing.is_empty() && !conn.write_shut_down {
            let data = conn.outgoing.split();
            self.stream.write_all(&data).await?;
            self.stream.flush().await?;
        }
        if conn.close_requested && !conn.write_shut_down {
            conn.write_shut_down = true;
            debug!("shutting down write side");
            self.stream.shutdown().await?;
        }
        Ok(())
    }

    /// Flush, then read until a response not yet reported here has completed. Responses that
    /// completed during an earlier read are reported one per call without reading. Returns false
    /// if the peer closed or parsing stopped first.
    pub async fn read_response(&mut self) -> Result<bool, ClientError> {
        self.flush().await?;
        loop {
            if self.client.parser().completed_messages() > self.returned {
                self.returned += 1;
                return Ok(true);
            }
            if self.eof || self.client.parser().is_halted() {
                return Ok(false);
            }
            self.read_once().await?;
        }
    }

    /// Flush, then read until the peer closes or parsing stops.
    pub async fn run(&mut self) -> Result<(), ClientError> {
        self.flush().await?;
        while !self.eof && !self.client.parser().is_halted() {
            self.read_once().await?;
        }
        Ok(())
    }

    async fn read_once(&mut self) -> Result<(), ClientError> {
        let mut tmp = [0u8; 8192];
        let read = match self.keep_alive_timeout {
            Some(limit) => match timeout(limit, self.stream.read(&mut tmp)).await {
                Ok(read) => read,
                Err(_) => return self.on_read_timeout(limit).await,
            },
            None => self.stream.read(&mut tmp).await,
        };
        let n = match read {
            Ok(n) => n,
            // TLS peers that skip close_notify
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
            Err(e) => return Err(e.into()),
        };
        let result = if n == 0 {
            debug!("peer closed connection");
            self.eof = true;
            self.client.connection_mut().peer_closed = true;
            self.client.on_half_close()
        } else {
            self.client.on_bytes_available(&tmp[..n])
        };
        match result {
            Ok(()) => self.flush().await,
            Err(e) => {
                // The client requested close; shut down the write side before reporting
                if let Err(flush_error) = self.flush().await {
                    debug!(%flush_error, "shutdown after protocol error failed");
                }
                Err(e.into())
            }
        }
    }

    async fn on_read_timeout(&mut self, limit: Duration) -> Result<(), ClientError> {
        let parser = self.client.parser();
        let idle = parser.state() == ParserState::AwaitingStatusLine
            && parser.buffered() == 0
            && parser.outstanding_requests() == 0;
        self.client.connection_mut().request_close();
        self.eof = true;
        if idle {
            debug!(?limit, "closing idle connection");
            return self.flush().await;
        }
        warn!(?limit, "timed out waiting for response");
        if let Err(flush_error) = self.flush().await {
            debug!(%flush_error, "shutdown after read timeout failed");
        }
        Err(ClientError::ReadTimeout(limit))
    }

    pub fn is_closed(&self) -> bool {
        self.eof
    }

    pub fn client(&self) -> &HttpClient<StreamConnection, H> {
        &self.client
    }

    pub fn parser(&self) -> &ResponseParser<H> {
        self.client.parser()
    }

    pub fn handler(&self) -> &H {
        self.client.handler()
    }

    pub fn handler_mut(&mut self) -> &mut H {
        self.client.handler_mut()
    }

    pub fn into_handler(self) -> H {
        self.client.into_parts().1
    }
}
