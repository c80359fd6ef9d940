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

//! TLS context factories.
//!
//! A factory owns exactly one TLS context, configured once at construction, and hands out
//! per-connection sessions that borrow it. Constructing any factory first initializes the TLS
//! library for the process (see [`init`]). Only TLS 1.2 and 1.3 are enabled.

pub mod client;
pub mod error;
pub mod init;
pub mod server;
pub mod session_cache;
pub mod trust;

pub use client::ClientTlsContextFactory;
pub use error::TlsBootstrapError;
pub use server::ServerTlsContextFactory;
pub use session_cache::{ScopedSessionStore, SessionIdContext, DEFAULT_SESSION_ID_CONTEXT};
pub use trust::TrustAnchors;

use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, ServerConfig, ServerConnection, SupportedProtocolVersion};

pub(crate) static PROTOCOL_VERSIONS: &[&SupportedProtocolVersion] =
    &[&rustls::version::TLS12, &rustls::version::TLS13];

#[derive(Debug)]
enum Role {
    Server(Arc<ServerConfig>),
    Client(Arc<ClientConfig>),
}

/// A configured TLS context. Owned by exactly one factory.
#[derive(Debug)]
pub struct TlsContext {
    role: Role,
}

impl TlsContext {
    pub(crate) fn server(config: Arc<ServerConfig>) -> Self {
        Self {
            role: Role::Server(config),
        }
    }

    pub(crate) fn client(config: Arc<ClientConfig>) -> Self {
        Self {
            role: Role::Client(config),
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self.role, Role::Server(_))
    }

    pub fn server_config(&self) -> Option<&Arc<ServerConfig>> {
        match &self.role {
            Role::Server(config) => Some(config),
            Role::Client(_) => None,
        }
    }

    pub fn client_config(&self) -> Option<&Arc<ClientConfig>> {
        match &self.role {
            Role::Client(config) => Some(config),
            Role::Server(_) => None,
        }
    }
}

/// One connection's TLS state. Cannot outlive the context it was created from.
pub struct TlsSession<'ctx> {
    context: &'ctx TlsContext,
    connection: rustls::Connection,
}

impl<'ctx> TlsSession<'ctx> {
    pub fn context(&self) -> &'ctx TlsContext {
        self.context
    }

    pub fn connection(&self) -> &rustls::Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut rustls::Connection {
        &mut self.connection
    }

    pub fn is_handshaking(&self) -> bool {
        self.connection.is_handshaking()
    }

    pub fn into_connection(self) -> rustls::Connection {
        self.connection
    }
}

/// Shared part of the server and client factories: library initialization and context
/// ownership.
#[derive(Debug)]
pub struct TlsContextFactory {
    context: TlsContext,
}

impl TlsContextFactory {
    /// Initialize the TLS library if no factory has yet. Every factory calls this before
    /// building its context.
    pub(crate) fn initialize() -> Arc<CryptoProvider> {
        init::ensure_initialized()
    }

    pub(crate) fn new(context: TlsContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &TlsContext {
        &self.context
    }

    /// New session in the context's role. Client sessions need the name of the server.
    pub(crate) fn create_session(
        &self,
        server_name: Option<ServerName<'static>>,
    ) -> Result<TlsSession<'_>, rustls::Error> {
        let connection = match &self.context.role {
            Role::Server(config) => rustls::Connection::from(ServerConnection::new(config.clone())?),
            Role::Client(config) => {
                let name = server_name.ok_or_else(|| {
                    rustls::Error::General("client session requires a server name".to_string())
                })?;
                rustls::Connection::from(ClientConnection::new(config.clone(), name)?)
            }
        };
        Ok(TlsSession {
            context: &self.context,
            connection,
        })
    }
}
