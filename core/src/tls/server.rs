/*
 * server.rs
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

//! Server-role TLS context factory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::sign::CertifiedKey;
use rustls::{InconsistentKeys, ServerConfig};
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

use crate::tls::error::TlsBootstrapError;
use crate::tls::session_cache::{ScopedSessionStore, SessionIdContext, DEFAULT_SESSION_ID_CONTEXT};
use crate::tls::trust::TrustAnchors;
use crate::tls::{TlsContext, TlsContextFactory, TlsSession, PROTOCOL_VERSIONS};

/// Factory for server-role sessions, built from a PEM certificate chain and private key.
///
/// Clients are asked for a certificate, but the handshake goes ahead without one.
#[derive(Debug)]
pub struct ServerTlsContextFactory {
    base: TlsContextFactory,
    config: Arc<ServerConfig>,
    session_id_context: SessionIdContext,
}

impl ServerTlsContextFactory {
    pub fn new(
        certificate: impl AsRef<Path>,
        private_key: impl AsRef<Path>,
    ) -> Result<Self, TlsBootstrapError> {
        Self::with_session_id_context(certificate, private_key, DEFAULT_SESSION_ID_CONTEXT)
    }

    /// As `new`, with sessions cached under `session_id_context` instead of the default.
    pub fn with_session_id_context(
        certificate: impl AsRef<Path>,
        private_key: impl AsRef<Path>,
        session_id_context: SessionIdContext,
    ) -> Result<Self, TlsBootstrapError> {
        let certificate = certificate.as_ref();
        let private_key = private_key.as_ref();
        let provider = TlsContextFactory::initialize();
        let config = Arc::new(build_config(
            &provider,
            certificate,
            private_key,
            session_id_context,
        )?);
        let base = TlsContextFactory::new(TlsContext::server(config.clone()));
        Ok(Self {
            base,
            config,
            session_id_context,
        })
    }

    pub fn create_session(&self) -> Result<TlsSession<'_>, rustls::Error> {
        self.base.create_session(None)
    }

    /// Async acceptor over this factory's context.
    pub fn acceptor(&self) -> TlsAcceptor {
        TlsAcceptor::from(self.config.clone())
    }

    pub fn context(&self) -> &TlsContext {
        self.base.context()
    }

    pub fn session_id_context(&self) -> &SessionIdContext {
        &self.session_id_context
    }
}

fn build_config(
    provider: &Arc<CryptoProvider>,
    certificate: &Path,
    private_key: &Path,
    session_id_context: SessionIdContext,
) -> Result<ServerConfig, TlsBootstrapError> {
    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(PROTOCOL_VERSIONS)
        .map_err(|e| TlsBootstrapError::ContextAllocation(e.to_string()))?;

    let roots = TrustAnchors::Platform.load()?;
    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .allow_unauthenticated()
        .build()
        .map_err(|e| TlsBootstrapError::ContextAllocation(e.to_string()))?;

    info!("Loading server certificate: {}", certificate.display());
    let certs = load_certificate_chain(certificate)?;
    info!("Loading server private key: {}", private_key.display());
    let key = load_private_key(private_key)?;
    info!("Verifying private key...");
    check_key_matches(provider, &certs, &key, certificate, private_key)?;

    let mut config = builder
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .map_err(|e| match e {
            rustls::Error::InconsistentKeys(InconsistentKeys::KeyMismatch) => {
                TlsBootstrapError::KeyMismatch {
                    certificate: certificate.to_path_buf(),
                    private_key: private_key.to_path_buf(),
                }
            }
            other => TlsBootstrapError::KeyLoad {
                path: private_key.to_path_buf(),
                reason: other.to_string(),
            },
        })?;
    config.session_storage = Arc::new(ScopedSessionStore::shared(session_id_context));
    Ok(config)
}

fn load_certificate_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsBootstrapError> {
    let cert_error = |path: PathBuf, reason: String| TlsBootstrapError::CertificateLoad { path, reason };
    let file = File::open(path).map_err(|e| TlsBootstrapError::from_io(e, path, cert_error))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsBootstrapError::from_io(e, path, cert_error))?;
    if certs.is_empty() {
        return Err(cert_error(
            path.to_path_buf(),
            "no PEM certificates found".to_string(),
        ));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsBootstrapError> {
    let key_error = |path: PathBuf, reason: String| TlsBootstrapError::KeyLoad { path, reason };
    let file = File::open(path).map_err(|e| TlsBootstrapError::from_io(e, path, key_error))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| TlsBootstrapError::from_io(e, path, key_error))?
        .ok_or_else(|| key_error(path.to_path_buf(), "no PEM private key found".to_string()))
}

/// Fails only on a definite mismatch; an inconclusive check is logged and accepted.
fn check_key_matches(
    provider: &CryptoProvider,
    certs: &[CertificateDer<'static>],
    key: &PrivateKeyDer<'static>,
    certificate: &Path,
    private_key: &Path,
) -> Result<(), TlsBootstrapError> {
    let signing_key = provider
        .key_provider
        .load_private_key(key.clone_key())
        .map_err(|e| TlsBootstrapError::KeyLoad {
            path: private_key.to_path_buf(),
            reason: e.to_string(),
        })?;
    match CertifiedKey::new(certs.to_vec(), signing_key).keys_match() {
        Ok(()) => Ok(()),
        Err(rustls::Error::InconsistentKeys(InconsistentKeys::Unknown)) => {
            warn!(
                "cannot confirm that {} matches {}",
                private_key.display(),
                certificate.display()
            );
            Ok(())
        }
        Err(_) => Err(TlsBootstrapError::KeyMismatch {
            certificate: certificate.to_path_buf(),
            private_key: private_key.to_path_buf(),
        }),
    }
}
