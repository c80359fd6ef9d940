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

//! Client-role TLS context factory.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;
use tracing::{info, warn};

use crate::config::NetConfig;
use crate::tls::error::TlsBootstrapError;
use crate::tls::trust::TrustAnchors;
use crate::tls::{TlsContext, TlsContextFactory, TlsSession, PROTOCOL_VERSIONS};

/// Factory for client-role sessions.
///
/// With `verify_peer` the server's chain must lead to one of the trust anchors. Without it any
/// certificate is accepted, though handshake signatures are still checked.
#[derive(Debug)]
pub struct ClientTlsContextFactory {
    base: TlsContextFactory,
    config: Arc<ClientConfig>,
    verify_peer: bool,
}

impl ClientTlsContextFactory {
    pub fn new(verify_peer: bool, trust_anchors: &TrustAnchors) -> Result<Self, TlsBootstrapError> {
        let provider = TlsContextFactory::initialize();
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(PROTOCOL_VERSIONS)
            .map_err(|e| TlsBootstrapError::ContextAllocation(e.to_string()))?;

        let mut config = if verify_peer {
            let roots = trust_anchors.load()?;
            info!(anchors = roots.len(), "TLS peer verification enabled");
            builder.with_root_certificates(roots).with_no_client_auth()
        } else {
            warn!("TLS peer verification disabled; any server certificate is accepted");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
                .with_no_client_auth()
        };
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        let config = Arc::new(config);
        Ok(Self {
            base: TlsContextFactory::new(TlsContext::client(config.clone())),
            config,
            verify_peer,
        })
    }

    /// Trust anchors as configured in `config`.
    pub fn from_config(verify_peer: bool, config: &NetConfig) -> Result<Self, TlsBootstrapError> {
        Self::new(verify_peer, &config.trust_anchors())
    }

    pub fn create_session(
        &self,
        server_name: ServerName<'static>,
    ) -> Result<TlsSession<'_>, rustls::Error> {
        self.base.create_session(Some(server_name))
    }

    /// Async connector over this factory's context.
    pub fn connector(&self) -> TlsConnector {
        TlsConnector::from(self.config.clone())
    }

    pub fn context(&self) -> &TlsContext {
        self.base.context()
    }

    pub fn verifies_peer(&self) -> bool {
        self.verify_peer
    }
}

#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
