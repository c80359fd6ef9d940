/*
 * trust.rs
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

//! Trust anchors for peer verification.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rustls::RootCertStore;
use tracing::{debug, info};

use crate::tls::error::TlsBootstrapError;

/// Where trust anchors come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchors {
    /// Every PEM certificate found in the files of a directory (not recursive).
    Directory(PathBuf),
    /// The platform store, falling back to the bundled Mozilla roots when it is empty.
    Platform,
}

impl TrustAnchors {
    pub fn load(&self) -> Result<RootCertStore, TlsBootstrapError> {
        match self {
            TrustAnchors::Directory(dir) => load_directory(dir),
            TrustAnchors::Platform => Ok(platform_roots()),
        }
    }
}

fn load_directory(dir: &Path) -> Result<RootCertStore, TlsBootstrapError> {
    info!("Loading trust anchors from {}", dir.display());
    let trust_error = |path: PathBuf, reason: String| TlsBootstrapError::TrustStoreLoad {
        location: path.display().to_string(),
        reason,
    };
    let entries = fs::read_dir(dir).map_err(|e| TlsBootstrapError::from_io(e, dir, trust_error))?;

    let mut store = RootCertStore::empty();
    let mut ignored = 0;
    for entry in entries {
        let path = entry
            .map_err(|e| TlsBootstrapError::from_io(e, dir, trust_error))?
            .path();
        if !path.is_file() {
            continue;
        }
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        // Non-PEM files simply yield nothing
        let certs: Vec<_> = rustls_pemfile::certs(&mut BufReader::new(file))
            .filter_map(Result::ok)
            .collect();
        let (_, skipped) = store.add_parsable_certificates(certs);
        ignored += skipped;
    }

    if store.is_empty() {
        return Err(TlsBootstrapError::TrustStoreLoad {
            location: dir.display().to_string(),
            reason: "no usable certificates".to_string(),
        });
    }
    debug!(anchors = store.len(), ignored, "trust anchors loaded");
    Ok(store)
}

/// Platform native certs first, then webpki-roots as fallback.
fn platform_roots() -> RootCertStore {
    let mut store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (_, skipped) = store.add_parsable_certificates(certs);
            if skipped > 0 {
                debug!(skipped, "ignored unparsable platform certificates");
            }
        }
        Err(e) => debug!(error = %e, "platform trust store unavailable"),
    }
    if store.is_empty() {
        store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }
    store
}
