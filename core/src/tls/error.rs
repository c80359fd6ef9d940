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

//! TLS context construction errors.

use std::io;
use std::path::{Path, PathBuf};

/// Failure while building a TLS context. Construction never yields a partially usable factory.
#[derive(Debug, thiserror::Error)]
pub enum TlsBootstrapError {
    /// The context could not be allocated (resource exhaustion, or the crypto provider rejected
    /// the requested protocol setup).
    #[error("could not allocate TLS context: {0}")]
    ContextAllocation(String),

    #[error("cannot load certificate chain {path}: {reason}")]
    CertificateLoad { path: PathBuf, reason: String },

    #[error("cannot load private key {path}: {reason}")]
    KeyLoad { path: PathBuf, reason: String },

    #[error("private key {private_key} does not match certificate {certificate}")]
    KeyMismatch {
        certificate: PathBuf,
        private_key: PathBuf,
    },

    #[error("cannot load trust anchors from {location}: {reason}")]
    TrustStoreLoad { location: String, reason: String },
}

impl TlsBootstrapError {
    /// True for transient resource pressure, as opposed to a configuration mistake.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, TlsBootstrapError::ContextAllocation(_))
    }

    /// Map a file read error; out-of-memory becomes `ContextAllocation`, anything else goes
    /// through `other`.
    pub(crate) fn from_io(
        error: io::Error,
        path: &Path,
        other: impl FnOnce(PathBuf, String) -> TlsBootstrapError,
    ) -> TlsBootstrapError {
        if error.kind() == io::ErrorKind::OutOfMemory {
            TlsBootstrapError::ContextAllocation(format!("{}: {}", path.display(), error))
        } else {
            other(path.to_path_buf(), error.to_string())
        }
    }
}
