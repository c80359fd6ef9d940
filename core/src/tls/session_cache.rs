/*
 * session_cache.rs
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

//! Server-side session resumption cache, partitioned by session-id context.
//!
//! All server contexts in the process share one in-memory cache. Each context prefixes its keys
//! with a fixed 16-byte session-id context, so a session established under one context is never
//! resumed under another.

use std::sync::{Arc, OnceLock};

use rustls::server::{ServerSessionMemoryCache, StoresServerSessions};

pub type SessionIdContext = [u8; 16];

/// Session-id context used by server factories unless configured otherwise.
pub const DEFAULT_SESSION_ID_CONTEXT: SessionIdContext = [
    0x15, 0x74, 0xFA, 0x87, 0x85, 0x70, 0x00, 0x08, 0xD2, 0xFD, 0x47, 0xC3, 0x84, 0xE3, 0x19, 0xDD,
];

const SHARED_CACHE_SIZE: usize = 1024;

static SHARED_CACHE: OnceLock<Arc<ServerSessionMemoryCache>> = OnceLock::new();

fn shared_cache() -> Arc<dyn StoresServerSessions> {
    SHARED_CACHE
        .get_or_init(|| ServerSessionMemoryCache::new(SHARED_CACHE_SIZE))
        .clone()
}

/// Session store that scopes every key to one session-id context.
#[derive(Debug)]
pub struct ScopedSessionStore {
    context: SessionIdContext,
    inner: Arc<dyn StoresServerSessions>,
}

impl ScopedSessionStore {
    pub fn new(context: SessionIdContext, inner: Arc<dyn StoresServerSessions>) -> Self {
        Self { context, inner }
    }

    /// Scope over the process-wide cache.
    pub fn shared(context: SessionIdContext) -> Self {
        Self::new(context, shared_cache())
    }

    pub fn context(&self) -> &SessionIdContext {
        &self.context
    }

    fn scoped(&self, key: &[u8]) -> Vec<u8> {
        let mut k = Vec::with_capacity(self.context.len() + key.len());
        k.extend_from_slice(&self.context);
        k.extend_from_slice(key);
        k
    }
}

impl StoresServerSessions for ScopedSessionStore {
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> bool {
        self.inner.put(self.scoped(&key), value)
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(&self.scoped(key))
    }

    fn take(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.take(&self.scoped(key))
    }

    fn can_cache(&self) -> bool {
        self.inner.can_cache()
    }
}
