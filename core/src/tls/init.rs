/*
 * init.rs
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

//! Process-wide, exactly-once TLS library initialization.
//!
//! The first factory constructed installs the ring crypto provider as the process default and
//! registers a teardown to run at process exit. Concurrent first callers block until that
//! finishes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once, PoisonError};

use rustls::crypto::CryptoProvider;
use tracing::{debug, info, warn};

/// Runs an initialization body at most once until `reset`. Callers arriving while the body runs
/// wait for it to finish. A body that panics leaves the gate closed for the next caller to retry.
#[derive(Debug, Default)]
pub struct OneTimeInit {
    done: Mutex<bool>,
    runs: AtomicUsize,
}

impl OneTimeInit {
    pub const fn new() -> Self {
        Self {
            done: Mutex::new(false),
            runs: AtomicUsize::new(0),
        }
    }

    /// Run `init` unless it already ran. Returns true if this call ran it.
    pub fn call_once(&self, init: impl FnOnce()) -> bool {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        if *done {
            return false;
        }
        init();
        self.runs.fetch_add(1, Ordering::SeqCst);
        *done = true;
        true
    }

    pub fn is_done(&self) -> bool {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How many times the body has executed.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Re-arm the gate. For test isolation only.
    pub fn reset(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

static TLS_LIBRARY: OneTimeInit = OneTimeInit::new();
static TEARDOWN_REGISTRATION: Once = Once::new();

/// Initialize the TLS library if no factory has done so yet, and return the crypto provider all
/// contexts are built with.
pub fn ensure_initialized() -> Arc<CryptoProvider> {
    TLS_LIBRARY.call_once(initialize);
    provider()
}

/// Number of times the process-wide initialization body has run.
pub fn initialization_count() -> usize {
    TLS_LIBRARY.runs()
}

/// Re-arm process-wide initialization so a test can observe it again. The exit teardown is
/// still registered only once.
#[doc(hidden)]
pub fn reset_for_tests() {
    TLS_LIBRARY.reset();
}

fn initialize() {
    info!("Initializing TLS library...");
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("process default crypto provider already installed");
    }
    TEARDOWN_REGISTRATION.call_once(|| {
        // SAFETY: `teardown` is a plain extern "C" function without captured state.
        if unsafe { libc::atexit(teardown) } != 0 {
            warn!("could not register TLS teardown at process exit");
        }
    });
}

extern "C" fn teardown() {
    info!("Uninitializing TLS library...");
}

fn provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn body_runs_once() {
        let gate = OneTimeInit::new();
        let mut calls = 0;
        assert!(gate.call_once(|| calls += 1));
        assert!(!gate.call_once(|| calls += 1));
        assert_eq!(calls, 1);
        assert_eq!(gate.runs(), 1);
        assert!(gate.is_done());
    }

    #[test]
    fn concurrent_callers_wait_for_first() {
        let gate = Arc::new(OneTimeInit::new());
        let finished = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let finished = finished.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    gate.call_once(|| {
                        thread::sleep(Duration::from_millis(20));
                        finished.store(1, Ordering::SeqCst);
                    });
                    // Whoever returns must see the init body completed
                    assert_eq!(finished.load(Ordering::SeqCst), 1);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(gate.runs(), 1);
    }

    #[test]
    fn reset_rearms() {
        let gate = OneTimeInit::new();
        gate.call_once(|| {});
        gate.reset();
        assert!(!gate.is_done());
        assert!(gate.call_once(|| {}));
        assert_eq!(gate.runs(), 2);
    }

    #[test]
    fn panicking_body_can_be_retried() {
        let gate = Arc::new(OneTimeInit::new());
        let g = gate.clone();
        let r = thread::spawn(move || {
            g.call_once(|| panic!("init failed"));
        })
        .join();
        assert!(r.is_err());
        assert!(!gate.is_done());
        assert!(gate.call_once(|| {}));
    }

    #[test]
    fn provider_available_after_init() {
        let provider = ensure_initialized();
        assert!(!provider.cipher_suites.is_empty());
        assert!(initialization_count() >= 1);
    }
}
