/*
 * tls_init.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Process-wide TLS initialization runs exactly once, however many factories
 * are constructed and from however many threads. Kept in its own test binary
 * so no other test has initialized the library first.
 *
 * Run with:
 *   cargo test -p larkspur_core --test tls_init
 */

use std::sync::{Arc, Barrier};
use std::thread;

use larkspur_core::tls::init;
use larkspur_core::tls::{ClientTlsContextFactory, TrustAnchors};

#[test]
fn concurrent_factories_initialize_once() {
    assert_eq!(init::initialization_count(), 0);

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                ClientTlsContextFactory::new(false, &TrustAnchors::Platform).is_ok()
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
    assert_eq!(init::initialization_count(), 1);

    // More factories later do not initialize again
    ClientTlsContextFactory::new(false, &TrustAnchors::Platform).unwrap();
    assert_eq!(init::initialization_count(), 1);

    // The test-only reset re-arms the gate
    init::reset_for_tests();
    ClientTlsContextFactory::new(false, &TrustAnchors::Platform).unwrap();
    assert_eq!(init::initialization_count(), 2);
}
