/*
 * handler.rs
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

//! HTTP response handler trait (push callbacks).
//!
//! Events per message: on_header → on_body (×n) → on_complete.

use crate::protocol::http::framing::FramingMode;
use crate::protocol::http::response::ResponseHeaders;

/// Consumer of parsed response events. The parser drives this inline, on the thread that
/// received the bytes, so implementations must not block.
///
/// Flow for one response:
/// 1. `on_header(response, framing)` once the header block is complete
/// 2. `on_body(offset, data)` for each decoded slice of the entity; offsets start at 0 and are
///    contiguous
/// 3. `on_complete()` at the logical end of the entity
///
/// For `FramingMode::UntilClose`, `on_complete` fires when the peer half-closes.
pub trait ResponseHandler {
    /// Called when the status line and headers have been parsed.
    fn on_header(&mut self, response: &ResponseHeaders, framing: FramingMode);

    /// Called for each decoded piece of the body. Data is only valid for the duration of the call.
    fn on_body(&mut self, offset: u64, data: &[u8]);

    /// Called when the entity is complete.
    fn on_complete(&mut self) {}
}

impl<H: ResponseHandler + ?Sized> ResponseHandler for &mut H {
    fn on_header(&mut self, response: &ResponseHeaders, framing: FramingMode) {
        (**self).on_header(response, framing);
    }

    fn on_body(&mut self, offset: u64, data: &[u8]) {
        (**self).on_body(offset, data);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}

impl<H: ResponseHandler + ?Sized> ResponseHandler for Box<H> {
    fn on_header(&mut self, response: &ResponseHeaders, framing: FramingMode) {
        (**self).on_header(response, framing);
    }

    fn on_body(&mut self, offset: u64, data: &[u8]) {
        (**self).on_body(offset, data);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}
