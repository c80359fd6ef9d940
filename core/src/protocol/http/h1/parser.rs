/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length, chunked or
//! read-until-close).

use std::collections::VecDeque;

use bytes::Buf;
use bytes::BytesMut;
use tracing::{debug, trace};

use crate::protocol::http::error::ProtocolError;
use crate::protocol::http::framing::FramingMode;
use crate::protocol::http::handler::ResponseHandler;
use crate::protocol::http::request::Method;
use crate::protocol::http::response::ResponseHeaders;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingStatusLine,
    AwaitingHeaders,
    ReadingIdentityBody,
    /// Identity body without a length; only a half-close ends it.
    ReadingUntilClose,
    AwaitingChunkHeader,
    ReadingChunkData,
    ReadingChunkedTrailer,
    /// Transient: completes the message, then loops to AwaitingStatusLine or stops.
    EndOfEntity,
}

/// Parser tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Parse further (pipelined) responses after the first one ends.
    pub persistent: bool,
    /// Longest status, header, chunk-size or trailer line accepted.
    pub max_line_length: usize,
    pub max_header_count: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            persistent: true,
            max_line_length: 8 * 1024,
            max_header_count: 100,
        }
    }
}

/// Push parser for HTTP/1.1 responses. Owns the connection's receive buffer; feed bytes via
/// `feed` and the handler is invoked as soon as complete tokens are available.
pub struct ResponseParser<H> {
    handler: H,
    options: ParserOptions,
    buf: BytesMut,
    state: ParserState,
    head: ResponseHeaders,
    /// Bytes left in the identity body or the current chunk.
    remaining: u64,
    /// Entity offset of the next body byte.
    offset: u64,
    halted: bool,
    error: Option<ProtocolError>,
    completed: u64,
    /// Methods of requests still waiting for a final response, oldest first.
    outstanding: VecDeque<Method>,
}

impl<H: ResponseHandler> ResponseParser<H> {
    pub fn new(handler: H) -> Self {
        Self::with_options(handler, ParserOptions::default())
    }

    pub fn with_options(handler: H, options: ParserOptions) -> Self {
        Self {
            handler,
            options,
            buf: BytesMut::with_capacity(8192),
            state: ParserState::AwaitingStatusLine,
            head: ResponseHeaders::new(0),
            remaining: 0,
            offset: 0,
            halted: false,
            error: None,
            completed: 0,
            outstanding: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// True once parsing has stopped: end of a non-persistent response, half-close or error.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The error that stopped the parser, if any.
    pub fn error(&self) -> Option<&ProtocolError> {
        self.error.as_ref()
    }

    /// Number of responses fully delivered so far.
    pub fn completed_messages(&self) -> u64 {
        self.completed
    }

    /// Bytes received but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Forget all state (e.g. after reconnecting); the handler is kept.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = ParserState::AwaitingStatusLine;
        self.head = ResponseHeaders::new(0);
        self.remaining = 0;
        self.offset = 0;
        self.halted = false;
        self.error = None;
        self.outstanding.clear();
    }

    /// Record a request sent on this connection, so its response is framed accordingly. Responses
    /// arrive in request order.
    pub fn expect_response(&mut self, method: Method) {
        self.outstanding.push_back(method);
    }

    /// Requests recorded with `expect_response` whose final response has not started yet.
    pub fn outstanding_requests(&self) -> usize {
        self.outstanding.len()
    }

    /// Append bytes to the receive buffer and consume as much as possible.
    ///
    /// After an error no further events are delivered and every later call returns the same
    /// error.
    pub fn feed(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if self.halted {
            if !data.is_empty() {
                trace!(len = data.len(), "discarding bytes after end of response");
            }
            return Ok(());
        }
        self.buf.extend_from_slice(data);
        self.advance().map_err(|e| self.fail(e))
    }

    /// The peer closed its sending side. Completes a read-until-close body; anywhere inside a
    /// message this is a protocol error.
    pub fn notify_half_close(&mut self) -> Result<(), ProtocolError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if self.halted {
            return Ok(());
        }
        match self.state {
            ParserState::ReadingUntilClose => {
                self.end_of_entity();
            }
            ParserState::AwaitingStatusLine
                if self.buf.iter().all(|&b| b == b'\r' || b == b'\n') => {}
            state => {
                return Err(self.fail(ProtocolError::UnexpectedEof { state }));
            }
        }
        self.halted = true;
        self.buf.clear();
        Ok(())
    }

    fn fail(&mut self, error: ProtocolError) -> ProtocolError {
        debug!(%error, state = ?self.state, "response parse failed");
        self.error = Some(error.clone());
        self.halted = true;
        self.buf.clear();
        error
    }

    fn advance(&mut self) -> Result<(), ProtocolError> {
        loop {
            match self.state {
                ParserState::AwaitingStatusLine => {
                    let line = match self.take_line()? {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        continue;
                    }
                    let text = std::str::from_utf8(&line).map_err(|_| {
                        ProtocolError::MalformedStatusLine(String::from_utf8_lossy(&line).into_owned())
                    })?;
                    self.head = ResponseHeaders::parse_status_line(text)?;
                    self.state = ParserState::AwaitingHeaders;
                }
                ParserState::AwaitingHeaders => {
                    let line = match self.take_line()? {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.finish_head()?;
                        continue;
                    }
                    if self.head.headers.len() >= self.options.max_header_count {
                        return Err(ProtocolError::TooManyHeaders {
                            limit: self.options.max_header_count,
                        });
                    }
                    let (name, value) = parse_header_line(&line)?;
                    self.head.headers.append(name, value);
                }
                ParserState::ReadingIdentityBody => {
                    if self.remaining == 0 {
                        self.state = ParserState::EndOfEntity;
                        continue;
                    }
                    if self.buf.is_empty() {
                        return Ok(());
                    }
                    let n = self.remaining.min(self.buf.len() as u64) as usize;
                    self.deliver(n);
                    self.remaining -= n as u64;
                }
                ParserState::ReadingUntilClose => {
                    if !self.buf.is_empty() {
                        self.deliver(self.buf.len());
                    }
                    return Ok(());
                }
                ParserState::AwaitingChunkHeader => {
                    let line = match self.take_line()? {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    let size = parse_chunk_size(&line)?;
                    if size == 0 {
                        self.state = ParserState::ReadingChunkedTrailer;
                    } else {
                        self.remaining = size;
                        self.state = ParserState::ReadingChunkData;
                    }
                }
                ParserState::ReadingChunkData => {
                    if self.remaining > 0 {
                        if self.buf.is_empty() {
                            return Ok(());
                        }
                        let n = self.remaining.min(self.buf.len() as u64) as usize;
                        self.deliver(n);
                        self.remaining -= n as u64;
                        continue;
                    }
                    // Chunk data must be followed by its own line terminator
                    match self.buf.first() {
                        None => return Ok(()),
                        Some(b'\n') => self.buf.advance(1),
                        Some(b'\r') => {
                            if self.buf.len() < 2 {
                                return Ok(());
                            }
                            if self.buf[1] != b'\n' {
                                return Err(ProtocolError::MissingChunkTerminator);
                            }
                            self.buf.advance(2);
                        }
                        Some(_) => return Err(ProtocolError::MissingChunkTerminator),
                    }
                    self.state = ParserState::AwaitingChunkHeader;
                }
                ParserState::ReadingChunkedTrailer => {
                    let line = match self.take_line()? {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.state = ParserState::EndOfEntity;
                    } else {
                        parse_header_line(&line)?;
                    }
                }
                ParserState::EndOfEntity => {
                    self.end_of_entity();
                    if self.halted {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Header block complete: resolve framing once and announce the head.
    fn finish_head(&mut self) -> Result<(), ProtocolError> {
        // Interim responses precede the final response to the same request
        let method = if self.head.is_interim() {
            None
        } else {
            self.outstanding.pop_front()
        };
        let framing = FramingMode::resolve_for_request(&self.head, method)?;
        debug!(code = self.head.code, ?framing, "response head complete");
        self.offset = 0;
        self.handler.on_header(&self.head, framing);
        self.state = match framing {
            FramingMode::Known(0) => ParserState::EndOfEntity,
            FramingMode::Known(n) => {
                self.remaining = n;
                ParserState::ReadingIdentityBody
            }
            FramingMode::Chunked => ParserState::AwaitingChunkHeader,
            FramingMode::UntilClose => ParserState::ReadingUntilClose,
        };
        Ok(())
    }

    fn end_of_entity(&mut self) {
        self.completed += 1;
        self.handler.on_complete();
        self.remaining = 0;
        self.state = ParserState::AwaitingStatusLine;
        if !self.options.persistent {
            if !self.buf.is_empty() {
                trace!(len = self.buf.len(), "discarding bytes after end of response");
            }
            self.buf.clear();
            self.halted = true;
        }
    }

    fn deliver(&mut self, n: usize) {
        let chunk = self.buf.split_to(n);
        self.handler.on_body(self.offset, &chunk);
        self.offset += n as u64;
    }

    /// Split one line off the front of the buffer, without its terminator. LF and CRLF both end
    /// a line.
    fn take_line(&mut self) -> Result<Option<BytesMut>, ProtocolError> {
        let limit = self.options.max_line_length;
        match self.buf.iter().position(|&b| b == b'\n') {
            Some(end) => {
                let mut line = self.buf.split_to(end + 1);
                line.truncate(end);
                if line.last() == Some(&b'\r') {
                    line.truncate(end - 1);
                }
                // Limit applies to the line content, terminator excluded
                if line.len() > limit {
                    return Err(ProtocolError::LineTooLong { limit });
                }
                Ok(Some(line))
            }
            None => {
                // A trailing CR may be the first half of CRLF
                let pending = match self.buf.last() {
                    Some(b'\r') => self.buf.len() - 1,
                    _ => self.buf.len(),
                };
                if pending > limit {
                    Err(ProtocolError::LineTooLong { limit })
                } else {
                    Ok(None)
                }
            }
        }
    }
}

fn parse_header_line(line: &[u8]) -> Result<(String, String), ProtocolError> {
    let malformed = || ProtocolError::MalformedHeader(String::from_utf8_lossy(line).into_owned());
    let text = std::str::from_utf8(line).map_err(|_| malformed())?;
    // obs-fold continuation lines are rejected
    if text.starts_with(' ') || text.starts_with('\t') {
        return Err(malformed());
    }
    let (name, value) = text.split_once(':').ok_or_else(malformed)?;
    if name.is_empty() || name.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(malformed());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, ProtocolError> {
    let invalid = || ProtocolError::InvalidChunkSize(String::from_utf8_lossy(line).into_owned());
    let text = std::str::from_utf8(line).map_err(|_| invalid())?;
    let hex = text.split(';').next().unwrap_or(text).trim();
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u64::from_str_radix(hex, 16).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Header(u16, FramingMode),
        Body(u64, Vec<u8>),
        Complete,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl ResponseHandler for Recorder {
        fn on_header(&mut self, response: &ResponseHeaders, framing: FramingMode) {
            self.events.push(Event::Header(response.code, framing));
        }

        fn on_body(&mut self, offset: u64, data: &[u8]) {
            self.events.push(Event::Body(offset, data.to_vec()));
        }

        fn on_complete(&mut self) {
            self.events.push(Event::Complete);
        }
    }

    /// Merge adjacent body events, checking that each continues where the previous ended.
    fn coalesce(events: &[Event]) -> Vec<Event> {
        let mut out: Vec<Event> = Vec::new();
        for e in events {
            if let (Some(Event::Body(start, acc)), Event::Body(offset, data)) = (out.last_mut(), e) {
                assert_eq!(*start + acc.len() as u64, *offset, "offsets must be contiguous");
                acc.extend_from_slice(data);
                continue;
            }
            out.push(e.clone());
        }
        out
    }

    fn feed_whole(input: &[u8]) -> (Vec<Event>, Result<(), ProtocolError>) {
        let mut p = ResponseParser::new(Recorder::default());
        let r = p.feed(input);
        (p.into_handler().events, r)
    }

    fn feed_bytewise(input: &[u8]) -> (Vec<Event>, Result<(), ProtocolError>) {
        let mut p = ResponseParser::new(Recorder::default());
        let mut r = Ok(());
        for b in input {
            r = p.feed(std::slice::from_ref(b));
            if r.is_err() {
                break;
            }
        }
        (p.into_handler().events, r)
    }

    fn body_of(events: &[Event]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Body(_, d) => Some(d.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    const CHUNKED: &[u8] = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";

    #[test]
    fn chunked_body_reassembles() {
        let (events, r) = feed_whole(CHUNKED);
        r.unwrap();
        assert_eq!(events[0], Event::Header(200, FramingMode::Chunked));
        assert_eq!(body_of(&events), b"Wikipedia");
        assert_eq!(
            coalesce(&events),
            vec![
                Event::Header(200, FramingMode::Chunked),
                Event::Body(0, b"Wikipedia".to_vec()),
                Event::Complete,
            ]
        );
        let offsets: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Event::Body(o, _) => Some(*o),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![0, 4]);
    }

    #[test]
    fn fragmentation_does_not_change_events() {
        let inputs: [&[u8]; 5] = [
            CHUNKED,
            b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\nServer: x\r\n\r\nhello world",
            b"HTTP/1.1 204 No Content\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok",
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\na;ext=1\r\n0123456789\r\n0\r\nExpires: never\r\n\r\n",
            b"HTTP/1.0 200 OK\r\n\r\nstreaming until close",
        ];
        for input in inputs {
            let (whole, r1) = feed_whole(input);
            let (bytewise, r2) = feed_bytewise(input);
            assert_eq!(r1, r2);
            assert_eq!(coalesce(&whole), coalesce(&bytewise), "{:?}", String::from_utf8_lossy(input));
            assert_eq!(body_of(&whole), body_of(&bytewise));
        }
    }

    #[test]
    fn zero_content_length_has_no_body_events() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").unwrap();
        assert_eq!(p.state(), ParserState::AwaitingStatusLine);
        assert_eq!(
            p.handler().events,
            vec![Event::Header(200, FramingMode::Known(0)), Event::Complete]
        );
    }

    #[test]
    fn identity_body_split_across_feeds() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n0123").unwrap();
        assert_eq!(p.state(), ParserState::ReadingIdentityBody);
        p.feed(b"456789HTTP/1.1").unwrap();
        assert_eq!(p.state(), ParserState::AwaitingStatusLine);
        assert_eq!(p.buffered(), 8);
        let events = &p.handler().events;
        assert_eq!(events[1], Event::Body(0, b"0123".to_vec()));
        assert_eq!(events[2], Event::Body(4, b"456789".to_vec()));
        assert_eq!(events[3], Event::Complete);
    }

    #[test]
    fn pipelined_responses_reset_offsets() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabcHTTP/1.1 404 Not Found\r\nContent-Length: 2\r\n\r\nno")
            .unwrap();
        assert_eq!(
            p.handler().events,
            vec![
                Event::Header(200, FramingMode::Known(3)),
                Event::Body(0, b"abc".to_vec()),
                Event::Complete,
                Event::Header(404, FramingMode::Known(2)),
                Event::Body(0, b"no".to_vec()),
                Event::Complete,
            ]
        );
        assert_eq!(p.completed_messages(), 2);
    }

    #[test]
    fn non_persistent_parser_stops_after_first_response() {
        let options = ParserOptions {
            persistent: false,
            ..ParserOptions::default()
        };
        let mut p = ResponseParser::with_options(Recorder::default(), options);
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\naHTTP/1.1 200 OK\r\n\r\n").unwrap();
        assert!(p.is_halted());
        p.feed(b"more").unwrap();
        assert_eq!(p.handler().events.len(), 3);
    }

    #[test]
    fn until_close_completes_on_half_close() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nfirst ").unwrap();
        p.feed(b"second").unwrap();
        assert_eq!(p.state(), ParserState::ReadingUntilClose);
        assert_eq!(p.handler().events.len(), 3);
        p.notify_half_close().unwrap();
        assert_eq!(
            p.handler().events,
            vec![
                Event::Header(200, FramingMode::UntilClose),
                Event::Body(0, b"first ".to_vec()),
                Event::Body(6, b"second".to_vec()),
                Event::Complete,
            ]
        );
    }

    #[test]
    fn invalid_chunk_size_is_fatal() {
        let mut p = ResponseParser::new(Recorder::default());
        let r = p.feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nXYZ\r\n");
        assert!(matches!(r, Err(ProtocolError::InvalidChunkSize(_))));
        let before = p.handler().events.len();
        assert_eq!(before, 1);
        assert!(p.feed(b"4\r\nWiki\r\n0\r\n\r\n").is_err());
        assert!(p.notify_half_close().is_err());
        assert_eq!(p.handler().events.len(), before);
    }

    #[test]
    fn chunk_size_overflow_is_invalid() {
        let (_, r) = feed_whole(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n10000000000000000\r\n");
        assert!(matches!(r, Err(ProtocolError::InvalidChunkSize(_))));
    }

    #[test]
    fn missing_chunk_terminator() {
        let (_, r) = feed_whole(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nabXY");
        assert_eq!(r, Err(ProtocolError::MissingChunkTerminator));
    }

    #[test]
    fn premature_close_with_known_length() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc").unwrap();
        assert_eq!(
            p.notify_half_close(),
            Err(ProtocolError::UnexpectedEof {
                state: ParserState::ReadingIdentityBody
            })
        );
        assert!(!p.handler().events.contains(&Event::Complete));
    }

    #[test]
    fn premature_close_inside_chunked_body() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n").unwrap();
        assert!(matches!(
            p.notify_half_close(),
            Err(ProtocolError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn clean_close_between_responses() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").unwrap();
        assert_eq!(p.notify_half_close(), Ok(()));
        assert!(p.is_halted());
    }

    #[test]
    fn close_during_headers_is_an_error() {
        let mut p = ResponseParser::new(Recorder::default());
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Le").unwrap();
        assert_eq!(
            p.notify_half_close(),
            Err(ProtocolError::UnexpectedEof {
                state: ParserState::AwaitingHeaders
            })
        );
    }

    #[test]
    fn malformed_header_line() {
        let (events, r) = feed_whole(b"HTTP/1.1 200 OK\r\nno colon here\r\n\r\n");
        assert!(matches!(r, Err(ProtocolError::MalformedHeader(_))));
        assert!(events.is_empty());
        let (_, r) = feed_whole(b"HTTP/1.1 200 OK\r\nA: b\r\n folded\r\n\r\n");
        assert!(matches!(r, Err(ProtocolError::MalformedHeader(_))));
    }

    #[test]
    fn malformed_status_line() {
        let (events, r) = feed_whole(b"SMTP ready\r\n");
        assert!(matches!(r, Err(ProtocolError::MalformedStatusLine(_))));
        assert!(events.is_empty());
    }

    #[test]
    fn oversized_line_detected_without_terminator() {
        let options = ParserOptions {
            max_line_length: 16,
            ..ParserOptions::default()
        };
        let mut p = ResponseParser::with_options(Recorder::default(), options);
        p.feed(b"HTTP/1.1 200 OK\r\n").unwrap();
        assert_eq!(
            p.feed(b"X-Long: aaaaaaaaaaaaaaaaaaaaa"),
            Err(ProtocolError::LineTooLong { limit: 16 })
        );
    }

    #[test]
    fn head_response_does_not_consume_next_response() {
        let mut p = ResponseParser::new(Recorder::default());
        p.expect_response(Method::Head);
        p.expect_response(Method::Get);
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi")
            .unwrap();
        assert_eq!(
            p.handler().events,
            vec![
                Event::Header(200, FramingMode::Known(0)),
                Event::Complete,
                Event::Header(200, FramingMode::Known(2)),
                Event::Body(0, b"hi".to_vec()),
                Event::Complete,
            ]
        );
        assert_eq!(p.outstanding_requests(), 0);
    }

    #[test]
    fn interim_response_keeps_request_outstanding() {
        let mut p = ResponseParser::new(Recorder::default());
        p.expect_response(Method::Head);
        p.feed(b"HTTP/1.1 100 Continue\r\n\r\n").unwrap();
        assert_eq!(p.outstanding_requests(), 1);
        p.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n").unwrap();
        assert_eq!(p.outstanding_requests(), 0);
        assert_eq!(p.state(), ParserState::AwaitingStatusLine);
    }

    #[test]
    fn line_limit_excludes_terminator() {
        let options = ParserOptions {
            max_line_length: 17,
            ..ParserOptions::default()
        };
        // "HTTP/1.1 200 OKAY" is exactly 17 bytes
        for input in [&b"HTTP/1.1 200 OKAY\r\n"[..], &b"HTTP/1.1 200 OKAY\n"[..]] {
            let mut p = ResponseParser::with_options(Recorder::default(), options);
            p.feed(input).unwrap();
            assert_eq!(p.state(), ParserState::AwaitingHeaders);
        }
        let mut p = ResponseParser::with_options(Recorder::default(), options);
        p.feed(b"HTTP/1.1 200 OKAY\r").unwrap();
        p.feed(b"\n").unwrap();
        assert_eq!(p.state(), ParserState::AwaitingHeaders);

        let mut p = ResponseParser::with_options(Recorder::default(), options);
        assert_eq!(
            p.feed(b"HTTP/1.1 200 OKAYS\r\n"),
            Err(ProtocolError::LineTooLong { limit: 17 })
        );
    }

    #[test]
    fn too_many_headers() {
        let options = ParserOptions {
            max_header_count: 2,
            ..ParserOptions::default()
        };
        let mut p = ResponseParser::with_options(Recorder::default(), options);
        let r = p.feed(b"HTTP/1.1 200 OK\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n");
        assert_eq!(r, Err(ProtocolError::TooManyHeaders { limit: 2 }));
    }

    #[test]
    fn bare_lf_line_endings_tolerated() {
        let (events, r) = feed_whole(b"HTTP/1.1 200 OK\nTransfer-Encoding: chunked\n\n3\nabc\n0\n\n");
        r.unwrap();
        assert_eq!(body_of(&events), b"abc");
        assert_eq!(events.last(), Some(&Event::Complete));
    }

    #[test]
    fn headers_are_exposed_to_handler() {
        struct Capture(Option<ResponseHeaders>);
        impl ResponseHandler for Capture {
            fn on_header(&mut self, response: &ResponseHeaders, _framing: FramingMode) {
                self.0 = Some(response.clone());
            }
            fn on_body(&mut self, _offset: u64, _data: &[u8]) {}
        }
        let mut capture = Capture(None);
        let mut p = ResponseParser::new(&mut capture);
        p.feed(b"HTTP/1.1 301 Moved Permanently\r\nLocation: /new\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
        drop(p);
        let head = capture.0.unwrap();
        assert_eq!(head.code, 301);
        assert_eq!(head.reason, "Moved Permanently");
        assert_eq!(head.headers.get("location"), Some("/new"));
    }
}
