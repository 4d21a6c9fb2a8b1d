//! Response framing behind a uniform send/flush pair.
//!
//! The framer starts buffered: status line and header bytes accumulate in
//! the output buffer and reach the transport as plain writes. At the header
//! terminator [`ResponseFramer::send_header`] promotes the framer to RFC
//! 7230 chunked framing; from then on every drain of the output buffer is
//! one chunk, and the final flush appends the zero-length chunk. The largest
//! chunk emitted is the buffer capacity.

use crate::config::HTTP_BUFFER_LENGTH;
use crate::connection::SendCallback;
use crate::util::{format_hex, CRLF};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum TransferMode {
    Buffered,
    Chunked,
}

pub struct ResponseFramer {
    mode: TransferMode,
    buffer: [u8; HTTP_BUFFER_LENGTH],
    buffer_idx: usize,
}

impl ResponseFramer {
    pub fn new() -> Self {
        Self {
            mode: TransferMode::Buffered,
            buffer: [0; HTTP_BUFFER_LENGTH],
            buffer_idx: 0,
        }
    }

    /// Appends bytes, draining the output buffer whenever it fills.
    pub fn send<C>(&mut self, context: &mut C, send: SendCallback<C>, data: &[u8]) {
        for &b in data {
            if self.buffer_idx == HTTP_BUFFER_LENGTH {
                self.drain(context, send);
            }
            self.buffer[self.buffer_idx] = b;
            self.buffer_idx += 1;
        }
    }

    /// Drains whatever is buffered. In chunked mode this also emits the
    /// zero-length terminating chunk, so it is called once, at the end of
    /// the response.
    pub fn flush<C>(&mut self, context: &mut C, send: SendCallback<C>) {
        if self.buffer_idx > 0 {
            self.drain(context, send);
        }
        if self.mode == TransferMode::Chunked {
            emit_chunk(context, send, &[]);
        }
    }

    /// Terminates the header block and promotes the body to chunked
    /// framing: appends the Transfer-Encoding header and the empty line,
    /// drains, and switches backends.
    pub fn send_header<C>(&mut self, context: &mut C, send: SendCallback<C>) {
        self.send(context, send, b"Transfer-Encoding: chunked\r\n");
        self.send(context, send, CRLF);
        self.flush(context, send);
        self.mode = TransferMode::Chunked;
    }

    fn drain<C>(&mut self, context: &mut C, send: SendCallback<C>) {
        match self.mode {
            TransferMode::Buffered => write_all(context, send, &self.buffer[..self.buffer_idx]),
            TransferMode::Chunked => emit_chunk(context, send, &self.buffer[..self.buffer_idx]),
        }
        self.buffer_idx = 0;
    }
}

impl Default for ResponseFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// One chunk: uppercase hex size, CRLF, data, CRLF. Empty data produces the
/// terminating chunk.
fn emit_chunk<C>(context: &mut C, send: SendCallback<C>, data: &[u8]) {
    let mut size = [0u8; 16];
    let len = format_hex(data.len(), &mut size);
    write_all(context, send, &size[..len]);
    write_all(context, send, CRLF);
    write_all(context, send, data);
    write_all(context, send, CRLF);
}

/// Drives the transport callback until every byte has been accepted. The
/// embedder blocks for backpressure; a callback that keeps returning 0 will
/// spin here by contract.
fn write_all<C>(context: &mut C, send: SendCallback<C>, mut data: &[u8]) {
    while !data.is_empty() {
        let accepted = send(context, data);
        data = &data[accepted.min(data.len())..];
    }
}

// Tests

#[cfg(test)]
fn sink(out: &mut Vec<u8>, data: &[u8]) -> usize {
    out.extend_from_slice(data);
    data.len()
}

#[cfg(test)]
fn trickle(out: &mut Vec<u8>, data: &[u8]) -> usize {
    match data.first() {
        Some(&b) => {
            out.push(b);
            1
        }
        None => 0,
    }
}

#[test]
fn buffered_bytes_stay_until_flush() {
    let mut out = Vec::new();
    let mut framer = ResponseFramer::new();
    framer.send(&mut out, sink, b"HTTP/1.1 200 OK\r\n");
    assert!(out.is_empty());
    framer.flush(&mut out, sink);
    assert_eq!(b"HTTP/1.1 200 OK\r\n".to_vec(), out);
}

#[test]
fn promotion_appends_transfer_encoding_and_empty_line() {
    let mut out = Vec::new();
    let mut framer = ResponseFramer::new();
    framer.send(&mut out, sink, b"X: y\r\n");
    framer.send_header(&mut out, sink);
    assert_eq!(b"X: y\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec(), out);

    framer.send(&mut out, sink, b"hi");
    framer.flush(&mut out, sink);
    assert_eq!(
        b"X: y\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nhi\r\n0\r\n\r\n".to_vec(),
        out
    );
}

#[test]
fn body_larger_than_buffer_splits_into_chunks() {
    let mut out = Vec::new();
    let mut framer = ResponseFramer::new();
    framer.send_header(&mut out, sink);
    out.clear();

    framer.send(&mut out, sink, &[b'a'; 300]);
    framer.flush(&mut out, sink);

    let mut expected = Vec::new();
    expected.extend_from_slice(b"100\r\n");
    expected.extend_from_slice(&[b'a'; 256]);
    expected.extend_from_slice(b"\r\n2C\r\n");
    expected.extend_from_slice(&[b'a'; 44]);
    expected.extend_from_slice(b"\r\n0\r\n\r\n");
    assert_eq!(expected, out);
}

#[test]
fn partial_transport_writes_are_redriven() {
    let mut full = Vec::new();
    let mut framer = ResponseFramer::new();
    framer.send(&mut full, sink, b"HTTP/1.1 200 OK\r\n");
    framer.send_header(&mut full, sink);
    framer.send(&mut full, sink, b"hello world");
    framer.flush(&mut full, sink);

    let mut slow = Vec::new();
    let mut framer = ResponseFramer::new();
    framer.send(&mut slow, trickle, b"HTTP/1.1 200 OK\r\n");
    framer.send_header(&mut slow, trickle);
    framer.send(&mut slow, trickle, b"hello world");
    framer.flush(&mut slow, trickle);

    assert_eq!(full, slow);
}

#[test]
fn flush_of_empty_buffered_framer_sends_nothing() {
    let mut out = Vec::new();
    let mut framer = ResponseFramer::new();
    framer.flush(&mut out, sink);
    assert!(out.is_empty());
}
