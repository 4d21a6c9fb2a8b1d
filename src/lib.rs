//! Streaming HTTP/1.1 request parsing and response framing for
//! memory-constrained servers.
//!
//! One [`Connection`] holds everything needed to parse a request and frame
//! a response, in well under a kilobyte of inline state and with no heap
//! allocation. Request bytes are fed incrementally in chunks of any size;
//! chunk boundaries need not align to protocol tokens. Once a registered
//! resource has been identified and its headers (and
//! `application/x-www-form-urlencoded` body, if any) parsed, the resource's
//! callback runs with access to the parsed parameters and to helpers that
//! frame the response, promoting the body to chunked transfer-encoding.
//!
//! The transport stays outside: bytes come in through [`Connection::input`]
//! and go out through the embedder's send callback. Each parse handles one
//! request; after the resource or error callback returns, the connection
//! re-arms for the next request on the same transport.
//!
//! ```
//! use uhttp::{Connection, HttpStatusCode, ResourceEntry};
//!
//! fn index(conn: &mut Connection<Vec<u8>>) -> HttpStatusCode {
//!     conn.set_status(HttpStatusCode::Ok);
//!     conn.set_header("Content-Type", "text/plain");
//!     conn.send_header();
//!     conn.send_body("hello");
//!     conn.flush();
//!     HttpStatusCode::Ok
//! }
//!
//! fn transmit(out: &mut Vec<u8>, data: &[u8]) -> usize {
//!     out.extend_from_slice(data);
//!     data.len()
//! }
//!
//! fn reject(_conn: &mut Connection<Vec<u8>>, _error: &uhttp::ErrorInfo) {}
//!
//! let resources = [ResourceEntry { name: b"/", callback: index }];
//! let mut conn = Connection::new(transmit, reject, &resources, Vec::new());
//! conn.input(b"GET / HTTP/1.1\r\n\r\n");
//! assert!(conn.context().starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

pub mod compare;
pub mod config;
pub mod connection;
pub mod error;
pub mod parsers;
pub mod request;
pub mod response;
pub mod search;
pub mod table;
pub mod util;

pub use connection::{
    Connection, ErrorCallback, ResourceCallback, ResourceEntry, SendCallback, State,
};
pub use error::{ErrorInfo, HttpStatusCode};
pub use request::{HttpMethod, METHODS};
