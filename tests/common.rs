#![allow(dead_code)]
// Shared harness for the integration tests: an embedder context that
// records everything the core hands it, callback sets for the standard
// resource tables, and a chunked-framing decoder for response validation.

use nom::bytes::complete::{tag, take, take_while1};
use nom::IResult;
use uhttp::{Connection, ErrorInfo, HttpStatusCode, ResourceEntry};

pub type Conn<'a> = Connection<'a, TestContext>;

#[derive(Default)]
pub struct TestContext {
    /// Bytes handed to the transport, in order.
    pub sent: Vec<u8>,
    /// Resource callbacks invoked, by path.
    pub hits: Vec<&'static str>,
    /// Statuses delivered to the error callback.
    pub errors: Vec<HttpStatusCode>,
    /// Parameter values captured inside a callback, while the request was
    /// still current.
    pub snapshots: Vec<(String, String)>,
}

pub fn transmit(ctx: &mut TestContext, data: &[u8]) -> usize {
    ctx.sent.extend_from_slice(data);
    data.len()
}

pub fn record_error(conn: &mut Conn, error: &ErrorInfo) {
    conn.context_mut().errors.push(error.status);
}

/// Error callback that phrases a minimal response before recording.
pub fn phrase_error(conn: &mut Conn, error: &ErrorInfo) {
    conn.set_status(error.status);
    conn.send_header();
    conn.flush();
    conn.context_mut().errors.push(error.status);
}

fn note(conn: &mut Conn, name: &'static str) -> HttpStatusCode {
    conn.context_mut().hits.push(name);
    HttpStatusCode::Ok
}

pub fn hit_aaa(conn: &mut Conn) -> HttpStatusCode {
    note(conn, "/aaa")
}

pub fn hit_bbb(conn: &mut Conn) -> HttpStatusCode {
    note(conn, "/bbb")
}

pub fn hit_index(conn: &mut Conn) -> HttpStatusCode {
    note(conn, "/index.html")
}

/// Records the Host header as seen from inside the callback.
pub fn snapshot_host(conn: &mut Conn) -> HttpStatusCode {
    let host = conn
        .parameter("Host")
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .unwrap_or_default();
    conn.context_mut().snapshots.push(("Host".into(), host));
    note(conn, "/index.html")
}

/// The standard sorted resource table.
pub fn table<'a>() -> [ResourceEntry<'a, TestContext>; 3] {
    [
        ResourceEntry { name: b"/aaa", callback: hit_aaa },
        ResourceEntry { name: b"/bbb", callback: hit_bbb },
        ResourceEntry { name: b"/index.html", callback: hit_index },
    ]
}

pub fn connect<'a>(resources: &'a [ResourceEntry<'a, TestContext>]) -> Conn<'a> {
    let _ = env_logger::builder().is_test(true).try_init();
    Connection::new(transmit, record_error, resources, TestContext::default())
}

pub fn feed_chunks(conn: &mut Conn, data: &[u8], size: usize) {
    for chunk in data.chunks(size) {
        conn.input(chunk);
    }
}

fn chunk(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, size) = take_while1(|b: u8| b.is_ascii_hexdigit())(input)?;
    let (input, _) = tag("\r\n")(input)?;
    let size = usize::from_str_radix(std::str::from_utf8(size).unwrap(), 16).unwrap();
    let (input, data) = take(size)(input)?;
    let (input, _) = tag("\r\n")(input)?;
    Ok((input, data))
}

/// Decodes an RFC 7230 chunked body up to and including the terminating
/// zero-length chunk. Returns the concatenated data and whatever follows
/// the terminator.
pub fn decode_chunked(mut input: &[u8]) -> (Vec<u8>, &[u8]) {
    let mut body = Vec::new();
    loop {
        let (rest, data) = chunk(input).expect("well-formed chunk");
        input = rest;
        if data.is_empty() {
            return (body, input);
        }
        body.extend_from_slice(data);
    }
}

/// Splits a raw response at the header terminator.
pub fn split_response(raw: &[u8]) -> (&[u8], &[u8]) {
    let pos = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator present");
    (&raw[..pos + 4], &raw[pos + 4..])
}
