mod common;

use common::{connect, decode_chunked, phrase_error, split_response, transmit, Conn, TestContext};
use rstest::rstest;
use uhttp::{Connection, HttpStatusCode, ResourceEntry};

fn respond_text(conn: &mut Conn) -> HttpStatusCode {
    conn.set_status(HttpStatusCode::Ok);
    conn.set_header("Content-Type", "text/plain");
    conn.send_header();
    conn.send_body("hi");
    conn.flush();
    HttpStatusCode::Ok
}

fn respond_long(conn: &mut Conn) -> HttpStatusCode {
    conn.set_status(HttpStatusCode::Ok);
    conn.send_header();
    conn.send_body(&[b'a'; 300][..]);
    conn.flush();
    HttpStatusCode::Ok
}

fn respond_templated(conn: &mut Conn) -> HttpStatusCode {
    conn.set_status(HttpStatusCode::Ok);
    conn.send_header();
    conn.send_body_fmt("Hello %s, %s%% done", &[b"world", b"100"]);
    conn.flush();
    HttpStatusCode::Ok
}

fn respond_echo(conn: &mut Conn) -> HttpStatusCode {
    let who = conn
        .parameter("who")
        .map(|v| v.to_vec())
        .unwrap_or_else(|| b"nobody".to_vec());
    conn.set_status(HttpStatusCode::Ok);
    conn.send_header();
    conn.send_body_fmt("hello %s\r\n", &[&who]);
    conn.flush();
    HttpStatusCode::Ok
}

fn resources<'a>() -> [ResourceEntry<'a, TestContext>; 4] {
    [
        ResourceEntry { name: b"/echo", callback: respond_echo },
        ResourceEntry { name: b"/hi", callback: respond_text },
        ResourceEntry { name: b"/long", callback: respond_long },
        ResourceEntry { name: b"/tpl", callback: respond_templated },
    ]
}

#[test]
fn exact_response_byte_stream() {
    let table = resources();
    let mut conn = connect(&table);
    conn.input(b"GET /hi HTTP/1.1\r\n\r\n");

    assert_eq!(
        &b"HTTP/1.1 200 OK\r\n\
           Content-Type: text/plain\r\n\
           Transfer-Encoding: chunked\r\n\
           \r\n\
           2\r\nhi\r\n0\r\n\r\n"[..],
        &conn.context().sent[..]
    );
}

#[test]
fn long_body_splits_at_the_output_buffer() {
    let table = resources();
    let mut conn = connect(&table);
    conn.input(b"GET /long HTTP/1.1\r\n\r\n");

    let (head, body) = split_response(&conn.context().sent);
    assert!(head.starts_with(b"HTTP/1.1 200 OK\r\n"));
    assert!(head.ends_with(b"Transfer-Encoding: chunked\r\n\r\n"));

    // First chunk is exactly the output buffer, the rest follows.
    assert!(body.starts_with(b"100\r\n"));
    let (decoded, rest) = decode_chunked(body);
    assert_eq!(vec![b'a'; 300], decoded);
    assert!(rest.is_empty());
}

#[test]
fn templated_body_substitutes_parameters() {
    let table = resources();
    let mut conn = connect(&table);
    conn.input(b"GET /tpl HTTP/1.1\r\n\r\n");

    let (_, body) = split_response(&conn.context().sent);
    let (decoded, _) = decode_chunked(body);
    assert_eq!(b"Hello world, 100% done".to_vec(), decoded);
}

#[test]
fn templated_body_reads_query_parameters() {
    let table = resources();
    let mut conn = connect(&table);
    conn.input(b"GET /echo?who=u HTTP/1.1\r\n\r\n");

    let (_, body) = split_response(&conn.context().sent);
    let (decoded, _) = decode_chunked(body);
    assert_eq!(b"hello u\r\n".to_vec(), decoded);
}

#[rstest]
#[case(b"GET /nope HTTP/1.1\r\n\r\n", "404 Not Found")]
#[case(b"FROB /hi HTTP/1.1\r\n\r\n", "501 Not Implemented")]
#[case(b"GET /hi HTTP/3.0\r\n\r\n", "505 Version not supported")]
#[case(b"GET\x01/hi HTTP/1.1\r\n\r\n", "400 Bad Request")]
fn error_callback_phrases_a_response(#[case] request: &[u8], #[case] status_line: &str) {
    let table = resources();
    let mut conn = Connection::new(transmit, phrase_error, &table, TestContext::default());
    conn.input(request);

    assert!(conn.context().hits.is_empty());
    let expected = format!("HTTP/1.1 {}\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n", status_line);
    assert_eq!(expected.as_bytes(), &conn.context().sent[..]);
}

#[test]
fn each_request_gets_its_own_framer() {
    let table = resources();
    let mut conn = connect(&table);
    conn.input(b"GET /hi HTTP/1.1\r\n\r\n");
    let first_len = conn.context().sent.len();
    conn.input(b"GET /hi HTTP/1.1\r\n\r\n");

    let sent = &conn.context().sent;
    assert_eq!(first_len * 2, sent.len());
    assert_eq!(&sent[..first_len], &sent[first_len..]);
    // The second response starts buffered again, not chunked.
    assert!(sent[first_len..].starts_with(b"HTTP/1.1 200 OK\r\n"));
}
