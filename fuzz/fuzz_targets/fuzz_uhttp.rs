#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate uhttp;

use uhttp::{Connection, ErrorInfo, HttpStatusCode, ResourceEntry};

fn discard(_: &mut (), data: &[u8]) -> usize {
    data.len()
}

fn serve(conn: &mut Connection<()>) -> HttpStatusCode {
    conn.set_status(HttpStatusCode::Ok);
    conn.set_header("Content-Type", "text/plain");
    conn.send_header();
    conn.send_body("ok");
    conn.flush();
    HttpStatusCode::Ok
}

fn reject(conn: &mut Connection<()>, error: &ErrorInfo) {
    conn.set_status(error.status);
    conn.send_header();
    conn.flush();
}

fuzz_target!(|data: &[u8]| {
    let resources = [
        ResourceEntry { name: &b"/"[..], callback: serve },
        ResourceEntry { name: &b"/a"[..], callback: serve },
        ResourceEntry { name: &b"/form"[..], callback: serve },
    ];
    let mut conn = Connection::new(discard, reject, &resources, ());

    // The first byte picks the chunk size so split points get explored
    // along with the request bytes themselves.
    if let Some((&first, rest)) = data.split_first() {
        let step = usize::from(first % 17) + 1;
        for chunk in rest.chunks(step) {
            conn.input(chunk);
        }
    }
});
