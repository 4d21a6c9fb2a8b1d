//! The per-connection parser aggregate and its input driver.
//!
//! One [`Connection`] parses one request at a time from an incrementally fed
//! byte stream, dispatches a resource callback once the request is
//! understood, and re-arms itself for the next request on the same
//! transport. All state is inline; the core never allocates.

use crate::compare::CompareEngine;
use crate::error::{ErrorInfo, HttpStatusCode};
use crate::request::HttpMethod;
use crate::response::ResponseFramer;
use crate::search::SearchEngine;
use crate::table::ParamTable;
use crate::util::CRLF;

/// Transport write callback. Returns the number of bytes accepted; the
/// framer re-drives the remainder, so the embedder may accept partially but
/// must eventually make progress.
pub type SendCallback<C> = fn(&mut C, &[u8]) -> usize;

/// Invoked once a registered resource has been fully identified and its
/// headers (and form body, if any) parsed. The callback emits the response
/// through the helper methods on [`Connection`].
pub type ResourceCallback<'a, C> = fn(&mut Connection<'a, C>) -> HttpStatusCode;

/// Invoked when a request is rejected. The helper methods work here too;
/// embedders typically phrase an error response and close the transport.
pub type ErrorCallback<'a, C> = fn(&mut Connection<'a, C>, &ErrorInfo);

/// One registered resource. The embedder supplies a table of these sorted
/// ascending by the byte value of `name`; the matcher depends on that order.
pub struct ResourceEntry<'a, C> {
    pub name: &'a [u8],
    pub callback: ResourceCallback<'a, C>,
}

/// The parse states. Each consumes zero or more bytes per invocation of the
/// driver loop; a state that consumes nothing always transitions, so the
/// loop makes progress.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    InitMethodSearch,
    ParseMethod,
    PostMethod,
    DetectUri,
    ParseAbsPath,
    InitParamEngine,
    ParseResourceEnding,
    ParseUrlEncodedFormName,
    ParseUrlEncodedFormValue,
    ParseHttpVersion,
    CheckHeaderEnd,
    ParseParameterName,
    ParseParameterValue,
    AnalyzeEntity,
    ParseUrlEncodedEntityName,
    ParseUrlEncodedEntityValue,
    CallResource,
    CallErrorCallback,
}

impl State {
    /// States that must run even when the current chunk is exhausted:
    /// AnalyzeEntity decides from stored headers alone, and CallResource
    /// fires the callback for a request whose final byte has already been
    /// consumed.
    pub(crate) fn work_without_input(self) -> bool {
        matches!(self, State::AnalyzeEntity | State::CallResource)
    }
}

/// Storage for the response phase: the framer, plus the pending error when
/// the phase was entered through the error router.
pub(crate) struct ContentArea {
    pub(crate) error: Option<ErrorInfo>,
    pub(crate) response: ResponseFramer,
}

impl ContentArea {
    pub(crate) fn new(error: Option<ErrorInfo>) -> Self {
        Self {
            error,
            response: ResponseFramer::new(),
        }
    }
}

/// Phase-dependent storage. Exactly one variant is live at a time and the
/// state machine re-arms it on phase transitions; no state reads a variant
/// it did not arm.
pub(crate) enum SharedArea {
    /// Request line: token matcher over the method or resource table.
    Search(SearchEngine),
    /// Headers and bodies: pattern matcher (the parameter table is always
    /// live and lives outside this area).
    Parse(CompareEngine),
    /// Resource or error callback: response framer.
    Content(ContentArea),
}

/// A single HTTP/1.1 connection. `C` is the embedder context handed to the
/// transport callback and reachable from resource callbacks.
pub struct Connection<'a, C> {
    pub(crate) shared: SharedArea,
    pub(crate) state: State,
    pub(crate) method_idx: usize,
    pub(crate) resource_idx: usize,
    pub(crate) content_length: i64,
    pub(crate) params: ParamTable,
    pub(crate) resources: &'a [ResourceEntry<'a, C>],
    pub(crate) send: SendCallback<C>,
    pub(crate) on_error: ErrorCallback<'a, C>,
    context: C,
}

impl<'a, C> Connection<'a, C> {
    /// Arms a connection. `resources` must be non-empty and sorted ascending
    /// by name; sortedness is not checked.
    pub fn new(
        send: SendCallback<C>,
        on_error: ErrorCallback<'a, C>,
        resources: &'a [ResourceEntry<'a, C>],
        context: C,
    ) -> Self {
        assert!(!resources.is_empty(), "resource table must not be empty");
        Self {
            shared: SharedArea::Search(SearchEngine::new(1)),
            state: State::InitMethodSearch,
            method_idx: 0,
            resource_idx: 0,
            content_length: 0,
            params: ParamTable::new(),
            resources,
            send,
            on_error,
            context,
        }
    }

    /// Feeds one chunk of request bytes, of any size including zero. Chunk
    /// boundaries need not align to protocol tokens. Resource and error
    /// callbacks run inline from here.
    pub fn input(&mut self, mut data: &[u8]) {
        while !data.is_empty() || self.state.work_without_input() {
            let consumed = self.run_state(data);
            data = &data[consumed.min(data.len())..];
        }
    }

    /// The method of the current request, meaningful once the request line
    /// has been parsed, i.e. inside callbacks.
    pub fn method(&self) -> HttpMethod {
        HttpMethod::from_index(self.method_idx)
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Case-insensitive lookup across headers, query parameters and form
    /// fields of the current request, in insertion order.
    pub fn parameter<K: AsRef<[u8]>>(&self, name: K) -> Option<&[u8]> {
        self.params.get_nocase(name)
    }

    /// Writes the status line for `code`.
    pub fn set_status(&mut self, code: HttpStatusCode) {
        self.emit(b"HTTP/1.1 ");
        self.emit(code.code().as_bytes());
        self.emit(b" ");
        self.emit(code.reason().as_bytes());
        self.emit(CRLF);
    }

    /// Writes one response header line.
    pub fn set_header(&mut self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        self.emit(name.as_ref());
        self.emit(b": ");
        self.emit(value.as_ref());
        self.emit(CRLF);
    }

    /// Ends the header block and promotes the response body to chunked
    /// transfer-encoding. Call after the last `set_header`.
    pub fn send_header(&mut self) {
        if let SharedArea::Content(area) = &mut self.shared {
            area.response.send_header(&mut self.context, self.send);
        }
    }

    /// Appends body bytes.
    pub fn send_body(&mut self, body: impl AsRef<[u8]>) {
        self.emit(body.as_ref());
    }

    /// Appends body bytes from a template: `%s` inserts the next entry of
    /// `params`, `%%` a literal percent sign; there are no other
    /// conversions.
    pub fn send_body_fmt(&mut self, template: impl AsRef<[u8]>, params: &[&[u8]]) {
        let mut rest = template.as_ref();
        let mut params = params.iter();
        while let Some(&b) = rest.first() {
            if b == b'%' {
                match rest.get(1).copied() {
                    Some(b's') => {
                        if let Some(param) = params.next() {
                            self.emit(param);
                        }
                    }
                    Some(b'%') => self.emit(b"%"),
                    _ => {}
                }
                rest = &rest[2.min(rest.len())..];
            } else {
                let run = rest.iter().position(|&c| c == b'%').unwrap_or(rest.len());
                self.emit(&rest[..run]);
                rest = &rest[run..];
            }
        }
    }

    /// Writes a bare CRLF.
    pub fn send_crlf(&mut self) {
        self.emit(CRLF);
    }

    /// Final flush of the response; in chunked mode this emits the
    /// terminating zero-length chunk.
    pub fn flush(&mut self) {
        if let SharedArea::Content(area) = &mut self.shared {
            area.response.flush(&mut self.context, self.send);
        }
    }

    /// Hands bytes to the framer. Inert outside the callback phase.
    fn emit(&mut self, data: &[u8]) {
        if let SharedArea::Content(area) = &mut self.shared {
            area.response.send(&mut self.context, self.send, data);
        }
    }
}
