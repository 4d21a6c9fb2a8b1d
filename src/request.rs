//! The request parse state machine.
//!
//! Each state consumes zero or more bytes, possibly transitions, and
//! returns how many bytes it consumed; the driver loop in
//! [`Connection::input`] re-invokes the current state until the chunk is
//! exhausted. Lexing is delegated byte-by-byte to the search and compare
//! engines, and everything parsed lands in the parameter table, so a
//! request may arrive split at any byte boundary.

use crate::compare::{CompareEngine, CompareResult};
use crate::connection::{Connection, ContentArea, SharedArea, State};
use crate::error::{ErrorInfo, HttpStatusCode};
use crate::parsers::parse_content_length;
use crate::search::{SearchEngine, SearchResult};
use bstr::ByteSlice;
use log::{trace, warn};

/// Request methods this parser recognizes, in the ascending byte order the
/// matcher requires. [`HttpMethod`] mirrors the positions.
pub const METHODS: [&[u8]; 8] = [
    b"CONNECT",
    b"DELETE",
    b"GET",
    b"HEAD",
    b"OPTIONS",
    b"POST",
    b"PUT",
    b"TRACE",
];

/// A recognized request method.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HttpMethod {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Post,
    Put,
    Trace,
}

impl HttpMethod {
    pub(crate) fn from_index(idx: usize) -> HttpMethod {
        match idx {
            0 => HttpMethod::Connect,
            1 => HttpMethod::Delete,
            2 => HttpMethod::Get,
            3 => HttpMethod::Head,
            4 => HttpMethod::Options,
            5 => HttpMethod::Post,
            6 => HttpMethod::Put,
            _ => HttpMethod::Trace,
        }
    }
}

const HTTP_VERSION: &[u8] = b"HTTP/1.1\r\n";
const HEADER_END: &[u8] = b"\r\n";
const URL_ENCODED_FORM: &[u8] = b"application/x-www-form-urlencoded";

impl<'a, C> Connection<'a, C> {
    pub(crate) fn run_state(&mut self, data: &[u8]) -> usize {
        match self.state {
            State::InitMethodSearch => self.init_method_search(),
            State::ParseMethod => self.parse_method(data),
            State::PostMethod => self.post_method(data),
            State::DetectUri => self.detect_uri(data),
            State::ParseAbsPath => self.parse_abs_path(data),
            State::InitParamEngine => self.init_param_engine(),
            State::ParseResourceEnding => self.parse_resource_ending(data),
            State::ParseUrlEncodedFormName => self.parse_form_name(data),
            State::ParseUrlEncodedFormValue => self.parse_form_value(data),
            State::ParseHttpVersion => self.parse_http_version(data),
            State::CheckHeaderEnd => self.check_header_end(data),
            State::ParseParameterName => self.parse_parameter_name(data),
            State::ParseParameterValue => self.parse_parameter_value(data),
            State::AnalyzeEntity => self.analyze_entity(),
            State::ParseUrlEncodedEntityName => self.parse_entity_name(data),
            State::ParseUrlEncodedEntityValue => self.parse_entity_value(data),
            State::CallResource => self.call_resource(),
            State::CallErrorCallback => self.call_error_callback(data),
        }
    }

    /// Transitions and performs the entry action of the target state.
    /// Self-loops never come through here, so entry actions run exactly
    /// once per entry.
    fn set_state(&mut self, next: State) {
        match next {
            State::ParseAbsPath => {
                self.shared = SharedArea::Search(SearchEngine::new(self.resources.len()));
            }
            State::ParseHttpVersion | State::CheckHeaderEnd | State::ParseParameterValue => {
                if let SharedArea::Parse(ce) = &mut self.shared {
                    ce.reset();
                }
            }
            State::CallResource => {
                self.shared = SharedArea::Content(ContentArea::new(None));
            }
            _ => {}
        }
        self.state = next;
    }

    /// The error router: records the status, arms the framer for the error
    /// callback, and leaves the triggering byte unconsumed.
    fn mark_error(&mut self, status: HttpStatusCode) {
        warn!("request rejected: {} {}", status.code(), status.reason());
        self.shared = SharedArea::Content(ContentArea::new(Some(ErrorInfo { status })));
        self.state = State::CallErrorCallback;
    }

    fn init_method_search(&mut self) -> usize {
        self.shared = SharedArea::Search(SearchEngine::new(METHODS.len()));
        self.set_state(State::ParseMethod);
        0
    }

    fn parse_method(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        let result = match &mut self.shared {
            SharedArea::Search(se) => se.search(input, self.params.scratch_mut(), |idx| METHODS[idx]),
            _ => {
                self.mark_error(HttpStatusCode::ServerFault);
                return 0;
            }
        };
        match result {
            SearchResult::Ongoing => 1,
            SearchResult::Found(idx) => {
                self.method_idx = idx;
                self.set_state(State::PostMethod);
                1
            }
            SearchResult::NotFound | SearchResult::BufferExceeded => {
                self.mark_error(HttpStatusCode::NotImplemented);
                0
            }
        }
    }

    fn post_method(&mut self, data: &[u8]) -> usize {
        match data.first().copied() {
            Some(b' ') => {
                self.set_state(State::DetectUri);
                1
            }
            Some(_) => {
                self.mark_error(HttpStatusCode::BadRequest);
                0
            }
            None => 0,
        }
    }

    fn detect_uri(&mut self, data: &[u8]) -> usize {
        match data.first().copied() {
            // abs_path, by far the common case. The byte is left for the
            // path matcher.
            Some(b'/') => self.set_state(State::ParseAbsPath),
            // "*" and authority-form targets are not served here.
            Some(_) => self.mark_error(HttpStatusCode::NotImplemented),
            None => {}
        }
        0
    }

    fn parse_abs_path(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        let resources = self.resources;
        let result = match &mut self.shared {
            SharedArea::Search(se) => {
                se.search(input, self.params.scratch_mut(), |idx| resources[idx].name)
            }
            _ => {
                self.mark_error(HttpStatusCode::ServerFault);
                return 0;
            }
        };
        match result {
            SearchResult::Ongoing => 1,
            SearchResult::Found(idx) => {
                self.resource_idx = idx;
                self.set_state(State::InitParamEngine);
                1
            }
            SearchResult::NotFound => {
                self.mark_error(HttpStatusCode::NotFound);
                0
            }
            SearchResult::BufferExceeded => {
                self.mark_error(HttpStatusCode::UriTooLong);
                0
            }
        }
    }

    /// The path has been identified; the scratch space it occupied is
    /// reclaimed for query, header and form parameters.
    fn init_param_engine(&mut self) -> usize {
        self.params.reset();
        self.shared = SharedArea::Parse(CompareEngine::new());
        self.set_state(State::ParseResourceEnding);
        0
    }

    fn parse_resource_ending(&mut self, data: &[u8]) -> usize {
        match data.first().copied() {
            Some(b' ') => {
                self.set_state(State::ParseHttpVersion);
                1
            }
            Some(b'?') => {
                self.params.add_name();
                self.set_state(State::ParseUrlEncodedFormName);
                1
            }
            Some(_) => {
                self.mark_error(HttpStatusCode::BadRequest);
                0
            }
            None => 0,
        }
    }

    fn parse_form_name(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        match input {
            b'=' => {
                self.params.add_char(0);
                self.params.add_value();
                self.set_state(State::ParseUrlEncodedFormValue);
                1
            }
            // A name with no value ends the query; the slot stays
            // incomplete and invisible to lookup.
            b' ' => {
                self.params.add_char(0);
                self.set_state(State::ParseResourceEnding);
                0
            }
            _ => {
                self.params.add_char(input);
                1
            }
        }
    }

    fn parse_form_value(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        match input {
            b'&' => {
                self.params.add_char(0);
                self.params.add_name();
                self.set_state(State::ParseUrlEncodedFormName);
                1
            }
            b' ' => {
                self.params.add_char(0);
                self.set_state(State::ParseResourceEnding);
                0
            }
            _ => {
                self.params.add_char(input);
                1
            }
        }
    }

    fn parse_http_version(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        let result = match &self.shared {
            SharedArea::Parse(ce) => ce.compare(input, HTTP_VERSION),
            _ => {
                self.mark_error(HttpStatusCode::ServerFault);
                return 0;
            }
        };
        match result {
            CompareResult::Match => {
                self.set_state(State::CheckHeaderEnd);
                1
            }
            CompareResult::Ongoing => {
                if let SharedArea::Parse(ce) = &mut self.shared {
                    ce.increment();
                }
                1
            }
            CompareResult::NotMatch => {
                self.mark_error(HttpStatusCode::VersionNotSupported);
                0
            }
        }
    }

    fn check_header_end(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        let result = match &self.shared {
            SharedArea::Parse(ce) => ce.compare(input, HEADER_END),
            _ => {
                self.mark_error(HttpStatusCode::ServerFault);
                return 0;
            }
        };
        match result {
            // Empty line: the header block is over.
            CompareResult::Match => {
                self.set_state(State::AnalyzeEntity);
                1
            }
            CompareResult::Ongoing => {
                if let SharedArea::Parse(ce) = &mut self.shared {
                    ce.increment();
                }
                1
            }
            // This byte starts a header field; it is left for the name
            // state.
            CompareResult::NotMatch => {
                self.params.add_name();
                self.set_state(State::ParseParameterName);
                0
            }
        }
    }

    fn parse_parameter_name(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        if input == b':' {
            self.params.add_char(0);
            self.params.add_value();
            self.set_state(State::ParseParameterValue);
            1
        } else {
            match self.params.add_char(input) {
                crate::table::StoreResult::BufferFull => {
                    self.mark_error(HttpStatusCode::HeaderFieldsTooLarge);
                    0
                }
                _ => 1,
            }
        }
    }

    fn parse_parameter_value(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        let result = match &self.shared {
            SharedArea::Parse(ce) => ce.compare(input, HEADER_END),
            _ => {
                self.mark_error(HttpStatusCode::ServerFault);
                return 0;
            }
        };
        match result {
            CompareResult::Match => {
                self.params.add_char(0);
                self.set_state(State::CheckHeaderEnd);
                1
            }
            CompareResult::Ongoing => {
                if let SharedArea::Parse(ce) = &mut self.shared {
                    ce.increment();
                }
                1
            }
            CompareResult::NotMatch => {
                if crate::util::is_lws(input) {
                    // Linear whitespace is dropped, not folded.
                    1
                } else {
                    match self.params.add_char(input) {
                        crate::table::StoreResult::BufferFull => {
                            self.mark_error(HttpStatusCode::HeaderFieldsTooLarge);
                            0
                        }
                        _ => 1,
                    }
                }
            }
        }
    }

    /// Decides, from the stored headers alone, whether a form body follows.
    /// Runs without input so the decision is not delayed to the next chunk.
    fn analyze_entity(&mut self) -> usize {
        let is_form = self
            .params
            .get_nocase("Content-Type")
            .map(|ct| ct.eq_ignore_ascii_case(URL_ENCODED_FORM));
        let length = self.params.get_nocase("Content-Length").map(parse_content_length);
        match is_form {
            None | Some(false) => self.set_state(State::CallResource),
            Some(true) => match length {
                Some(n) if n > 0 => {
                    self.content_length = n;
                    self.params.add_name();
                    self.set_state(State::ParseUrlEncodedEntityName);
                }
                Some(_) => self.mark_error(HttpStatusCode::BadRequest),
                None => self.mark_error(HttpStatusCode::LengthRequired),
            },
        }
        0
    }

    fn parse_entity_name(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        if self.content_length == 1 {
            // Final body byte: keep it, terminate, and dispatch.
            self.params.add_char(input);
            self.params.add_char(0);
            self.set_state(State::CallResource);
            1
        } else if input == b'=' {
            self.params.add_char(0);
            self.params.add_value();
            self.content_length -= 1;
            self.set_state(State::ParseUrlEncodedEntityValue);
            1
        } else {
            self.params.add_char(input);
            self.content_length -= 1;
            1
        }
    }

    fn parse_entity_value(&mut self, data: &[u8]) -> usize {
        let input = match data.first() {
            Some(&b) => b,
            None => return 0,
        };
        if self.content_length == 1 {
            self.params.add_char(input);
            self.params.add_char(0);
            self.set_state(State::CallResource);
            1
        } else if input == b'&' {
            self.params.add_char(0);
            self.params.add_name();
            self.content_length -= 1;
            self.set_state(State::ParseUrlEncodedEntityName);
            1
        } else {
            self.params.add_char(input);
            self.content_length -= 1;
            1
        }
    }

    fn call_resource(&mut self) -> usize {
        trace!(
            "dispatching {}",
            self.resources[self.resource_idx].name.as_bstr()
        );
        let callback = self.resources[self.resource_idx].callback;
        let _ = callback(self);
        self.set_state(State::InitMethodSearch);
        0
    }

    /// Reports the recorded error and discards whatever is left of the
    /// chunk; those bytes belonged to the rejected request.
    fn call_error_callback(&mut self, data: &[u8]) -> usize {
        let info = match &self.shared {
            SharedArea::Content(area) => area.error,
            _ => None,
        };
        if let Some(info) = info {
            let on_error = self.on_error;
            on_error(self, &info);
        }
        self.set_state(State::InitMethodSearch);
        data.len()
    }
}
