//! Incremental binary search over a sorted name table.
//!
//! The engine identifies one element of a sorted string table from a stream
//! of bytes fed one at a time, across arbitrary input chunk boundaries. Each
//! byte is appended to a scratch buffer borrowed from the caller and the
//! candidate window `[left, right]` narrows by ordinary binary search; a
//! window change rewinds the comparison cursor so the buffered prefix is
//! re-checked against the new candidate. Nothing but the scratch prefix is
//! ever buffered, and an unknown token terminates as soon as it orders
//! outside the table.
//!
//! The table accessor is a closure so the same engine matches against either
//! the method table or the embedder's resource table.

/// Result of feeding one byte to [`SearchEngine::search`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SearchResult {
    /// The buffered bytes equal the full name of the returned table index.
    Found(usize),
    /// Still narrowing; feed the next byte.
    Ongoing,
    /// No table element can match the buffered bytes.
    NotFound,
    /// The scratch buffer is full; the token cannot be identified.
    BufferExceeded,
}

#[derive(Debug)]
pub struct SearchEngine {
    left: usize,
    right: usize,
    compare_idx: usize,
    buffer_idx: usize,
}

impl SearchEngine {
    /// Arms a search over a table of `table_len` elements. The table must be
    /// non-empty and sorted ascending by byte value; sortedness is the
    /// caller's invariant and is not checked here.
    pub fn new(table_len: usize) -> Self {
        Self {
            left: 0,
            right: table_len - 1,
            compare_idx: 0,
            buffer_idx: 0,
        }
    }

    fn narrowed(&self) -> bool {
        self.left == self.right
    }

    /// Feeds one byte. `scratch` must be the same buffer on every call for
    /// the lifetime of this engine; `name_of` maps a table index to its name.
    ///
    /// Once a terminal result has been returned the caller must stop feeding.
    pub fn search<'t, F>(&mut self, input: u8, scratch: &mut [u8], name_of: F) -> SearchResult
    where
        F: Fn(usize) -> &'t [u8],
    {
        if self.buffer_idx >= scratch.len() {
            return SearchResult::BufferExceeded;
        }
        scratch[self.buffer_idx] = input;
        self.buffer_idx += 1;

        let mut result = SearchResult::Ongoing;
        while result == SearchResult::Ongoing && self.compare_idx < self.buffer_idx {
            let mid = self.left + (self.right - self.left) / 2;
            let name = name_of(mid);

            if self.compare_idx >= name.len() {
                // The buffered prefix outgrew the candidate; rewind and
                // re-check it against the midpoint of the narrowed window.
                if self.narrowed() {
                    result = SearchResult::NotFound;
                } else {
                    self.compare_idx = 0;
                }
                continue;
            }

            let buffered = scratch[self.compare_idx];
            let candidate = name[self.compare_idx];
            if buffered == candidate {
                self.compare_idx += 1;
                if self.compare_idx == name.len() {
                    result = SearchResult::Found(mid);
                }
            } else if buffered > candidate {
                if self.narrowed() {
                    result = SearchResult::NotFound;
                } else {
                    self.left = mid + 1;
                }
            } else if self.narrowed() || mid == self.left {
                // mid == left would push `right` below `left`; the window
                // is empty either way.
                result = SearchResult::NotFound;
            } else {
                self.right = mid - 1;
            }
        }
        result
    }
}

// Tests

#[cfg(test)]
const METHODS: [&[u8]; 8] = [
    b"CONNECT",
    b"DELETE",
    b"GET",
    b"HEAD",
    b"OPTIONS",
    b"POST",
    b"PUT",
    b"TRACE",
];

#[cfg(test)]
fn feed(engine: &mut SearchEngine, token: &[u8], table: &[&'static [u8]]) -> Vec<SearchResult> {
    let mut scratch = [0u8; 64];
    token
        .iter()
        .map(|&b| engine.search(b, &mut scratch, |idx| table[idx]))
        .collect()
}

#[test]
fn every_method_found_on_its_final_byte() {
    for (expected, name) in METHODS.iter().enumerate() {
        let mut engine = SearchEngine::new(METHODS.len());
        let results = feed(&mut engine, name, &METHODS);
        let (last, prefix) = results.split_last().unwrap();
        assert!(prefix.iter().all(|r| *r == SearchResult::Ongoing), "{:?}", name);
        assert_eq!(SearchResult::Found(expected), *last);
    }
}

#[test]
fn unknown_token_is_not_found() {
    let mut engine = SearchEngine::new(METHODS.len());
    let results = feed(&mut engine, b"FROB", &METHODS);
    assert_eq!(Some(&SearchResult::NotFound), results.last());
    assert!(!results.iter().any(|r| matches!(r, SearchResult::Found(_))));
}

#[test]
fn token_below_table_start_is_not_found() {
    let mut engine = SearchEngine::new(METHODS.len());
    let results = feed(&mut engine, b"A", &METHODS);
    assert_eq!(vec![SearchResult::NotFound], results);
}

#[test]
fn token_above_table_end_is_not_found() {
    let mut engine = SearchEngine::new(METHODS.len());
    let results = feed(&mut engine, b"Z", &METHODS);
    assert_eq!(vec![SearchResult::NotFound], results);
}

#[test]
fn two_element_table_below_first_entry() {
    let table: [&[u8]; 2] = [b"/a", b"/b"];
    let mut engine = SearchEngine::new(table.len());
    let mut scratch = [0u8; 8];
    assert_eq!(
        SearchResult::Ongoing,
        engine.search(b'/', &mut scratch, |idx| table[idx])
    );
    assert_eq!(
        SearchResult::NotFound,
        engine.search(b'A', &mut scratch, |idx| table[idx])
    );
}

#[test]
fn diverging_between_adjacent_entries_is_not_found() {
    let table: [&[u8]; 4] = [b"/aa", b"/ab", b"/ad", b"/ae"];
    let mut engine = SearchEngine::new(table.len());
    let results = feed(&mut engine, b"/ac", &table);
    assert_eq!(Some(&SearchResult::NotFound), results.last());
}

#[test]
fn longer_entry_with_shared_prefix_found() {
    let table: [&[u8]; 3] = [b"/ab", b"/abcd", b"/b"];
    let mut engine = SearchEngine::new(table.len());
    let results = feed(&mut engine, b"/abcd", &table);
    assert_eq!(Some(&SearchResult::Found(1)), results.last());
}

#[test]
fn window_move_onto_shorter_candidate_rewinds_and_rejects() {
    let table: [&[u8]; 4] = [b"/abc", b"/abd", b"/b", b"/c"];
    let mut engine = SearchEngine::new(table.len());
    let results = feed(&mut engine, b"/abz", &table);
    assert_eq!(
        vec![
            SearchResult::Ongoing,
            SearchResult::Ongoing,
            SearchResult::Ongoing,
            SearchResult::NotFound
        ],
        results
    );
}

#[test]
fn scratch_exhaustion_reports_buffer_exceeded() {
    let table: [&[u8]; 1] = [b"/aaaaaaaa"];
    let mut engine = SearchEngine::new(table.len());
    let mut scratch = [0u8; 4];
    for &b in b"/aaa" {
        assert_eq!(
            SearchResult::Ongoing,
            engine.search(b, &mut scratch, |idx| table[idx])
        );
    }
    assert_eq!(
        SearchResult::BufferExceeded,
        engine.search(b'a', &mut scratch, |idx| table[idx])
    );
}

#[test]
fn resumes_across_chunk_boundaries() {
    let mut engine = SearchEngine::new(METHODS.len());
    let mut scratch = [0u8; 16];
    for &b in b"OPTION" {
        assert_eq!(
            SearchResult::Ongoing,
            engine.search(b, &mut scratch, |idx| METHODS[idx])
        );
    }
    // A fresh call site, as after a chunk boundary, continues the search.
    assert_eq!(
        SearchResult::Found(4),
        engine.search(b'S', &mut scratch, |idx| METHODS[idx])
    );
}
