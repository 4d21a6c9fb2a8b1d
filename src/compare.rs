//! Incremental match of the input stream against one fixed pattern.
//!
//! The engine holds nothing but a cursor into the pattern, so the owning
//! state resets it on entry and the match survives arbitrary input chunk
//! boundaries. [`CompareEngine::compare`] does not advance the cursor; the
//! caller confirms an `Ongoing` byte with [`CompareEngine::increment`]. That
//! split lets one byte be raced against several patterns without committing
//! it to any of them.

/// Result of feeding one byte to [`CompareEngine::compare`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CompareResult {
    /// The byte is the final byte of the pattern.
    Match,
    /// The byte matches; more bytes are needed.
    Ongoing,
    /// The byte diverges from the pattern, or the pattern is exhausted.
    NotMatch,
}

#[derive(Debug, Default)]
pub struct CompareEngine {
    compare_idx: usize,
}

impl CompareEngine {
    pub fn new() -> Self {
        Self { compare_idx: 0 }
    }

    pub fn reset(&mut self) {
        self.compare_idx = 0;
    }

    pub fn compare(&self, input: u8, pattern: &[u8]) -> CompareResult {
        if self.compare_idx >= pattern.len() {
            CompareResult::NotMatch
        } else if pattern[self.compare_idx] == input {
            if self.compare_idx == pattern.len() - 1 {
                CompareResult::Match
            } else {
                CompareResult::Ongoing
            }
        } else {
            CompareResult::NotMatch
        }
    }

    pub fn increment(&mut self) {
        self.compare_idx += 1;
    }
}

// Tests

#[test]
fn match_on_final_byte() {
    let mut ce = CompareEngine::new();
    assert_eq!(CompareResult::Ongoing, ce.compare(b'\r', b"\r\n"));
    ce.increment();
    assert_eq!(CompareResult::Match, ce.compare(b'\n', b"\r\n"));
}

#[test]
fn single_byte_pattern_matches_immediately() {
    let ce = CompareEngine::new();
    assert_eq!(CompareResult::Match, ce.compare(b' ', b" "));
}

#[test]
fn divergence_is_not_match() {
    let mut ce = CompareEngine::new();
    assert_eq!(CompareResult::Ongoing, ce.compare(b'H', b"HTTP/1.1\r\n"));
    ce.increment();
    assert_eq!(CompareResult::NotMatch, ce.compare(b'X', b"HTTP/1.1\r\n"));
}

#[test]
fn exhausted_pattern_is_not_match() {
    let mut ce = CompareEngine::new();
    ce.increment();
    ce.increment();
    assert_eq!(CompareResult::NotMatch, ce.compare(b'\r', b"\r\n"));
}

#[test]
fn reset_rewinds_the_cursor() {
    let mut ce = CompareEngine::new();
    ce.increment();
    ce.reset();
    assert_eq!(CompareResult::Ongoing, ce.compare(b'\r', b"\r\n"));
}
