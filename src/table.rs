//! Fixed-capacity parameter table.
//!
//! Header fields, query parameters and form fields of one request are packed
//! into a single byte buffer, each region terminated by `'\0'`, with a
//! parallel slot index recording the (name, value) start offsets in
//! insertion order. Nothing is allocated; when the buffer or the slot index
//! runs out, further input is dropped and the final terminator is preserved
//! so every recorded region stays null-terminated.

use crate::config::{HTTP_PARAMETERS_BUFFER_LENGTH, HTTP_PARAMETERS_MAX};
use log::warn;

/// Result of a store operation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StoreResult {
    Stored,
    /// All parameter slots are taken; the registration was dropped.
    SlotsFull,
    /// The packed buffer is full; the byte was dropped (or replaced by the
    /// forced final terminator).
    BufferFull,
}

pub struct ParamTable {
    buffer: [u8; HTTP_PARAMETERS_BUFFER_LENGTH],
    buffer_idx: usize,
    slots: [[usize; 2]; HTTP_PARAMETERS_MAX],
    size: usize,
}

impl ParamTable {
    pub fn new() -> Self {
        Self {
            buffer: [0; HTTP_PARAMETERS_BUFFER_LENGTH],
            buffer_idx: 0,
            slots: [[0; 2]; HTTP_PARAMETERS_MAX],
            size: 0,
        }
    }

    /// Rewinds the table for a new request. The buffer content is left in
    /// place and overwritten by subsequent appends.
    pub fn reset(&mut self) {
        self.buffer_idx = 0;
        self.size = 0;
    }

    /// Records the current buffer position as the name of the next slot.
    pub fn add_name(&mut self) -> StoreResult {
        if self.size < HTTP_PARAMETERS_MAX {
            self.slots[self.size][0] = self.buffer_idx;
            StoreResult::Stored
        } else {
            warn!("parameter slots exhausted, dropping registration");
            StoreResult::SlotsFull
        }
    }

    /// Records the current buffer position as the value of the current slot
    /// and completes it.
    pub fn add_value(&mut self) -> StoreResult {
        if self.size < HTTP_PARAMETERS_MAX {
            self.slots[self.size][1] = self.buffer_idx;
            self.size += 1;
            StoreResult::Stored
        } else {
            StoreResult::SlotsFull
        }
    }

    /// Appends one byte to the packed buffer. One byte before the buffer
    /// fills, the byte is replaced by the forced final terminator.
    pub fn add_char(&mut self, ch: u8) -> StoreResult {
        if self.buffer_idx < HTTP_PARAMETERS_BUFFER_LENGTH - 1 {
            self.buffer[self.buffer_idx] = ch;
            self.buffer_idx += 1;
            StoreResult::Stored
        } else if self.buffer_idx == HTTP_PARAMETERS_BUFFER_LENGTH - 1 {
            warn!("parameter buffer full, terminating");
            self.buffer[self.buffer_idx] = 0;
            self.buffer_idx += 1;
            StoreResult::BufferFull
        } else {
            StoreResult::BufferFull
        }
    }

    /// Looks up the first completed slot whose name equals `key`, ignoring
    /// ASCII case. Returns the value region without its terminator.
    pub fn get_nocase<K: AsRef<[u8]>>(&self, key: K) -> Option<&[u8]> {
        let key = key.as_ref();
        (0..self.size)
            .map(|idx| (self.region(self.slots[idx][0]), self.region(self.slots[idx][1])))
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    /// Returns the number of completed (name, value) slots.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The whole packed buffer, lent to the token matcher as scratch space
    /// while the request line is identified.
    pub(crate) fn scratch_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    fn region(&self, start: usize) -> &[u8] {
        let tail = &self.buffer[start.min(HTTP_PARAMETERS_BUFFER_LENGTH)..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        &tail[..end]
    }
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new()
    }
}

// Tests

#[cfg(test)]
fn put(table: &mut ParamTable, name: &[u8], value: &[u8]) {
    table.add_name();
    for &b in name {
        table.add_char(b);
    }
    table.add_char(0);
    table.add_value();
    for &b in value {
        table.add_char(b);
    }
    table.add_char(0);
}

#[test]
fn add_and_size() {
    let mut t = ParamTable::new();
    assert_eq!(0, t.size());
    put(&mut t, b"Key", b"Value1");
    assert_eq!(1, t.size());
    put(&mut t, b"AnotherKey", b"Value2");
    assert_eq!(2, t.size());
}

#[test]
fn get_nocase() {
    let mut t = ParamTable::new();
    put(&mut t, b"Key1", b"Value1");
    put(&mut t, b"KeY2", b"Value2");

    assert_eq!(Some(&b"Value1"[..]), t.get_nocase("KEY1"));
    assert_eq!(Some(&b"Value1"[..]), t.get_nocase("keY1"));
    assert_eq!(Some(&b"Value2"[..]), t.get_nocase("key2"));
    assert_eq!(None, t.get_nocase("NotAKey"));
    assert_eq!(None, t.get_nocase("Key"));
}

#[test]
fn insertion_order_wins_on_duplicates() {
    let mut t = ParamTable::new();
    put(&mut t, b"Name", b"first");
    put(&mut t, b"name", b"second");
    assert_eq!(Some(&b"first"[..]), t.get_nocase("NAME"));
}

#[test]
fn incomplete_slot_is_invisible() {
    let mut t = ParamTable::new();
    t.add_name();
    for &b in b"orphan" {
        t.add_char(b);
    }
    t.add_char(0);
    assert_eq!(0, t.size());
    assert_eq!(None, t.get_nocase("orphan"));
}

#[test]
fn reset_clears_completed_slots() {
    let mut t = ParamTable::new();
    put(&mut t, b"Key", b"Value");
    t.reset();
    assert_eq!(0, t.size());
    assert_eq!(None, t.get_nocase("Key"));
}

#[test]
fn buffer_overflow_forces_final_terminator() {
    let mut t = ParamTable::new();
    t.add_name();
    for _ in 0..HTTP_PARAMETERS_BUFFER_LENGTH - 1 {
        assert_eq!(StoreResult::Stored, t.add_char(b'x'));
    }
    // One byte of room left: the append becomes the forced terminator.
    assert_eq!(StoreResult::BufferFull, t.add_char(b'x'));
    assert_eq!(StoreResult::BufferFull, t.add_char(b'x'));
    t.add_value();
    assert_eq!(1, t.size());
    let name = vec![b'x'; HTTP_PARAMETERS_BUFFER_LENGTH - 1];
    assert_eq!(Some(&b""[..]), t.get_nocase(&name[..]));
}

#[test]
fn slots_full_drops_registrations_but_not_bytes() {
    let mut t = ParamTable::new();
    for i in 0..HTTP_PARAMETERS_MAX {
        put(&mut t, format!("k{}", i).as_bytes(), b"v");
    }
    assert_eq!(HTTP_PARAMETERS_MAX, t.size());
    assert_eq!(StoreResult::SlotsFull, t.add_name());
    assert_eq!(StoreResult::Stored, t.add_char(b'q'));
    assert_eq!(StoreResult::SlotsFull, t.add_value());
    assert_eq!(HTTP_PARAMETERS_MAX, t.size());
    assert_eq!(None, t.get_nocase("q"));
}
