//! Compile-time sizing of the per-connection buffers.
//!
//! Every buffer in this crate is a fixed array inside [`crate::Connection`];
//! these constants are the only sizing decisions. The defaults keep one
//! connection under one kilobyte of state.

/// Capacity of the response framer's output buffer. In chunked mode this is
/// also the largest chunk the framer will emit.
pub const HTTP_BUFFER_LENGTH: usize = 256;

/// Capacity of the packed parameter buffer holding header names and values,
/// query parameters and form fields for one request. The same buffer doubles
/// as scratch space for the token matcher while the request line is parsed.
pub const HTTP_PARAMETERS_BUFFER_LENGTH: usize = 640;

/// Number of (name, value) parameter slots available per request.
pub const HTTP_PARAMETERS_MAX: usize = 16;
