//! Decoder for JPI EDM engine monitor flight logs.
//!
//! EDM units from J.P. Instruments download their recorded flights as a
//! single file: checksummed ASCII header lines describing the unit and the
//! flights it holds, followed by one binary block per flight made of
//! differential data records.
//!
//! The [decode_file] function pushes everything through a [DecodeSink];
//! [decode_flight] does the same for a single flight. [FileDecoder] is the
//! pull-based alternative and hands out lazy per-flight record iterators.

mod checksum;
mod consts;
mod cursor;
mod decode;
mod error;
mod flight;
mod headers;
mod metadata;
mod metrics;

pub use decode::*;
pub use error::*;
pub use flight::*;
pub use headers::*;
pub use metadata::*;
pub use metrics::*;
