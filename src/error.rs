use thiserror::Error;

/// Errors aborting a decode.
///
/// Every variant is fatal for the decode it occurs in: differential records
/// accumulate onto prior state, so skipping a corrupt record would silently
/// corrupt every later value. Unknown `$` header tags are the one recoverable
/// condition and are logged instead of reported here.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("header checksum mismatch on line {line}")]
    HeaderChecksum { line: usize },
    #[error("malformed header on line {line}: {reason}")]
    MalformedHeader { line: usize, reason: String },
    #[error("binary checksum mismatch in flight {flight} near offset {offset:#x}")]
    BinaryChecksum { flight: u16, offset: usize },
    #[error("flight id mismatch at offset {offset:#x}: expected {expected}, found {found}")]
    FlightIdMismatch {
        expected: u16,
        found: u16,
        offset: usize,
    },
    #[error("population bitmaps disagree in flight {flight}, record {record}, offset {offset:#x}")]
    PopulationBitmapMismatch {
        flight: u16,
        record: u32,
        offset: usize,
    },
    #[error("unexpected end of data at offset {offset:#x}")]
    UnexpectedEof { offset: usize },
    #[error("no flight header size passed checksum probing at offset {offset:#x}")]
    UnresolvableHeaderSize { offset: usize },
    #[error("flight {0} not found in file")]
    UnknownFlight(u16),
}
