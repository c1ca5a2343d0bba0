//! Protocol constants for the JPI EDM flight log format.

/// Number of delta slots addressable by a data record.
pub const MAX_METRIC_FIELDS: usize = 128;

/// Slot carrying the MARK event value.
pub const MARK_SLOT: usize = 16;

/// Raw MARK value latching fast (1 Hz) recording.
pub const MARK_FAST: u8 = 2;
/// Raw MARK value latching standard-interval recording.
pub const MARK_STANDARD: u8 = 3;

/// Map bytes 6 and 7 hold high bytes of EGT/TIT values and never carry
/// independent sign bits (the low byte's sign applies).
pub const SIGN_SKIP_MAP_BYTES: [usize; 2] = [6, 7];

/// Flight header size probe range, in bytes.
pub const MAX_FLIGHT_HEADER_SIZE: usize = 28;
pub const MIN_FLIGHT_HEADER_SIZE: usize = 14;
pub const HEADER_SIZE_STEP: usize = 2;

/// The interval field starts this many bytes before the end of the header.
pub const INTERVAL_TRAILING_BYTES: usize = 6;

/// Word indexes of the GPS origin inside the large-header data block.
pub const GPS_LAT_HIGH_WORD: usize = 3;
pub const GPS_LAT_LOW_WORD: usize = 4;
pub const GPS_LNG_HIGH_WORD: usize = 5;
pub const GPS_LNG_LOW_WORD: usize = 6;

/// Fixed-point GPS coordinates divide by this for degrees.minutes display.
pub const GPS_COORD_SCALE: f64 = 6000.0;

// Packed start-date word: dddddmmm myyyyyyy (day low 5 bits, month next 4,
// year the rest).
pub const DATE_DAY_MASK: u16 = 0x1f;
pub const DATE_MONTH_MASK: u16 = 0x01ff;
pub const DATE_MONTH_SHIFT: u16 = 5;
pub const DATE_YEAR_SHIFT: u16 = 9;
/// Years are stored relative to 2000 (tm_year base 1900 plus this offset).
pub const DATE_YEAR_OFFSET: u16 = 100;

// Packed start-time word: seconds in 2 s resolution in the low 5 bits,
// minutes in bits 5-10, hours in the rest.
pub const TIME_SECONDS_MASK: u16 = 0x1f;
pub const TIME_SECONDS_SCALE: u16 = 2;
pub const TIME_MINUTES_MASK: u16 = 0x07ff;
pub const TIME_MINUTES_SHIFT: u16 = 5;
pub const TIME_HOURS_SHIFT: u16 = 11;

/// Sentinel in `$A` lines meaning "no limit configured".
pub const CONFIG_LIMIT_SENTINEL: u64 = 999_999_999;

/// EDM models that monitor two engines.
pub const MODEL_760_TWIN: u32 = 760;
pub const MODEL_960_TWIN: u32 = 960;
/// Models below this are the single-engine 700/800 series.
pub const MODEL_900_SERIES: u32 = 900;

/// Firmware versions at or below this use the V1 record layout.
pub const FIRMWARE_V1_THRESHOLD: u32 = 108;

/// `$P` values above this indicate the extended flight header family.
pub const PROTO_HEADER_THRESHOLD: u32 = 1;

/// Build numbers selecting the flight header layout.
pub const BUILD_HEADER_V4_THRESHOLD: u32 = 2010;
pub const BUILD_HEADER_V3_THRESHOLD: u32 = 880;

/// `$C` flags bit set when temperatures are reported in Fahrenheit.
pub const FLAG_TEMP_IN_F: u32 = 0x1000_0000;

/// First of the nine CHT cylinder flag bits in the `$C` flags word.
pub const FLAG_FIRST_CYLINDER: u32 = 0x0000_0004;

/// Default slot value before the first delta is applied.
pub const SLOT_DEFAULT: i32 = 0xF0;
