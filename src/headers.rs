//! Text header lines.
//!
//! An EDM download starts with CRLF-terminated ASCII lines of the form
//! `$<tag>,<fields...>*<HH>`. The tag byte selects the record type; the two
//! hex digits after `*` are an XOR checksum of everything in between. The
//! `$L` line closes the header section, and binary flight data follows
//! immediately after its terminator.

use log::warn;

use crate::checksum;
use crate::consts::CONFIG_LIMIT_SENTINEL;
use crate::error::DecodeError;

/// `$A` record: alarm limits configured on the unit.
///
/// Example: `$A, 305,230,500,415,60,1650,230,90*7F`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLimits {
    pub volts_hi: u32,
    pub volts_lo: u32,
    pub egt_diff: u32,
    pub cht_hi: u32,
    pub shock_cooling: u32,
    pub turbo_inlet_hi: u32,
    pub oil_hi: u32,
    pub oil_lo: u32,
}

/// `$C` record: model number, feature flags and firmware identification.
///
/// Example: `$C,700,63741, 6193, 1552, 292*58`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInfo {
    pub model: u32,
    /// 32-bit feature flag word, assembled from the lo/hi fields.
    pub flags: u32,
    pub unknown: u32,
    /// Firmware version times 100 (292 is 2.92).
    pub firmware_version: u32,
    /// Build identification, present only on newer units.
    pub build_maj: u32,
    pub build_min: u32,
}

/// `$F` record: fuel tank sizes and flow-meter K factors.
///
/// Example: `$F,0,999,  0,2950,2950*53`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuelLimits {
    pub empty: u32,
    pub main_tank_size: u32,
    pub aux_tank_size: u32,
    pub k_factor_1: u32,
    pub k_factor_2: u32,
    /// 0 = gallons per hour, 1 = liters. Older units omit the field.
    pub units: u32,
}

/// `$P` record: protocol generation marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtoHeader {
    pub value: u32,
}

/// `$T` record: UTC timestamp of the download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeStamp {
    pub month: u32,
    pub day: u32,
    pub year: u32,
    pub hour: u32,
    pub minute: u32,
    /// Loosely sequential download counter.
    pub sequence: u32,
}

/// `$D` record: one per flight, in playback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightDescriptor {
    pub flight_id: u16,
    /// Declared length of the flight's binary section in 16-bit words.
    pub word_count: u32,
}

impl FlightDescriptor {
    /// Byte length of the flight block, header included, excluding the
    /// single trailing pad byte.
    pub fn byte_len(&self) -> usize {
        (self.word_count.saturating_sub(1) as usize) * 2
    }
}

/// One parsed header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    ConfigLimits(ConfigLimits),
    ConfigInfo(ConfigInfo),
    FuelLimits(FuelLimits),
    Proto(ProtoHeader),
    TimeStamp(TimeStamp),
    TailNumber(String),
    FlightDescriptor(FlightDescriptor),
    /// `$L` end-of-headers sentinel; binary data follows.
    LastHeader,
    /// `$H` or an unrecognized tag; skipped for forward compatibility.
    Ignored,
}

/// Parse and checksum-validate a single header line.
pub fn parse_header_line(lineno: usize, line: &str) -> Result<HeaderLine, DecodeError> {
    checksum::validate_line(lineno, line)?;

    let tag = line.as_bytes().get(1).copied().unwrap_or(0);
    match tag {
        b'A' => {
            let v = split_fields(lineno, line)?;
            require(lineno, &v, 8, "$A")?;
            Ok(HeaderLine::ConfigLimits(ConfigLimits {
                volts_hi: v[0],
                volts_lo: v[1],
                egt_diff: v[2],
                cht_hi: v[3],
                shock_cooling: v[4],
                turbo_inlet_hi: v[5],
                oil_hi: v[6],
                oil_lo: v[7],
            }))
        }
        b'C' => {
            let v = split_fields(lineno, line)?;
            require(lineno, &v, 5, "$C")?;
            // Build identification only exists on long $C lines, counted
            // from the end because the middle fields vary by firmware.
            let (build_maj, build_min) = if v.len() >= 8 {
                (v[v.len() - 2], v[v.len() - 1])
            } else {
                (0, 0)
            };
            Ok(HeaderLine::ConfigInfo(ConfigInfo {
                model: v[0],
                flags: (v[2] << 16) | (v[1] & 0xFFFF),
                unknown: v[3],
                firmware_version: v[4],
                build_maj,
                build_min,
            }))
        }
        b'D' => {
            let v = split_fields(lineno, line)?;
            require(lineno, &v, 2, "$D")?;
            let flight_id =
                u16::try_from(v[0]).map_err(|_| DecodeError::MalformedHeader {
                    line: lineno,
                    reason: format!("flight id {} out of range", v[0]),
                })?;
            Ok(HeaderLine::FlightDescriptor(FlightDescriptor {
                flight_id,
                word_count: v[1],
            }))
        }
        b'F' => {
            let v = split_fields(lineno, line)?;
            require(lineno, &v, 5, "$F")?;
            Ok(HeaderLine::FuelLimits(FuelLimits {
                empty: v[0],
                main_tank_size: v[1],
                aux_tank_size: v[2],
                k_factor_1: v[3],
                k_factor_2: v[4],
                units: v.get(5).copied().unwrap_or(0),
            }))
        }
        b'P' => {
            let v = split_fields(lineno, line)?;
            require(lineno, &v, 1, "$P")?;
            Ok(HeaderLine::Proto(ProtoHeader { value: v[0] }))
        }
        b'T' => {
            let v = split_fields(lineno, line)?;
            require(lineno, &v, 6, "$T")?;
            Ok(HeaderLine::TimeStamp(TimeStamp {
                month: v[0],
                day: v[1],
                year: v[2],
                hour: v[3],
                minute: v[4],
                sequence: v[5],
            }))
        }
        b'U' => {
            let payload = line.rsplit_once('*').map(|(p, _)| p).unwrap_or(line);
            let tail = payload.split_once(',').map(|(_, t)| t).unwrap_or("");
            Ok(HeaderLine::TailNumber(tail.to_string()))
        }
        b'L' => Ok(HeaderLine::LastHeader),
        b'H' => Ok(HeaderLine::Ignored),
        other => {
            warn!(
                "ignoring unknown header tag {:?} on line {lineno}",
                other as char
            );
            Ok(HeaderLine::Ignored)
        }
    }
}

/// Split the comma-separated numeric fields of a checksummed line, applying
/// the no-limit sentinel remap.
fn split_fields(lineno: usize, line: &str) -> Result<Vec<u32>, DecodeError> {
    let rest = &line[1..];
    let payload = rest.rsplit_once('*').map(|(p, _)| p).unwrap_or(rest);

    payload
        .split(',')
        .skip(1) // the tag itself
        .map(|field| {
            let val: u64 =
                field
                    .trim()
                    .parse()
                    .map_err(|_| DecodeError::MalformedHeader {
                        line: lineno,
                        reason: format!("unparseable field {field:?}"),
                    })?;
            let val = if val == CONFIG_LIMIT_SENTINEL {
                u64::from(u16::MAX)
            } else {
                val
            };
            u32::try_from(val).map_err(|_| DecodeError::MalformedHeader {
                line: lineno,
                reason: format!("field {field:?} out of range"),
            })
        })
        .collect()
}

fn require(
    lineno: usize,
    values: &[u32],
    count: usize,
    record: &str,
) -> Result<(), DecodeError> {
    if values.len() < count {
        return Err(DecodeError::MalformedHeader {
            line: lineno,
            reason: format!(
                "{record} record has {} fields, expected at least {count}",
                values.len()
            ),
        });
    }
    Ok(())
}
