//! File decoding: text headers, flight headers and differential records.
//!
//! Two views over the same machinery. [`decode_file`] pushes everything
//! through a [`DecodeSink`], which suits converters that stream a whole
//! download. [`FileDecoder`] pulls: it indexes the flights up front and hands
//! out lazy per-flight record iterators, which suits tools that only care
//! about one flight.

use log::debug;

use crate::checksum;
use crate::consts::{
    GPS_LAT_HIGH_WORD, GPS_LAT_LOW_WORD, GPS_LNG_HIGH_WORD, GPS_LNG_LOW_WORD,
    HEADER_SIZE_STEP, INTERVAL_TRAILING_BYTES, MARK_SLOT, MAX_FLIGHT_HEADER_SIZE,
    MAX_METRIC_FIELDS, MIN_FLIGHT_HEADER_SIZE, SIGN_SKIP_MAP_BYTES,
};
use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::flight::{FlightDate, FlightHeader, FlightRecord, FlightState, FlightTime, GpsOrigin};
use crate::headers::{FlightDescriptor, HeaderLine, parse_header_line};
use crate::metadata::Metadata;

/// Receiver for the push view. Every method has a no-op default, so a sink
/// implements only what it cares about.
pub trait DecodeSink {
    fn on_metadata(&mut self, _metadata: &Metadata) {}
    fn on_flight_header(&mut self, _header: &FlightHeader) {}
    fn on_record(&mut self, _record: &FlightRecord) {}
    /// Called once per flight after its last record, with the rate tallies.
    fn on_flight_complete(&mut self, _flight: u16, _standard: u32, _fast: u32) {}
    fn on_end(&mut self) {}
}

/// Decode every flight in the file, pushing results into `sink`.
pub fn decode_file(data: &[u8], sink: &mut dyn DecodeSink) -> Result<(), DecodeError> {
    let mut cursor = Cursor::new(data);
    let (metadata, descriptors) = decode_headers(&mut cursor)?;
    sink.on_metadata(&metadata);

    for descriptor in &descriptors {
        decode_one_flight(&mut cursor, &metadata, descriptor, sink)?;
    }

    sink.on_end();
    Ok(())
}

/// Decode a single flight by id, skipping the others without touching their
/// record bytes.
pub fn decode_flight(
    data: &[u8],
    flight_id: u16,
    sink: &mut dyn DecodeSink,
) -> Result<(), DecodeError> {
    let mut cursor = Cursor::new(data);
    let (metadata, descriptors) = decode_headers(&mut cursor)?;

    if !descriptors.iter().any(|d| d.flight_id == flight_id) {
        return Err(DecodeError::UnknownFlight(flight_id));
    }
    sink.on_metadata(&metadata);

    for descriptor in &descriptors {
        if descriptor.flight_id == flight_id {
            decode_one_flight(&mut cursor, &metadata, descriptor, sink)?;
            break;
        }
        // Each block is its declared length plus one pad byte.
        cursor.seek(cursor.position() + descriptor.byte_len() + 1);
    }

    sink.on_end();
    Ok(())
}

/// Read text header lines up to and including `$L`, leaving the cursor on
/// the first binary byte.
pub fn decode_headers(
    cursor: &mut Cursor<'_>,
) -> Result<(Metadata, Vec<FlightDescriptor>), DecodeError> {
    let mut metadata = Metadata::default();
    let mut descriptors = Vec::new();

    for lineno in 1.. {
        let line = cursor.read_header_line()?;
        match parse_header_line(lineno, line)? {
            HeaderLine::ConfigLimits(limits) => metadata.config_limits = limits,
            HeaderLine::ConfigInfo(info) => metadata.config_info = info,
            HeaderLine::FuelLimits(fuel) => metadata.fuel_limits = fuel,
            HeaderLine::Proto(proto) => metadata.proto_header = proto,
            HeaderLine::TimeStamp(ts) => metadata.timestamp = ts,
            HeaderLine::TailNumber(tail) => metadata.tail_number = tail,
            HeaderLine::FlightDescriptor(descriptor) => descriptors.push(descriptor),
            HeaderLine::LastHeader => break,
            HeaderLine::Ignored => {}
        }
    }

    Ok((metadata, descriptors))
}

fn decode_one_flight(
    cursor: &mut Cursor<'_>,
    metadata: &Metadata,
    descriptor: &FlightDescriptor,
    sink: &mut dyn DecodeSink,
) -> Result<(), DecodeError> {
    let start = cursor.position();
    let end = start + descriptor.byte_len();

    let header = decode_flight_header(cursor, descriptor.flight_id)?;
    sink.on_flight_header(&header);

    let mut state = FlightState::new(metadata);
    while cursor.position() < end {
        let record = decode_record(cursor, &mut state, descriptor.flight_id)?;
        sink.on_record(&record);
    }
    sink.on_flight_complete(
        descriptor.flight_id,
        state.standard_count(),
        state.fast_count(),
    );

    // Flights are padded to an even byte count.
    if cursor.remaining() > 0 {
        cursor.read_u8()?;
    }
    Ok(())
}

/// Probe for the flight header size.
///
/// Units disagree on the header length and nothing declares it, so try each
/// candidate from largest to smallest until the trailing checksum byte
/// validates the span before it.
fn detect_flight_header_size(cursor: &Cursor<'_>) -> Result<usize, DecodeError> {
    let start = cursor.position();
    let mut size = MAX_FLIGHT_HEADER_SIZE;
    while size >= MIN_FLIGHT_HEADER_SIZE {
        if let Ok(body) = cursor.slice_at(start, size)
            && let Ok(trailer) = cursor.slice_at(start + size, 1)
            && checksum::accepts_binary(body, trailer[0])
        {
            debug!("flight header size {size} at offset {start:#x}");
            return Ok(size);
        }
        size -= HEADER_SIZE_STEP;
    }
    Err(DecodeError::UnresolvableHeaderSize { offset: start })
}

/// Decode one flight header, validating the flight number against the
/// `$D` descriptor and the trailing checksum against the whole header.
pub fn decode_flight_header(
    cursor: &mut Cursor<'_>,
    expected: u16,
) -> Result<FlightHeader, DecodeError> {
    let start = cursor.position();
    let size = detect_flight_header_size(cursor)?;

    let flight_number = cursor.read_u16_be()?;
    if flight_number != expected {
        return Err(DecodeError::FlightIdMismatch {
            expected,
            found: flight_number,
            offset: start,
        });
    }

    let flags_low = cursor.read_u16_be()?;
    let flags_high = cursor.read_u16_be()?;
    let flags = u32::from(flags_low) | (u32::from(flags_high) << 16);

    let interval_offset = start + size - INTERVAL_TRAILING_BYTES;
    let origin = if size >= MAX_FLIGHT_HEADER_SIZE {
        // Large header: a data block big enough for a GPS departure fix.
        let mut origin = GpsOrigin { lat: 0, lng: 0 };
        let mut high = 0u32;
        let mut index = 0;
        while cursor.position() < interval_offset {
            let word = cursor.read_u16_be()?;
            match index {
                GPS_LAT_HIGH_WORD => high = u32::from(word) << 16,
                GPS_LAT_LOW_WORD => origin.lat = (high | u32::from(word)) as i32,
                GPS_LNG_HIGH_WORD => high = u32::from(word) << 16,
                GPS_LNG_LOW_WORD => origin.lng = (high | u32::from(word)) as i32,
                _ => {}
            }
            index += 1;
        }
        Some(origin)
    } else {
        // Small header: the data block has no known fields.
        cursor.seek(interval_offset);
        None
    };

    let interval_secs = cursor.read_u16_be()?;
    let start_date = FlightDate::from_packed(cursor.read_u16_be()?);
    let start_time = FlightTime::from_packed(cursor.read_u16_be()?);

    let trailer = cursor.read_u8()?;
    let body = cursor.slice_at(start, size)?;
    if !checksum::accepts_binary(body, trailer) {
        return Err(DecodeError::BinaryChecksum {
            flight: expected,
            offset: start,
        });
    }

    Ok(FlightHeader {
        flight_number,
        flags,
        interval_secs,
        start_date,
        start_time,
        origin,
    })
}

/// Decode one differential record onto `state` and emit the resulting
/// snapshot.
pub fn decode_record(
    cursor: &mut Cursor<'_>,
    state: &mut FlightState,
    flight: u16,
) -> Result<FlightRecord, DecodeError> {
    let start = cursor.position();
    let record = state.sequence();

    // Two copies of the population bitmap guard against bit rot.
    let population = cursor.read_u16_be()?;
    let population_check = cursor.read_u16_be()?;
    if population != population_check {
        return Err(DecodeError::PopulationBitmapMismatch {
            flight,
            record,
            offset: start,
        });
    }

    // Reserved repeat count; always zero in captured files.
    let _repeat = cursor.read_u8()?;

    // One field-presence byte per set population bit, LSB-first within
    // each byte.
    let mut fields = [false; MAX_METRIC_FIELDS];
    for byte_index in 0..16 {
        if population & (1 << byte_index) != 0 {
            let value = cursor.read_u8()?;
            for bit in 0..8 {
                fields[byte_index * 8 + bit] = value & (1 << bit) != 0;
            }
        }
    }

    // Sign bytes mirror the field bytes, except the EGT high-byte map
    // bytes, which reuse the signs of their low bytes.
    let mut signs = [false; MAX_METRIC_FIELDS];
    for byte_index in 0..16 {
        if population & (1 << byte_index) != 0 && !SIGN_SKIP_MAP_BYTES.contains(&byte_index) {
            let value = cursor.read_u8()?;
            for bit in 0..8 {
                signs[byte_index * 8 + bit] = value & (1 << bit) != 0;
            }
        }
    }

    // One unsigned delta byte per populated field, in slot order.
    for slot in 0..MAX_METRIC_FIELDS {
        if !fields[slot] {
            continue;
        }
        let magnitude = i32::from(cursor.read_u8()?);
        let delta = if signs[slot] { -magnitude } else { magnitude };
        state.apply_delta(slot, delta);
        if slot == MARK_SLOT {
            state.latch_mark(delta);
        }
    }

    let end = cursor.position();
    let trailer = cursor.read_u8()?;
    if !checksum::accepts_binary(cursor.slice_at(start, end - start)?, trailer) {
        return Err(DecodeError::BinaryChecksum {
            flight,
            offset: start,
        });
    }

    Ok(state.emit())
}

/// Pull view over an in-memory download.
pub struct FileDecoder<'a> {
    data: &'a [u8],
    metadata: Metadata,
    descriptors: Vec<FlightDescriptor>,
    offsets: Vec<usize>,
}

impl<'a> FileDecoder<'a> {
    /// Parse the text headers and index the flight blocks. No flight bytes
    /// are decoded yet.
    pub fn new(data: &'a [u8]) -> Result<Self, DecodeError> {
        let mut cursor = Cursor::new(data);
        let (metadata, descriptors) = decode_headers(&mut cursor)?;

        let mut offsets = Vec::with_capacity(descriptors.len());
        let mut offset = cursor.position();
        for descriptor in &descriptors {
            offsets.push(offset);
            offset += descriptor.byte_len() + 1;
        }

        Ok(Self {
            data,
            metadata,
            descriptors,
            offsets,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The `$D` flight directory, in file order.
    pub fn descriptors(&self) -> &[FlightDescriptor] {
        &self.descriptors
    }

    /// Open one flight by id.
    pub fn flight(&self, flight_id: u16) -> Result<FlightCursor<'a>, DecodeError> {
        let index = self
            .descriptors
            .iter()
            .position(|d| d.flight_id == flight_id)
            .ok_or(DecodeError::UnknownFlight(flight_id))?;
        self.open(index)
    }

    /// Iterate over every flight in file order.
    pub fn flights(
        &self,
    ) -> impl Iterator<Item = Result<FlightCursor<'a>, DecodeError>> + '_ {
        (0..self.descriptors.len()).map(|index| self.open(index))
    }

    fn open(&self, index: usize) -> Result<FlightCursor<'a>, DecodeError> {
        let descriptor = self.descriptors[index];
        let start = self.offsets[index];
        let mut cursor = Cursor::new(self.data);
        cursor.seek(start);

        let header = decode_flight_header(&mut cursor, descriptor.flight_id)?;
        Ok(FlightCursor {
            descriptor,
            end: start + descriptor.byte_len(),
            cursor,
            state: FlightState::new(&self.metadata),
            header,
            failed: false,
        })
    }
}

/// Lazy record iterator over one flight.
///
/// The flight header is decoded when the cursor is opened; records decode
/// one by one as the iterator advances. The first error ends the iteration,
/// since everything after a corrupt record is unreliable.
#[derive(Debug)]
pub struct FlightCursor<'a> {
    descriptor: FlightDescriptor,
    end: usize,
    cursor: Cursor<'a>,
    state: FlightState,
    header: FlightHeader,
    failed: bool,
}

impl FlightCursor<'_> {
    pub fn header(&self) -> &FlightHeader {
        &self.header
    }

    pub fn descriptor(&self) -> &FlightDescriptor {
        &self.descriptor
    }

    /// Records emitted so far at the standard interval.
    pub fn standard_count(&self) -> u32 {
        self.state.standard_count()
    }

    /// Records emitted so far at the fast rate.
    pub fn fast_count(&self) -> u32 {
        self.state.fast_count()
    }
}

impl Iterator for FlightCursor<'_> {
    type Item = Result<FlightRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor.position() >= self.end {
            return None;
        }
        let result = decode_record(&mut self.cursor, &mut self.state, self.descriptor.flight_id);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
