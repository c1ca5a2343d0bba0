//! Per-flight decoded types and the running accumulation state.

use std::collections::BTreeMap;

use crate::consts::{
    DATE_DAY_MASK, DATE_MONTH_MASK, DATE_MONTH_SHIFT, DATE_YEAR_OFFSET, DATE_YEAR_SHIFT,
    GPS_COORD_SCALE, MARK_FAST, MARK_STANDARD, MAX_METRIC_FIELDS, SLOT_DEFAULT,
    TIME_HOURS_SHIFT, TIME_MINUTES_MASK, TIME_MINUTES_SHIFT, TIME_SECONDS_MASK,
    TIME_SECONDS_SCALE,
};
use crate::metadata::Metadata;
use crate::metrics::{self, Init, Metric, MetricId, Scale};

/// Local start date, unpacked from the header's date word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl FlightDate {
    /// Date word layout: day in the low 5 bits, month in the next 4,
    /// year minus 2000 above that.
    pub fn from_packed(word: u16) -> Self {
        Self {
            year: 1900 + DATE_YEAR_OFFSET + (word >> DATE_YEAR_SHIFT),
            month: ((word & DATE_MONTH_MASK) >> DATE_MONTH_SHIFT) as u8,
            day: (word & DATE_DAY_MASK) as u8,
        }
    }
}

/// Local start time, unpacked from the header's time word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl FlightTime {
    /// Time word layout: seconds/2 in the low 5 bits, minutes in the next 6,
    /// hours above that.
    pub fn from_packed(word: u16) -> Self {
        Self {
            hour: (word >> TIME_HOURS_SHIFT) as u8,
            minute: ((word & TIME_MINUTES_MASK) >> TIME_MINUTES_SHIFT) as u8,
            second: ((word & TIME_SECONDS_MASK) * TIME_SECONDS_SCALE) as u8,
        }
    }
}

/// Departure fix, only recorded by GPS-equipped units with large headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsOrigin {
    /// Fixed-point minutes, positive north.
    pub lat: i32,
    /// Fixed-point minutes, positive east.
    pub lng: i32,
}

impl GpsOrigin {
    pub fn latitude_degrees(&self) -> f64 {
        f64::from(self.lat) / GPS_COORD_SCALE
    }

    pub fn longitude_degrees(&self) -> f64 {
        f64::from(self.lng) / GPS_COORD_SCALE
    }
}

/// Decoded per-flight binary header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightHeader {
    pub flight_number: u16,
    pub flags: u32,
    /// Seconds between standard-rate records.
    pub interval_secs: u16,
    pub start_date: FlightDate,
    pub start_time: FlightTime,
    pub origin: Option<GpsOrigin>,
}

/// One fully resolved sample: every known metric at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    /// Position in the flight, counting from zero.
    pub sequence: u32,
    /// Recorded at the fast 1 Hz rate rather than the standard interval.
    pub is_fast: bool,
    pub metrics: BTreeMap<MetricId, f32>,
}

/// Running decode state for one flight.
///
/// Records are differential, so state persists across the whole flight and
/// a corrupt record poisons everything after it.
#[derive(Debug)]
pub struct FlightState {
    slots: [i32; MAX_METRIC_FIELDS],
    table: BTreeMap<u8, &'static Metric>,
    gph: bool,
    fast: bool,
    sequence: u32,
    standard_count: u32,
    fast_count: u32,
}

impl FlightState {
    pub fn new(metadata: &Metadata) -> Self {
        let table = metrics::bit_to_metric_map(metadata.protocol_version());

        let mut slots = [SLOT_DEFAULT; MAX_METRIC_FIELDS];
        for metric in table.values() {
            if metric.init == Init::Zero {
                slots[metric.low_bit as usize] = 0;
            }
            // High companions carry bits 8..16 of a value and start empty.
            if let Some(high) = metric.high_bit {
                slots[high as usize] = 0;
            }
        }

        Self {
            slots,
            table,
            gph: metadata.is_gph(),
            fast: false,
            sequence: 0,
            standard_count: 0,
            fast_count: 0,
        }
    }

    /// Accumulate one signed delta onto a slot.
    pub fn apply_delta(&mut self, slot: usize, delta: i32) {
        self.slots[slot] += delta;
    }

    /// React to a MARK delta. Values other than the two rate codes are
    /// pilot annotations and leave the rate alone.
    pub fn latch_mark(&mut self, value: i32) {
        if value == i32::from(MARK_FAST) {
            self.fast = true;
        } else if value == i32::from(MARK_STANDARD) {
            self.fast = false;
        }
    }

    pub fn is_fast(&self) -> bool {
        self.fast
    }

    /// Index of the next record to be emitted.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn standard_count(&self) -> u32 {
        self.standard_count
    }

    pub fn fast_count(&self) -> u32 {
        self.fast_count
    }

    /// Snapshot the current state as a finished record and advance the
    /// sequence and rate tallies.
    pub fn emit(&mut self) -> FlightRecord {
        let record = FlightRecord {
            sequence: self.sequence,
            is_fast: self.fast,
            metrics: self.snapshot(),
        };
        self.sequence += 1;
        if self.fast {
            self.fast_count += 1;
        } else {
            self.standard_count += 1;
        }
        record
    }

    fn slot_value(&self, metric: &Metric) -> i32 {
        let mut value = self.slots[metric.low_bit as usize];
        if let Some(high) = metric.high_bit {
            value += self.slots[high as usize] << 8;
        }
        value
    }

    fn snapshot(&self) -> BTreeMap<MetricId, f32> {
        let mut out = BTreeMap::new();
        for metric in self.table.values() {
            let value = self.slot_value(metric);
            // GPS-derived values read -1 while the register still holds
            // the untouched default.
            let raw = if metric.init == Init::NegOne && value == SLOT_DEFAULT {
                -1.0
            } else {
                value as f32
            };
            let scaled = match metric.scale {
                Scale::Ten => raw / 10.0,
                Scale::TenIfGph if self.gph => raw / 10.0,
                _ => raw,
            };
            out.insert(metric.id, scaled);
        }

        if let Some(spread) = egt_spread(&out, ENGINE1_EGT) {
            out.insert(MetricId::Dif1, spread);
        }
        if let Some(spread) = egt_spread(&out, ENGINE2_EGT) {
            out.insert(MetricId::Dif2, spread);
        }
        out
    }
}

const ENGINE1_EGT: [MetricId; 6] = [
    MetricId::Egt11,
    MetricId::Egt12,
    MetricId::Egt13,
    MetricId::Egt14,
    MetricId::Egt15,
    MetricId::Egt16,
];

const ENGINE2_EGT: [MetricId; 6] = [
    MetricId::Egt21,
    MetricId::Egt22,
    MetricId::Egt23,
    MetricId::Egt24,
    MetricId::Egt25,
    MetricId::Egt26,
];

/// Hottest minus coldest probe, the value pilots lean the mixture by.
fn egt_spread(metrics: &BTreeMap<MetricId, f32>, probes: [MetricId; 6]) -> Option<f32> {
    let values = probes.iter().filter_map(|id| metrics.get(id));
    let max = values.clone().copied().fold(f32::MIN, f32::max);
    let min = values.copied().fold(f32::MAX, f32::min);
    (max >= min).then_some(max - min)
}
