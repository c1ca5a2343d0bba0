//! The metric table: which delta slot feeds which engine value.
//!
//! Slots are addressed by the 128-bit field map of a data record. Some values
//! are 16 bits wide and occupy a low slot plus a high-byte companion slot.
//! Slot assignments were reverse engineered per protocol generation and
//! overlap: the same slot can mean different things on different units, so
//! every row carries a version mask.

use std::collections::BTreeMap;

use log::warn;

use crate::metadata::ProtocolVersion;

/// Identifies a decoded engine value.
///
/// Two-digit suffixes are engine then probe, so `Egt13` is engine 1 EGT
/// probe 3. `Dif1`/`Dif2` are synthesized spreads, never stored in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricId {
    Egt11, Egt12, Egt13, Egt14, Egt15, Egt16, Egt17, Egt18, Egt19,
    Egt21, Egt22, Egt23, Egt24, Egt25, Egt26, Egt27, Egt28, Egt29,
    Cht11, Cht12, Cht13, Cht14, Cht15, Cht16, Cht17, Cht18, Cht19,
    Cht21, Cht22, Cht23, Cht24, Cht25, Cht26, Cht27, Cht28, Cht29,
    Cld1, Cld2,
    Tit11, Tit12, Tit21, Tit22,
    OilT1, OilT2,
    OilP1, OilP2,
    Crb1, Crb2,
    Iat1, Iat2,
    Map1, Map2,
    Volt1, Volt2,
    Amp1, Amp2,
    Ff11, Ff12, Ff21, Ff22,
    FLvl11, FLvl12, FLvl13, FLvl21, FLvl22, FLvl23,
    FUsd11, FUsd12, FUsd21,
    Fp1, Fp2,
    Hp1, Hp2,
    Rpm1, Rpm2,
    Hrs1, Hrs2,
    Torq1, Torq2,
    LMain, RMain,
    LAux, RAux,
    HydP11, HydP12, HydP21, HydP22,
    Mark, Oat, Spd, Alt, Lat, Lng,
    /// Spread between hottest and coldest EGT, engine 1.
    Dif1,
    /// Spread between hottest and coldest EGT, engine 2.
    Dif2,
}

/// Scaling applied when a slot value is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    None,
    /// Stored in tenths.
    Ten,
    /// Stored in tenths only when fuel units are gallons per hour.
    TenIfGph,
}

/// Slot value before any delta is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    Default,
    Zero,
    /// The slot register starts at the usual default, but the metric
    /// surfaces as -1 until the first delta moves it. Marks values the
    /// unit only records with a GPS fix.
    NegOne,
}

/// One slot assignment row.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub versions: u8,
    pub low_bit: u8,
    pub high_bit: Option<u8>,
    pub id: MetricId,
    pub name: &'static str,
    pub scale: Scale,
    pub init: Init,
}

impl Metric {
    const fn new(versions: u8, low_bit: u8, id: MetricId, name: &'static str) -> Self {
        Self {
            versions,
            low_bit,
            high_bit: None,
            id,
            name,
            scale: Scale::None,
            init: Init::Default,
        }
    }

    const fn wide(
        versions: u8,
        low_bit: u8,
        high_bit: u8,
        id: MetricId,
        name: &'static str,
    ) -> Self {
        Self {
            versions,
            low_bit,
            high_bit: Some(high_bit),
            id,
            name,
            scale: Scale::None,
            init: Init::Default,
        }
    }

    const fn scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    const fn init_zero(mut self) -> Self {
        self.init = Init::Zero;
        self
    }

    const fn init_neg_one(mut self) -> Self {
        self.init = Init::NegOne;
        self
    }

    pub fn applies_to(&self, version: ProtocolVersion) -> bool {
        self.versions & version.mask() != 0
    }
}

const V1: u8 = ProtocolVersion::V1.mask();
const V2: u8 = ProtocolVersion::V2.mask();
const V3: u8 = ProtocolVersion::V3.mask();
const V4: u8 = ProtocolVersion::V4.mask();
const V5: u8 = ProtocolVersion::V5.mask();
const ALL: u8 = V1 | V2 | V3 | V4 | V5;

use MetricId::*;
use Scale::{Ten, TenIfGph};

#[rustfmt::skip]
pub static METRICS: &[Metric] = &[
    // map bytes 0 and 6
    Metric::wide(ALL, 0, 48, Egt11, "engine[1].exhaust_gas_temperature[1]"),
    Metric::wide(ALL, 1, 49, Egt12, "engine[1].exhaust_gas_temperature[2]"),
    Metric::wide(ALL, 2, 50, Egt13, "engine[1].exhaust_gas_temperature[3]"),
    Metric::wide(ALL, 3, 51, Egt14, "engine[1].exhaust_gas_temperature[4]"),
    Metric::wide(ALL, 4, 52, Egt15, "engine[1].exhaust_gas_temperature[5]"),
    Metric::wide(ALL, 5, 53, Egt16, "engine[1].exhaust_gas_temperature[6]"),
    Metric::wide(ALL, 6, 54, Tit11, "engine[1].turbine_inlet_temperature[1]"),
    Metric::wide(ALL, 7, 55, Tit12, "engine[1].turbine_inlet_temperature[2]"),

    // map byte 1
    Metric::new(ALL,  8, Cht11, "engine[1].cylinder_head_temperature[1]"),
    Metric::new(ALL,  9, Cht12, "engine[1].cylinder_head_temperature[2]"),
    Metric::new(ALL, 10, Cht13, "engine[1].cylinder_head_temperature[3]"),
    Metric::new(ALL, 11, Cht14, "engine[1].cylinder_head_temperature[4]"),
    Metric::new(ALL, 12, Cht15, "engine[1].cylinder_head_temperature[5]"),
    Metric::new(ALL, 13, Cht16, "engine[1].cylinder_head_temperature[6]"),
    Metric::new(ALL, 14, Cld1,  "engine[1].cylinder_head_temperature_cooling_rate"),
    Metric::new(ALL, 15, OilT1, "engine[1].oil_temperature"),

    // map byte 2
    Metric::new(ALL,           16, Mark,  "mark"),
    Metric::new(V1|V3|V4|V5,   17, OilP1, "engine[1].oil_pressure"),
    Metric::new(ALL,           18, Crb1,  "engine[1].carb_temperature"),
    Metric::new(V1|V3|V4|V5,   19, Iat1,  "engine[1].induction_air_temperature"),
    Metric::new(V2,            19, Map2,  "engine[2].manifold_pressure").scale(Ten),
    Metric::new(ALL,           20, Volt1, "voltage[1]").scale(Ten),
    Metric::new(ALL,           21, Oat,   "outside_air_temperature"),
    Metric::new(ALL,           22, FUsd11,"engine[1].fuel_used[1]").scale(TenIfGph),
    Metric::new(ALL,           23, Ff11,  "engine[1].fuel_flow[1]").scale(TenIfGph),

    // map bytes 3 and 7, single-engine and twin assignments overlap
    Metric::wide(V1|V3|V4, 24, 56, Egt17, "engine[1].exhaust_gas_temperature[7]"),
    Metric::wide(V2|V5,    24, 56, Egt21, "engine[2].exhaust_gas_temperature[1]"),
    Metric::wide(V1|V3|V4, 25, 57, Egt18, "engine[1].exhaust_gas_temperature[8]"),
    Metric::wide(V2|V5,    25, 57, Egt22, "engine[2].exhaust_gas_temperature[2]"),
    Metric::wide(V1|V3|V4, 26, 58, Egt19, "engine[1].exhaust_gas_temperature[9]"),
    Metric::wide(V2|V5,    26, 58, Egt23, "engine[2].exhaust_gas_temperature[3]"),
    Metric::new(V1|V3|V4,  27,     Cht17, "engine[1].cylinder_head_temperature[7]"),
    Metric::wide(V2|V5,    27, 59, Egt24, "engine[2].exhaust_gas_temperature[4]"),
    Metric::new(V1|V3|V4,  28,     Cht18, "engine[1].cylinder_head_temperature[8]"),
    Metric::wide(V2|V5,    28, 60, Egt25, "engine[2].exhaust_gas_temperature[5]"),
    Metric::new(V1|V3|V4,  29,     Cht19, "engine[1].cylinder_head_temperature[9]"),
    Metric::wide(V2|V5,    29, 61, Egt26, "engine[2].exhaust_gas_temperature[6]"),
    Metric::new(V1|V3|V4,  30,     Hp1,   "engine[1].horsepower").init_zero(),
    Metric::wide(V2|V5,    30, 62, Tit21, "engine[2].turbine_inlet_temperature[1]").init_zero(),
    Metric::wide(V2|V5,    31, 63, Tit22, "engine[2].turbine_inlet_temperature[2]").init_zero(),

    // map byte 4
    Metric::new(V2|V5, 32, Cht21, "engine[2].cylinder_head_temperature[1]"),
    Metric::new(V2|V5, 33, Cht22, "engine[2].cylinder_head_temperature[2]"),
    Metric::new(V2|V5, 34, Cht23, "engine[2].cylinder_head_temperature[3]"),
    Metric::new(V2|V5, 35, Cht24, "engine[2].cylinder_head_temperature[4]"),
    Metric::new(V2|V5, 36, Cht25, "engine[2].cylinder_head_temperature[5]"),
    Metric::new(V2|V5, 37, Cht26, "engine[2].cylinder_head_temperature[6]"),
    Metric::new(V2|V5, 38, Cld2,  "engine[2].cylinder_head_temperature_cooling_rate"),
    Metric::new(V2|V5, 39, OilT2, "engine[2].oil_temperature"),

    // map byte 5
    Metric::new(ALL,    40,     Map1,  "engine[1].manifold_pressure").scale(Ten),
    Metric::wide(ALL,   41, 42, Rpm1,  "engine[1].rpm"),
    Metric::wide(V2|V5, 43, 44, Rpm2,  "engine[2].rpm"),
    Metric::new(V4,     44,     HydP12,"engine[1].hydraulic_pressure[2]"),
    Metric::new(V2|V5,  45,     Crb2,  "engine[2].carb_temperature"),
    Metric::new(V4,     45,     HydP11,"engine[1].hydraulic_pressure[1]"),
    Metric::new(V2|V5,  46,     FUsd21,"engine[2].fuel_used[1]").scale(TenIfGph),
    Metric::new(V4,     46,     Ff12,  "engine[1].fuel_flow[2]").scale(TenIfGph),
    Metric::new(V4,     47,     FUsd12,"engine[1].fuel_used[2]").scale(TenIfGph),
    Metric::new(V2|V5,  47,     Ff21,  "engine[2].fuel_flow[1]").scale(TenIfGph),

    // map bytes 6 and 7 hold only high-byte companions

    // map byte 8
    Metric::new(V3|V4|V5, 64, Amp1,  "amperage[1]"),
    Metric::new(V3|V4|V5, 65, Volt2, "voltage[2]").scale(Ten),
    Metric::new(V3|V4|V5, 66, Amp2,  "amperage[2]"),
    Metric::new(V3|V4,    67, RMain, "right_main.fuel_level").scale(TenIfGph),
    Metric::new(V5,       67, FLvl11,"engine[1].fuel_level[1]").scale(TenIfGph),
    Metric::new(V3|V4,    68, LMain, "left_main.fuel_level").scale(TenIfGph),
    Metric::new(V5,       68, FLvl12,"engine[1].fuel_level[2]").scale(TenIfGph),
    Metric::new(V3|V4|V5, 69, Fp1,   "engine[1].fuel_pressure").scale(Ten),
    Metric::new(V5,       70, Hp1,   "engine[1].horsepower"),
    Metric::new(V4,       71, LAux,  "left_aux.fuel_level").scale(TenIfGph),
    Metric::new(V5,       71, FLvl13,"engine[1].fuel_level[3]").scale(TenIfGph),

    // map byte 9, slots 72-77 unassigned pending captures
    Metric::new(V4|V5,    74,     Torq1, "engine[1].torque"),
    Metric::wide(V4|V5,   78, 79, Hrs1,  "engine[1].hours").scale(Ten),

    // map byte 10
    Metric::new(V4|V5, 83, Alt, "altitude").init_neg_one(),
    Metric::new(V4,    84, RAux,"right_aux.fuel_level").scale(TenIfGph),
    Metric::new(V4|V5, 85, Spd, "airspeed").init_neg_one(),
    Metric::new(V4|V5, 86, Lat, "latitude").init_zero(),
    Metric::new(V4|V5, 87, Lng, "longitude").init_zero(),

    // map byte 11
    Metric::new(V5, 88, Map2,  "engine[2].manifold_pressure").scale(Ten),
    Metric::new(V5, 89, Hp2,   "engine[2].horsepower"),
    Metric::new(V5, 90, Iat2,  "engine[2].induction_air_temperature"),
    Metric::new(V5, 91, FLvl21,"engine[2].fuel_level[1]").scale(TenIfGph),
    Metric::new(V5, 92, FLvl22,"engine[2].fuel_level[2]").scale(TenIfGph),
    Metric::new(V5, 93, Fp2,   "engine[2].fuel_pressure").scale(Ten),
    Metric::new(V5, 94, OilP2, "engine[2].oil_pressure").scale(Ten),
    Metric::new(V5, 95, FLvl23,"engine[2].fuel_level[3]").scale(TenIfGph),

    // map byte 12, slots 96-101 unassigned pending captures
    Metric::new(V5,  98,      Torq2, "engine[2].torque"),
    Metric::wide(V5, 102, 103, Hrs2, "engine[2].hours").scale(Ten),

    // map byte 13
    Metric::wide(V5, 104, 108, Egt17, "engine[1].exhaust_gas_temperature[7]"),
    Metric::wide(V5, 105, 109, Egt18, "engine[1].exhaust_gas_temperature[8]"),
    Metric::wide(V5, 106, 110, Egt19, "engine[1].exhaust_gas_temperature[9]"),
    Metric::new(V5,  107,      Ff12,  "engine[1].fuel_flow[2]").scale(TenIfGph),
    Metric::new(V5,  111,      HydP11,"engine[1].hydraulic_pressure[1]"),

    // map byte 14
    Metric::wide(V5, 112, 116, Egt27, "engine[2].exhaust_gas_temperature[7]"),
    Metric::wide(V5, 113, 117, Egt28, "engine[2].exhaust_gas_temperature[8]"),
    Metric::wide(V5, 114, 118, Egt29, "engine[2].exhaust_gas_temperature[9]"),
    Metric::new(V5,  115,      Ff22,  "engine[2].fuel_flow[2]").scale(TenIfGph),
    Metric::new(V5,  119,      HydP21,"engine[2].hydraulic_pressure[1]"),

    // map byte 15
    Metric::new(V5, 120, Cht17, "engine[1].cylinder_head_temperature[7]"),
    Metric::new(V5, 121, Cht18, "engine[1].cylinder_head_temperature[8]"),
    Metric::new(V5, 122, Cht19, "engine[1].cylinder_head_temperature[9]"),
    Metric::new(V5, 123, HydP12,"engine[1].hydraulic_pressure[2]"),
    Metric::new(V5, 124, Cht27, "engine[2].cylinder_head_temperature[7]"),
    Metric::new(V5, 125, Cht28, "engine[2].cylinder_head_temperature[8]"),
    Metric::new(V5, 126, Cht29, "engine[2].cylinder_head_temperature[9]"),
    Metric::new(V5, 127, HydP22,"engine[2].hydraulic_pressure[2]"),
];

/// Resolve the table for one protocol generation, keyed by low slot.
///
/// Keeps the first row on a slot collision; collisions within one generation
/// indicate a table bug and are logged.
pub fn bit_to_metric_map(version: ProtocolVersion) -> BTreeMap<u8, &'static Metric> {
    let mut map = BTreeMap::new();
    for metric in METRICS {
        if !metric.applies_to(version) {
            continue;
        }
        if map.contains_key(&metric.low_bit) {
            warn!(
                "duplicate metric assignment for slot {} ({:?})",
                metric.low_bit, version
            );
            continue;
        }
        map.insert(metric.low_bit, metric);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_slot_collisions_within_any_version() {
        for version in [
            ProtocolVersion::V1,
            ProtocolVersion::V2,
            ProtocolVersion::V3,
            ProtocolVersion::V4,
            ProtocolVersion::V5,
        ] {
            let mut seen = [false; 128];
            for metric in METRICS.iter().filter(|m| m.applies_to(version)) {
                assert!(
                    !seen[metric.low_bit as usize],
                    "{version:?} assigns slot {} twice",
                    metric.low_bit
                );
                seen[metric.low_bit as usize] = true;
            }
        }
    }

    #[test]
    fn slot_24_depends_on_version() {
        let single = bit_to_metric_map(ProtocolVersion::V4);
        let twin = bit_to_metric_map(ProtocolVersion::V2);
        assert_eq!(single[&24].id, MetricId::Egt17);
        assert_eq!(twin[&24].id, MetricId::Egt21);
    }

    #[test]
    fn mark_is_universal() {
        for version in [
            ProtocolVersion::V1,
            ProtocolVersion::V2,
            ProtocolVersion::V3,
            ProtocolVersion::V4,
            ProtocolVersion::V5,
        ] {
            assert_eq!(bit_to_metric_map(version)[&16].id, MetricId::Mark);
        }
    }

    #[test]
    fn v5_covers_the_widest_slot_range() {
        let v1 = bit_to_metric_map(ProtocolVersion::V1);
        let v5 = bit_to_metric_map(ProtocolVersion::V5);
        assert!(v5.len() > v1.len());
        assert_eq!(*v5.last_key_value().unwrap().0, 127);
    }

    #[test]
    fn high_companions_stay_inside_the_field_map() {
        for metric in METRICS {
            if let Some(high) = metric.high_bit {
                assert!((high as usize) < crate::consts::MAX_METRIC_FIELDS);
                assert_ne!(high, metric.low_bit);
            }
        }
    }

    #[test]
    fn twin_tit_slots_start_at_zero() {
        let twin = bit_to_metric_map(ProtocolVersion::V2);
        assert_eq!(twin[&30].init, Init::Zero);
        assert_eq!(twin[&31].init, Init::Zero);
        assert_eq!(twin[&0].init, Init::Default);
    }
}
