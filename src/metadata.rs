//! File-level metadata assembled from the text headers.

use crate::consts::{
    BUILD_HEADER_V3_THRESHOLD, BUILD_HEADER_V4_THRESHOLD, FIRMWARE_V1_THRESHOLD,
    FLAG_FIRST_CYLINDER, FLAG_TEMP_IN_F, MODEL_760_TWIN, MODEL_900_SERIES, MODEL_960_TWIN,
    PROTO_HEADER_THRESHOLD,
};
use crate::headers::{ConfigInfo, ConfigLimits, FuelLimits, ProtoHeader, TimeStamp};

/// Data record protocol generation.
///
/// Selects which metric table maps delta slots to engine values. Never
/// stated in the file; inferred from model and firmware numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V1,
    V2,
    /// Defined for completeness; no known model/firmware combination
    /// resolves to it, but table rows reference it.
    V3,
    V4,
    V5,
}

impl ProtocolVersion {
    /// Bitmask form, used by metric table rows to state which protocol
    /// generations they apply to.
    pub const fn mask(self) -> u8 {
        match self {
            ProtocolVersion::V1 => 0x01,
            ProtocolVersion::V2 => 0x02,
            ProtocolVersion::V3 => 0x04,
            ProtocolVersion::V4 => 0x08,
            ProtocolVersion::V5 => 0x10,
        }
    }
}

/// Per-flight binary header layout generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVersion {
    V1,
    V2,
    V3,
    V4,
}

/// Everything known about the file before the first flight byte.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub tail_number: String,
    pub config_limits: ConfigLimits,
    pub config_info: ConfigInfo,
    pub fuel_limits: FuelLimits,
    pub proto_header: ProtoHeader,
    pub timestamp: TimeStamp,
}

impl Metadata {
    /// Infer the data record protocol generation.
    pub fn protocol_version(&self) -> ProtocolVersion {
        // Twins first, they carry dedicated models.
        if self.config_info.model == MODEL_760_TWIN {
            return ProtocolVersion::V2;
        }
        if self.config_info.model == MODEL_960_TWIN {
            return ProtocolVersion::V5;
        }

        if self.config_info.model < MODEL_900_SERIES {
            if self.proto_header.value <= PROTO_HEADER_THRESHOLD {
                return ProtocolVersion::V1;
            }
            return ProtocolVersion::V4;
        }

        if self.config_info.firmware_version <= FIRMWARE_V1_THRESHOLD {
            return ProtocolVersion::V1;
        }
        ProtocolVersion::V4
    }

    /// Whether the unit writes the original narrow record layout.
    pub fn is_old_record_format(&self) -> bool {
        matches!(
            self.protocol_version(),
            ProtocolVersion::V1 | ProtocolVersion::V2
        )
    }

    /// Guess the per-flight binary header layout from firmware identity.
    pub fn flight_header_version(&self) -> HeaderVersion {
        if self.proto_header.value > PROTO_HEADER_THRESHOLD
            || self.config_info.model >= MODEL_900_SERIES
        {
            if self.config_info.build_maj > BUILD_HEADER_V4_THRESHOLD {
                return HeaderVersion::V4;
            }
            if self.config_info.build_maj > BUILD_HEADER_V3_THRESHOLD {
                return HeaderVersion::V3;
            }
            return HeaderVersion::V2;
        }
        HeaderVersion::V1
    }

    /// Temperatures in Celsius unless the Fahrenheit flag is set.
    pub fn temp_in_celsius(&self) -> bool {
        self.config_info.flags & FLAG_TEMP_IN_F == 0
    }

    pub fn is_twin_engine(&self) -> bool {
        self.config_info.model == MODEL_760_TWIN || self.config_info.model == MODEL_960_TWIN
    }

    /// Fuel flow in gallons per hour rather than liters.
    pub fn is_gph(&self) -> bool {
        self.fuel_limits.units == 0
    }

    /// Monitored cylinders, counted from the CHT probe flag bits.
    pub fn cylinder_count(&self) -> u32 {
        (0..9)
            .filter(|i| self.config_info.flags & (FLAG_FIRST_CYLINDER << i) != 0)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_model(model: u32) -> Metadata {
        Metadata {
            config_info: ConfigInfo {
                model,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn model_760_is_v2() {
        assert_eq!(with_model(760).protocol_version(), ProtocolVersion::V2);
    }

    #[test]
    fn model_960_is_v5() {
        assert_eq!(with_model(960).protocol_version(), ProtocolVersion::V5);
    }

    #[test]
    fn old_700_series_is_v1() {
        let mut m = with_model(800);
        m.proto_header.value = 1;
        assert_eq!(m.protocol_version(), ProtocolVersion::V1);
        assert!(m.is_old_record_format());
    }

    #[test]
    fn updated_700_series_is_v4() {
        let mut m = with_model(800);
        m.proto_header.value = 2;
        assert_eq!(m.protocol_version(), ProtocolVersion::V4);
    }

    #[test]
    fn early_930_firmware_is_v1() {
        let mut m = with_model(930);
        m.config_info.firmware_version = 108;
        assert_eq!(m.protocol_version(), ProtocolVersion::V1);
    }

    #[test]
    fn later_930_firmware_is_v4() {
        let mut m = with_model(930);
        m.config_info.firmware_version = 200;
        assert_eq!(m.protocol_version(), ProtocolVersion::V4);
        assert!(!m.is_old_record_format());
    }

    #[test]
    fn header_version_follows_build_number() {
        let mut m = with_model(930);
        m.config_info.build_maj = 2012;
        assert_eq!(m.flight_header_version(), HeaderVersion::V4);
        m.config_info.build_maj = 900;
        assert_eq!(m.flight_header_version(), HeaderVersion::V3);
        m.config_info.build_maj = 700;
        assert_eq!(m.flight_header_version(), HeaderVersion::V2);
    }

    #[test]
    fn old_models_without_proto_get_header_v1() {
        let m = with_model(800);
        assert_eq!(m.flight_header_version(), HeaderVersion::V1);
    }

    #[test]
    fn fahrenheit_flag_clears_celsius() {
        let mut m = with_model(930);
        assert!(m.temp_in_celsius());
        m.config_info.flags = 0x1000_0000;
        assert!(!m.temp_in_celsius());
    }

    #[test]
    fn cylinder_flags_are_counted() {
        let mut m = with_model(930);
        m.config_info.flags = 0x4 | 0x8 | 0x10 | 0x20; // four CHT probes
        assert_eq!(m.cylinder_count(), 4);
    }

    #[test]
    fn twins_are_recognized() {
        assert!(with_model(760).is_twin_engine());
        assert!(with_model(960).is_twin_engine());
        assert!(!with_model(930).is_twin_engine());
    }

    #[test]
    fn fuel_units_zero_means_gph() {
        let mut m = with_model(930);
        assert!(m.is_gph());
        m.fuel_limits.units = 1;
        assert!(!m.is_gph());
    }

    #[test]
    fn version_masks_are_distinct_bits() {
        let masks = [
            ProtocolVersion::V1.mask(),
            ProtocolVersion::V2.mask(),
            ProtocolVersion::V3.mask(),
            ProtocolVersion::V4.mask(),
            ProtocolVersion::V5.mask(),
        ];
        let mut seen = 0u8;
        for m in masks {
            assert_eq!(m.count_ones(), 1);
            assert_eq!(seen & m, 0);
            seen |= m;
        }
    }
}
