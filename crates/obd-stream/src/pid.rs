//! OBD-II PID Definitions and Registry
//!
//! Defines the standard Mode 01 Parameter IDs (PIDs), their decoding formulas,
//! and the registry the response decoder looks them up in.

use crate::payload::data_bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decoded value of a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PidValue {
    /// Physical quantity
    Number(f64),
    /// Textual value (e.g. encoded status strings)
    Text(String),
}

impl fmt::Display for PidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidValue::Number(n) => write!(f, "{}", n),
            PidValue::Text(s) => f.write_str(s),
        }
    }
}

/// Decoder for a single parameter.
///
/// Both decode methods receive the full frame text (mode and parameter
/// groups included) and return `None` if the payload is too short.
pub trait ParameterDefinition: Send + Sync {
    /// Decode the frame to a value
    fn value_from_bytes(&self, frame: &str) -> Option<PidValue>;

    /// Decode the frame to a human-readable string
    fn formatted_from_bytes(&self, frame: &str) -> Option<String>;

    /// Number of data bytes this parameter consumes
    fn parseable_byte_count(&self) -> usize;
}

/// Lookup of parameter definitions by code
pub trait ParameterRegistry: Send + Sync {
    /// Find the definition for an uppercase two-digit parameter code
    fn lookup(&self, code: &str) -> Option<&dyn ParameterDefinition>;
}

/// Standard OBD-II PIDs for Mode 01 (current data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pid {
    /// Calculated engine load (0x04)
    EngineLoad = 0x04,
    /// Engine coolant temperature (0x05)
    CoolantTemp = 0x05,
    /// Short-term fuel trim bank 1 (0x06)
    ShortFuelTrim = 0x06,
    /// Long-term fuel trim bank 1 (0x07)
    LongFuelTrim = 0x07,
    /// Intake manifold absolute pressure (0x0B)
    IntakeManifoldPressure = 0x0B,
    /// Engine RPM (0x0C)
    Rpm = 0x0C,
    /// Vehicle speed (0x0D)
    Speed = 0x0D,
    /// Mass air flow rate (0x10)
    Maf = 0x10,
    /// Throttle position (0x11)
    ThrottlePosition = 0x11,
    /// Oxygen sensor voltage bank 1, sensor 1 (0x14)
    O2Voltage = 0x14,
}

impl Pid {
    /// Every PID with a built-in decoder
    pub const ALL: [Pid; 10] = [
        Pid::EngineLoad,
        Pid::CoolantTemp,
        Pid::ShortFuelTrim,
        Pid::LongFuelTrim,
        Pid::IntakeManifoldPressure,
        Pid::Rpm,
        Pid::Speed,
        Pid::Maf,
        Pid::ThrottlePosition,
        Pid::O2Voltage,
    ];

    /// Get the PID hex value
    pub fn as_hex(&self) -> u8 {
        *self as u8
    }

    /// Two-digit uppercase code as it appears in responses
    pub fn code(&self) -> String {
        format!("{:02X}", self.as_hex())
    }

    /// Look up a PID by its numeric value
    pub fn from_hex(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|pid| pid.as_hex() == value)
    }

    /// Get the number of response bytes for this PID
    pub fn response_bytes(&self) -> usize {
        match self {
            Pid::Rpm | Pid::Maf | Pid::O2Voltage => 2,
            _ => 1,
        }
    }

    /// Unit suffix for formatted values
    pub fn unit(&self) -> &'static str {
        match self {
            Pid::Rpm => "rpm",
            Pid::Speed => "km/h",
            Pid::CoolantTemp => "°C",
            Pid::IntakeManifoldPressure => "kPa",
            Pid::Maf => "g/s",
            Pid::O2Voltage => "V",
            Pid::EngineLoad | Pid::ShortFuelTrim | Pid::LongFuelTrim | Pid::ThrottlePosition => {
                "%"
            }
        }
    }

    /// Apply the PID formula to its data bytes
    pub fn decode_value(&self, bytes: &[u8]) -> Option<f64> {
        let a = *bytes.first()? as f64;
        let value = match self {
            // RPM: ((A*256)+B)/4
            Pid::Rpm => (a * 256.0 + *bytes.get(1)? as f64) / 4.0,
            // Speed: A (km/h)
            Pid::Speed => a,
            // Coolant Temp: A - 40 (°C)
            Pid::CoolantTemp => a - 40.0,
            // Engine Load / Throttle: A * 100 / 255 (%)
            Pid::EngineLoad | Pid::ThrottlePosition => a * 100.0 / 255.0,
            // MAF: ((A*256)+B) / 100 (g/s)
            Pid::Maf => (a * 256.0 + *bytes.get(1)? as f64) / 100.0,
            // Short/Long fuel trim: (A - 128) * 100 / 128 (%)
            Pid::ShortFuelTrim | Pid::LongFuelTrim => (a - 128.0) * 100.0 / 128.0,
            // O2 Voltage: A / 200 (V), B is the trim byte
            Pid::O2Voltage => a / 200.0,
            // Intake manifold pressure: A (kPa)
            Pid::IntakeManifoldPressure => a,
        };
        Some(value)
    }

    fn frame_value(&self, frame: &str) -> Option<f64> {
        let bytes = data_bytes(frame, self.response_bytes())?;
        self.decode_value(&bytes)
    }
}

impl ParameterDefinition for Pid {
    fn value_from_bytes(&self, frame: &str) -> Option<PidValue> {
        self.frame_value(frame).map(PidValue::Number)
    }

    fn formatted_from_bytes(&self, frame: &str) -> Option<String> {
        let value = self.frame_value(frame)?;
        let formatted = match self {
            Pid::Rpm | Pid::Speed | Pid::CoolantTemp | Pid::IntakeManifoldPressure => {
                format!("{:.0}{}", value, self.unit())
            }
            Pid::O2Voltage => format!("{:.3}{}", value, self.unit()),
            _ => format!("{:.2}{}", value, self.unit()),
        };
        Some(formatted)
    }

    fn parseable_byte_count(&self) -> usize {
        self.response_bytes()
    }
}

/// Registry of parameter definitions keyed by uppercase hex code
#[derive(Default, Clone)]
pub struct PidRegistry {
    definitions: HashMap<String, Arc<dyn ParameterDefinition>>,
}

impl PidRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in [`Pid`]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for pid in Pid::ALL {
            registry.register(&pid.code(), Arc::new(pid));
        }
        registry
    }

    /// Add or replace the definition for `code`
    pub fn register(&mut self, code: &str, definition: Arc<dyn ParameterDefinition>) {
        self.definitions
            .insert(code.trim().to_ascii_uppercase(), definition);
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ParameterRegistry for PidRegistry {
    fn lookup(&self, code: &str) -> Option<&dyn ParameterDefinition> {
        self.definitions
            .get(&code.to_ascii_uppercase())
            .map(|definition| definition.as_ref())
    }
}

impl fmt::Debug for PidRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.definitions.keys().collect();
        codes.sort();
        f.debug_struct("PidRegistry").field("codes", &codes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpm_decode() {
        // 1A 2B => ((0x1A * 256) + 0x2B) / 4 = (26*256 + 43) / 4 = 6699/4 = 1674.75
        let value = Pid::Rpm.value_from_bytes("410C1A2B");
        assert_eq!(value, Some(PidValue::Number(1674.75)));
    }

    #[test]
    fn test_coolant_temp_decode() {
        // 0x73 = 115, so temp = 115 - 40 = 75°C
        let value = Pid::CoolantTemp.decode_value(&[0x73]).unwrap();
        assert!((value - 75.0).abs() < 0.01);
        assert_eq!(
            Pid::CoolantTemp.formatted_from_bytes("410573").as_deref(),
            Some("75°C")
        );
    }

    #[test]
    fn test_speed_decode() {
        // 0x55 = 85 km/h
        assert_eq!(
            Pid::Speed.formatted_from_bytes("410D55").as_deref(),
            Some("85km/h")
        );
    }

    #[test]
    fn test_fuel_trim_decode() {
        // 0x80 = 128, so trim = (128-128)*100/128 = 0%
        let value = Pid::ShortFuelTrim.decode_value(&[0x80]).unwrap();
        assert!((value - 0.0).abs() < 0.01);

        // 0x90 = 144, so trim = (144-128)*100/128 = 12.5%
        let value = Pid::ShortFuelTrim.decode_value(&[0x90]).unwrap();
        assert!((value - 12.5).abs() < 0.01);
    }

    #[test]
    fn test_short_payload() {
        assert_eq!(Pid::Rpm.value_from_bytes("410C1A"), None);
        assert_eq!(Pid::Maf.formatted_from_bytes("4110"), None);
    }

    #[test]
    fn test_byte_counts() {
        assert_eq!(Pid::Rpm.parseable_byte_count(), 2);
        assert_eq!(Pid::Speed.parseable_byte_count(), 1);
        assert_eq!(Pid::from_hex(0x0C), Some(Pid::Rpm));
        assert_eq!(Pid::from_hex(0xFF), None);
    }

    #[test]
    fn test_standard_registry() {
        let registry = PidRegistry::standard();
        assert_eq!(registry.len(), Pid::ALL.len());
        assert!(registry.lookup("0C").is_some());
        assert!(registry.lookup("0c").is_some());
        assert!(registry.lookup("A6").is_none());
    }

    struct Fixed;

    impl ParameterDefinition for Fixed {
        fn value_from_bytes(&self, _frame: &str) -> Option<PidValue> {
            Some(PidValue::Text("fixed".to_string()))
        }

        fn formatted_from_bytes(&self, _frame: &str) -> Option<String> {
            Some("fixed".to_string())
        }

        fn parseable_byte_count(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = PidRegistry::new();
        registry.register("a6", Arc::new(Fixed));
        let definition = registry.lookup("A6").unwrap();
        assert_eq!(
            definition.value_from_bytes("41A6"),
            Some(PidValue::Text("fixed".to_string()))
        );
    }
}
