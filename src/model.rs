//! Device model and board context types.
//!
//! Pure data types produced by the ACPI parsers and sidecar readers, with
//! no parsing dependencies. The device parser populates a [`Device`] per
//! firmware declaration; the sidecar readers fill a [`BoardContext`]; both
//! are handed read-only to the DTS emitter.

use std::collections::BTreeMap;

use serde::Serialize;

/// A memory-mapped register window from a `Memory32Fixed` descriptor.
///
/// Rendered as a 4-cell `reg` tuple with zeroed high cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceWindow {
    pub base: u32,
    pub length: u32,
}

/// A (controller, pin) pair from a `GpioIo` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpioRef {
    /// Firmware controller name, e.g. `GPI0`.
    pub controller: String,
    pub pin: u32,
}

/// A device's clock gate from the `CLKT` package.
#[derive(Debug, Clone, Serialize)]
pub struct ClockEntry {
    pub id: u32,
    /// Empty when the firmware left the name slot blank.
    pub name: String,
}

/// A device's reset line from the `RSTL` package.
#[derive(Debug, Clone, Serialize)]
pub struct ResetEntry {
    /// Firmware reset-controller symbol, e.g. `RST1`.
    pub controller: String,
    pub id: u32,
    pub name: String,
}

/// A `_DSD` property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropValue {
    Integer(u64),
    Str(String),
    /// A bare property name with no value (boolean true).
    Flag,
}

impl PropValue {
    pub fn as_int(&self) -> Option<u64> {
        match self {
            PropValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A parsed hardware declaration.
///
/// Created on entering a `Device(...)` block, mutated only while parsing
/// that block's contents, frozen on emission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Device {
    /// Symbolic name, e.g. `I2C0`.
    pub name: String,
    /// Hardware-ID string from `_HID`.
    pub hid: String,
    /// Unique-ID from `_UID`; 0 when absent or unparseable.
    pub uid: u32,
    /// Child address from `_ADR` (child devices only).
    pub adr: Option<u64>,
    pub window: Option<ResourceWindow>,
    /// Firmware-absolute interrupt number.
    pub interrupt: Option<u32>,
    /// Pin-group function references, in declaration order.
    pub pin_groups: Vec<String>,
    /// GPIO references, in declaration order.
    pub gpios: Vec<GpioRef>,
    pub clock: Option<ClockEntry>,
    pub reset: Option<ResetEntry>,
    /// Generic `_DSD` property bag.
    pub properties: BTreeMap<String, PropValue>,
    pub children: Vec<Device>,
}

impl Device {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn prop_int(&self, key: &str) -> Option<u64> {
        self.properties.get(key).and_then(PropValue::as_int)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(PropValue::as_str)
    }

    pub fn has_flag(&self, key: &str) -> bool {
        matches!(self.properties.get(key), Some(PropValue::Flag))
    }
}

/// Counters accumulated across the parse, surfaced in the final report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseStats {
    /// Devices kept after the HID filter.
    pub kept: usize,
    /// Devices dropped by the `PNP*` filter.
    pub dropped_pnp: usize,
    /// Devices dropped for lacking a hardware-ID.
    pub dropped_no_hid: usize,
    /// Duplicate (hid, uid) pairs removed by deduplication.
    pub deduplicated: usize,
    /// `Memory32Fixed` descriptors beyond the first on one device.
    pub extra_windows: usize,
    /// Resource descriptors whose literals could not be recovered.
    pub malformed_resources: usize,
}

// ---------------------------------------------------------------------------
// Sidecar records
// ---------------------------------------------------------------------------

/// Detected i2c addresses from the on-target probe grid.
#[derive(Debug, Clone, Default, Serialize)]
pub struct I2cProbe {
    /// (bus index, 7-bit address) pairs in file order.
    pub addresses: Vec<(u32, u8)>,
}

impl I2cProbe {
    /// Addresses detected on one bus, in file order.
    pub fn on_bus(&self, bus: u32) -> impl Iterator<Item = u8> + '_ {
        self.addresses
            .iter()
            .filter(move |(b, _)| *b == bus)
            .map(|(_, a)| *a)
    }
}

/// A fixed-voltage regulator, from supplementary tables or the runtime dump.
#[derive(Debug, Clone, Serialize)]
pub struct RegulatorDef {
    pub name: String,
    pub microvolts: u32,
    pub always_on: bool,
}

/// A board LED recovered from a `gpio-leds` firmware declaration.
///
/// Only the label is captured; the firmware does not describe the
/// controller, pin, or trigger usably.
#[derive(Debug, Clone, Serialize)]
pub struct LedDef {
    pub label: String,
}

/// Board variant, selected by a substring test on the identification summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoardIdentity {
    OrionO6,
    OrionO6N,
}

impl BoardIdentity {
    pub fn model(&self) -> &'static str {
        match self {
            BoardIdentity::OrionO6 => "Cix Sky1 Orion O6",
            BoardIdentity::OrionO6N => "Cix Sky1 Orion O6N",
        }
    }

    /// Root-node compatible list, most specific first.
    pub fn compatibles(&self) -> &'static [&'static str] {
        match self {
            BoardIdentity::OrionO6 => &["cix,sky1-orion-o6", "cix,sky1"],
            BoardIdentity::OrionO6N => &["cix,sky1-orion-o6n", "cix,sky1"],
        }
    }
}

/// Identification summary contents.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryInfo {
    pub board: BoardIdentity,
    /// CPU core count; 12 when the summary does not say.
    pub cores: u32,
    /// Whether the `Boot mode:` line carried the ACPI marker.
    pub acpi_boot: bool,
}

/// Everything the emitter needs besides the device list.
///
/// Owned by the driver; the emitter borrows it read-only.
#[derive(Debug, Clone, Serialize)]
pub struct BoardContext {
    pub summary: SummaryInfo,
    /// Fixed regulators; supplementary-table records win over the runtime dump.
    pub regulators: Vec<RegulatorDef>,
    pub leds: Vec<LedDef>,
    /// A power-button declaration (`ACPI0011`/`PNP0C0C`) was found.
    pub has_power_button: bool,
    /// The button's GPIO wiring, when the declaration carried a `GpioIo`.
    pub power_button_gpio: Option<GpioRef>,
    /// Compatible string of a declared display panel, if any.
    pub panel_compatible: Option<String>,
    /// A `pwm-backlight` declaration was found.
    pub has_backlight: bool,
    pub i2c_probe: I2cProbe,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prop_accessors() {
        let mut dev = Device::new("I2C0");
        dev.properties
            .insert("clock-frequency".into(), PropValue::Integer(400_000));
        dev.properties
            .insert("phy-mode".into(), PropValue::Str("rgmii".into()));
        dev.properties
            .insert("regulator-always-on".into(), PropValue::Flag);

        assert_eq!(dev.prop_int("clock-frequency"), Some(400_000));
        assert_eq!(dev.prop_str("phy-mode"), Some("rgmii"));
        assert!(dev.has_flag("regulator-always-on"));
        assert!(!dev.has_flag("clock-frequency"));
        assert_eq!(dev.prop_int("missing"), None);
    }

    #[test]
    fn i2c_probe_bus_filter() {
        let probe = I2cProbe {
            addresses: vec![(3, 0x51), (3, 0x68), (5, 0x20)],
        };
        let on3: Vec<u8> = probe.on_bus(3).collect();
        assert_eq!(on3, vec![0x51, 0x68]);
        assert_eq!(probe.on_bus(0).count(), 0);
    }

    #[test]
    fn board_identity_strings() {
        assert!(BoardIdentity::OrionO6N.model().ends_with("O6N"));
        assert_eq!(BoardIdentity::OrionO6.compatibles()[1], "cix,sky1");
    }
}
