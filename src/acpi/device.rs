//! Top-level device walk over one disassembled table.
//!
//! Dispatches on the introducing token of each line: `Device(...)` opens a
//! record, `_HID`/`_UID`/`_ADR` fill identification fields, and the `_CRS`
//! / `CLKT` / `RSTL` / `_DSD` introducers hand the cursor to the resource
//! and package parsers. A device accumulates until the next `Device(...)`
//! line or end of input.

use std::sync::LazyLock;

use regex::Regex;

use crate::acpi::lines::{LineStream, indent_width};
use crate::acpi::resource::{self, Resource};
use crate::acpi::package;
use crate::model::{Device, ParseStats};

/// Indentation of a top-level `Device(...)` line; deeper means child.
const TOP_LEVEL_INDENT: usize = 8;

static DEVICE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)Device \(([A-Za-z0-9_]+)\)").unwrap());
// No closing paren: the disassembler may interject an EISA comment
// between the string and the paren.
static HID_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Name \(_HID, "([^"]+)""#).unwrap());
static UID_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Name \(_UID, (Zero|One|0x[0-9A-Fa-f]+|[0-9]+)\)").unwrap());
static ADR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Name \(_ADR, (Zero|One|0x[0-9A-Fa-f]+|[0-9]+)\)").unwrap());
static CRS_INTRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Name \(_CRS, ResourceTemplate").unwrap());
static CLKT_INTRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Name \(CLKT, Package").unwrap());
static RSTL_INTRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Name \(RSTL, Package").unwrap());
static DSD_INTRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Name \(_DSD, Package").unwrap());

/// Parse one table's text into its device declarations.
///
/// `allow` lists `PNP*` hardware-IDs admitted through the plug-and-play
/// filter. Devices without a hardware-ID (scope containers, methods-only
/// stubs) are dropped and tallied.
pub fn parse_table(source: &str, allow: &[String], stats: &mut ParseStats) -> Vec<Device> {
    let mut stream = LineStream::new(source);
    let mut devices: Vec<Device> = Vec::new();
    let mut current: Option<Device> = None;
    let mut child: Option<Device> = None;

    while let Some(line) = stream.next_line() {
        if let Some(caps) = DEVICE_LINE.captures(line) {
            let indent = indent_width(line);
            let name = caps[2].to_string();

            finish_child(&mut child, &mut current);
            if indent > TOP_LEVEL_INDENT {
                child = Some(Device::new(&name));
            } else {
                finish_device(&mut current, &mut devices, allow, stats);
                current = Some(Device::new(&name));
            }
            continue;
        }

        // Fields belong to the innermost open record.
        let Some(target) = child.as_mut().or(current.as_mut()) else {
            continue;
        };

        if let Some(caps) = HID_LINE.captures(line) {
            target.hid = caps[1].to_string();
        } else if let Some(caps) = UID_LINE.captures(line) {
            target.uid = parse_acpi_int(&caps[1]) as u32;
        } else if let Some(caps) = ADR_LINE.captures(line) {
            target.adr = Some(parse_acpi_int(&caps[1]));
        } else if CRS_INTRO.is_match(line) {
            let resources = resource::parse_crs(&mut stream, stats);
            apply_resources(target, resources, stats);
        } else if CLKT_INTRO.is_match(line) {
            if let Some(entry) = package::parse_clkt(&mut stream) {
                target.clock = Some(entry);
            }
        } else if RSTL_INTRO.is_match(line) {
            if let Some(entry) = package::parse_rstl(&mut stream) {
                target.reset = Some(entry);
            }
        } else if DSD_INTRO.is_match(line) {
            let props = package::parse_dsd(&mut stream);
            target.properties.extend(props);
        }
    }

    finish_child(&mut child, &mut current);
    finish_device(&mut current, &mut devices, allow, stats);
    devices
}

/// `Zero`/`One`/hex/decimal to integer; unparseable becomes 0.
fn parse_acpi_int(raw: &str) -> u64 {
    match raw {
        "Zero" => 0,
        "One" => 1,
        _ => {
            if let Some(hex) = raw.strip_prefix("0x") {
                u64::from_str_radix(hex, 16).unwrap_or(0)
            } else {
                raw.parse().unwrap_or(0)
            }
        }
    }
}

/// Fold recovered resources into the device record.
///
/// The first memory window wins; later windows are tallied and dropped.
fn apply_resources(dev: &mut Device, resources: Vec<Resource>, stats: &mut ParseStats) {
    for res in resources {
        match res {
            Resource::Window(window) => {
                if dev.window.is_none() {
                    dev.window = Some(window);
                } else {
                    stats.extra_windows += 1;
                }
            }
            Resource::Interrupt(irq) => {
                if dev.interrupt.is_none() {
                    dev.interrupt = Some(irq);
                }
            }
            Resource::PinGroup(label) => dev.pin_groups.push(label),
            Resource::Gpio(gpio) => dev.gpios.push(gpio),
        }
    }
}

/// Attach a finished child to its parent.
///
/// Children carrying no address, properties, or hardware-ID have nothing
/// emittable and are dropped silently.
fn finish_child(child: &mut Option<Device>, current: &mut Option<Device>) {
    let Some(dev) = child.take() else { return };
    let useful = dev.adr.is_some() || !dev.properties.is_empty() || !dev.hid.is_empty();
    if let (true, Some(parent)) = (useful, current.as_mut()) {
        parent.children.push(dev);
    }
}

/// Run the hardware-ID filter and move a finished device onto the list.
fn finish_device(
    current: &mut Option<Device>,
    devices: &mut Vec<Device>,
    allow: &[String],
    stats: &mut ParseStats,
) {
    let Some(dev) = current.take() else { return };

    if dev.hid.is_empty() {
        stats.dropped_no_hid += 1;
        return;
    }
    // Tallied rather than logged; the completion report carries the count.
    if dev.hid.starts_with("PNP") && !allow.iter().any(|a| a == &dev.hid) {
        stats.dropped_pnp += 1;
        return;
    }
    devices.push(dev);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropValue;

    const TABLE: &str = r#"DefinitionBlock ("", "DSDT", 2, "CIX   ", "SKY1    ", 0x00000001)
{
    Scope (\_SB)
    {
        Device (I2C0)
        {
            Name (_HID, "CIXH200B")  // _HID: Hardware ID
            Name (_UID, Zero)  // _UID: Unique ID
            Name (_CRS, ResourceTemplate ()  // _CRS: Current Resource Settings
            {
                Memory32Fixed (ReadWrite,
                    0x04010000,         // Address Base
                    0x00010000,         // Address Length
                    )
                Interrupt (ResourceConsumer, Level, ActiveHigh, Exclusive, ,, )
                {
                    0x0000013E,
                }
                PinGroupFunction (Exclusive, 0x0000, "\\_SB.GPI0", 0x00, "pinctrl_fch_i2c0", ResourceConsumer, ,)
            })
            Name (CLKT, Package (0x01)
            {
                Package (0x03)
                {
                    0xFD,
                    "",
                    I2C0
                }
            })
            Name (RSTL, Package (0x01)
            {
                Package (0x04)
                {
                    RST1,
                    0x12,
                    I2C0,
                    "i2c_reset"
                }
            })
            Name (_DSD, Package (0x02)  // _DSD: Device-Specific Data
            {
                ToUUID ("daffd814-6eba-4d8c-8a91-bc9bbf4aa301") /* Device Properties for _DSD */,
                Package (0x01)
                {
                    Package (0x02)
                    {
                        "clock-frequency",
                        0x00061A80
                    }
                }
            })
        }

        Device (PCI0)
        {
            Name (_HID, "PNP0A08")  // _HID: Hardware ID
            Name (_UID, One)  // _UID: Unique ID
        }

        Device (GMA0)
        {
            Name (_HID, "CIXH7020")  // _HID: Hardware ID
            Name (_UID, 0x00)  // _UID: Unique ID
            Device (PHY0)
            {
                Name (_ADR, One)  // _ADR: Address
                Name (_DSD, Package (0x02)  // _DSD: Device-Specific Data
                {
                    ToUUID ("daffd814-6eba-4d8c-8a91-bc9bbf4aa301") /* Device Properties for _DSD */,
                    Package (0x01)
                    {
                        Package (0x02)
                        {
                            "compatible",
                            "ethernet-phy-ieee802.3-c22"
                        }
                    }
                })
            }
        }
    }
}
"#;

    #[test]
    fn parses_full_device() {
        let mut stats = ParseStats::default();
        let devices = parse_table(TABLE, &[], &mut stats);

        let i2c = &devices[0];
        assert_eq!(i2c.name, "I2C0");
        assert_eq!(i2c.hid, "CIXH200B");
        assert_eq!(i2c.uid, 0);
        let window = i2c.window.unwrap();
        assert_eq!(window.base, 0x0401_0000);
        assert_eq!(window.length, 0x0001_0000);
        assert_eq!(i2c.interrupt, Some(0x13E));
        assert_eq!(i2c.pin_groups, vec!["pinctrl_fch_i2c0"]);
        assert_eq!(i2c.clock.as_ref().unwrap().id, 0xFD);
        assert_eq!(i2c.reset.as_ref().unwrap().controller, "RST1");
        assert_eq!(i2c.reset.as_ref().unwrap().id, 0x12);
        assert_eq!(i2c.prop_int("clock-frequency"), Some(0x61A80));
    }

    #[test]
    fn pnp_devices_filtered() {
        let mut stats = ParseStats::default();
        let devices = parse_table(TABLE, &[], &mut stats);
        assert!(devices.iter().all(|d| d.hid != "PNP0A08"));
        assert_eq!(stats.dropped_pnp, 1);
    }

    #[test]
    fn pnp_allowlist_admits() {
        let table = "        Device (PWRB)\n\
                     \x20       {\n\
                     \x20           Name (_HID, \"PNP0C0C\")\n\
                     \x20       }\n";
        let mut stats = ParseStats::default();
        let allowed = parse_table(table, &["PNP0C0C".to_string()], &mut stats);
        assert_eq!(allowed.len(), 1);

        let mut stats = ParseStats::default();
        let denied = parse_table(table, &[], &mut stats);
        assert!(denied.is_empty());
        assert_eq!(stats.dropped_pnp, 1);
    }

    #[test]
    fn child_device_attaches_to_parent() {
        let mut stats = ParseStats::default();
        let devices = parse_table(TABLE, &[], &mut stats);
        let mac = devices.iter().find(|d| d.hid == "CIXH7020").unwrap();
        assert_eq!(mac.children.len(), 1);
        let phy = &mac.children[0];
        assert_eq!(phy.adr, Some(1));
        assert_eq!(
            phy.properties.get("compatible"),
            Some(&PropValue::Str("ethernet-phy-ieee802.3-c22".into()))
        );
    }

    #[test]
    fn uid_zero_one_hex_forms() {
        let table = "        Device (UAR0)\n\
                     \x20       {\n\
                     \x20           Name (_HID, \"ARMH0011\")\n\
                     \x20           Name (_UID, One)\n\
                     \x20       }\n\
                     \x20       Device (UAR2)\n\
                     \x20       {\n\
                     \x20           Name (_HID, \"ARMH0011\")\n\
                     \x20           Name (_UID, 0x03)\n\
                     \x20       }\n\
                     \x20       Device (WDT0)\n\
                     \x20       {\n\
                     \x20           Name (_HID, \"CIXHA000\")\n\
                     \x20       }\n";
        let mut stats = ParseStats::default();
        let devices = parse_table(table, &[], &mut stats);
        assert_eq!(devices[0].uid, 1);
        assert_eq!(devices[1].uid, 3);
        // Missing _UID defaults to 0.
        assert_eq!(devices[2].uid, 0);
    }

    #[test]
    fn devices_without_hid_dropped() {
        let table = "        Device (HELP)\n\
                     \x20       {\n\
                     \x20           Name (_UID, Zero)\n\
                     \x20       }\n";
        let mut stats = ParseStats::default();
        let devices = parse_table(table, &[], &mut stats);
        assert!(devices.is_empty());
        assert_eq!(stats.dropped_no_hid, 1);
    }
}
