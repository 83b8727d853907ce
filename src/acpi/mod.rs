//! Disassembled-table loading and merging.
//!
//! Reads the mandatory primary table (`acpi/DSDT.dsl`) and any
//! supplementary tables (`acpi/SSDT*.dsl`), parses each with the same
//! device walk, concatenates the results, and deduplicates by
//! (hardware-ID, unique-ID) keeping the first occurrence in parse order.

pub mod device;
pub mod lines;
pub mod package;
pub mod resource;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::diag::Diag;
use crate::model::{Device, GpioRef, LedDef, ParseStats, RegulatorDef};

/// The merged parse product of all input tables.
#[derive(Debug)]
pub struct TableSet {
    pub devices: Vec<Device>,
    pub stats: ParseStats,
}

/// Load and parse every table in `<dir>/acpi/`.
pub fn load_tables(dir: &Path, allow: &[String], diag: &Diag) -> Result<TableSet> {
    let acpi_dir = dir.join("acpi");
    let dsdt_path = acpi_dir.join("DSDT.dsl");
    let dsdt = fs::read_to_string(&dsdt_path)
        .with_context(|| format!("missing primary table {}", dsdt_path.display()))?;

    let mut stats = ParseStats::default();
    diag.phase(&format!("Parsing {}...", dsdt_path.display()));
    let mut devices = device::parse_table(&dsdt, allow, &mut stats);
    diag.note(&format!("{} devices from the primary table", devices.len()));

    for path in supplementary_tables(&acpi_dir, diag) {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        diag.phase(&format!("Parsing {}...", path.display()));
        let before = devices.len();
        devices.extend(device::parse_table(&text, allow, &mut stats));
        diag.note(&format!("{} devices", devices.len() - before));
    }

    let mut seen: HashSet<(String, u32)> = HashSet::new();
    devices.retain(|dev| {
        if seen.insert((dev.hid.clone(), dev.uid)) {
            true
        } else {
            stats.deduplicated += 1;
            false
        }
    });
    stats.kept = devices.len();

    Ok(TableSet { devices, stats })
}

/// `SSDT*.dsl` files under the acpi directory, sorted by name.
fn supplementary_tables(acpi_dir: &Path, diag: &Diag) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = match fs::read_dir(acpi_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("SSDT") && n.ends_with(".dsl"))
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    paths.sort();
    if paths.is_empty() {
        diag.warn("no supplementary tables found; regulators may be incomplete");
    }
    paths
}

/// Board-level declarations recovered from the merged device list.
#[derive(Debug, Default)]
pub struct BoardExtras {
    pub regulators: Vec<RegulatorDef>,
    pub leds: Vec<LedDef>,
    pub has_power_button: bool,
    pub power_button_gpio: Option<GpioRef>,
    pub panel_compatible: Option<String>,
    pub has_backlight: bool,
}

/// Pull board-level declarations out of the device list.
///
/// `PRP0001` devices carry a devicetree compatible in their `_DSD` and
/// describe regulators, LEDs, the panel, or the backlight; `ACPI0011`
/// and `PNP0C0C` declare the power button. All are removed from the
/// list — they become dedicated root-level nodes, not peripherals in the
/// `soc` container.
pub fn extract_board_extras(devices: &mut Vec<Device>) -> BoardExtras {
    let mut extras = BoardExtras::default();

    devices.retain(|dev| match dev.hid.as_str() {
        "ACPI0011" | "PNP0C0C" => {
            extras.has_power_button = true;
            if extras.power_button_gpio.is_none() {
                extras.power_button_gpio = dev.gpios.first().cloned();
            }
            false
        }
        "PRP0001" => {
            let compatible = dev.prop_str("compatible").unwrap_or_default().to_string();
            match compatible.as_str() {
                "regulator-fixed" => {
                    extras.regulators.push(regulator_from(dev));
                    false
                }
                "gpio-leds" => {
                    collect_leds(dev, &mut extras.leds);
                    false
                }
                "pwm-backlight" => {
                    extras.has_backlight = true;
                    false
                }
                c if c.contains("panel") => {
                    extras.panel_compatible = Some(compatible);
                    false
                }
                // Unrecognized passthrough devices stay in the list and
                // surface in the unknown tally.
                _ => true,
            }
        }
        _ => true,
    });

    extras
}

fn regulator_from(dev: &Device) -> RegulatorDef {
    let name = dev
        .prop_str("regulator-name")
        .map(str::to_string)
        .unwrap_or_else(|| dev.name.to_lowercase());
    RegulatorDef {
        name,
        microvolts: dev.prop_int("regulator-min-microvolt").unwrap_or(0) as u32,
        always_on: dev.has_flag("regulator-always-on"),
    }
}

/// One LED per labeled declaration: the device's own label plus any
/// labeled children.
fn collect_leds(dev: &Device, leds: &mut Vec<LedDef>) {
    if let Some(label) = dev.prop_str("label") {
        leds.push(LedDef {
            label: label.to_string(),
        });
    }
    for child in &dev.children {
        if let Some(label) = child.prop_str("label") {
            leds.push(LedDef {
                label: label.to_string(),
            });
        }
    }
}
