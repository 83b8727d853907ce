//! Runtime sidecar readers.
//!
//! Alongside the disassembled tables, the extraction step captures a small
//! set of on-target artifacts: an identification summary, an i2c-bus probe
//! grid, and a regulator dump. The summary is mandatory; the rest degrade
//! to empty records with a warning.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::diag::Diag;
use crate::model::{BoardIdentity, I2cProbe, RegulatorDef, SummaryInfo};

/// Mandatory identification summary.
pub const SUMMARY_FILE: &str = "00-summary.txt";
/// Optional i2c probe grid.
pub const I2C_FILE: &str = "06-i2c.txt";
/// Optional regulator dump.
pub const REGULATOR_FILE: &str = "12-regulators.txt";

static CORES_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Cores:\s*(\d+)").unwrap());
static I2C_SECTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--- i2c-(\d+) ---").unwrap());
static DETECT_ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9a-f]{2}):(.*)$").unwrap());
static HEX_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{2}$").unwrap());
static MILLIVOLTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)mV$").unwrap());

/// Core count assumed when the summary does not say.
const DEFAULT_CORES: u32 = 12;

/// Read the identification summary and detect the board variant.
///
/// The variant marker is a plain substring test: `O6N` or `CD8160`
/// anywhere in the summary selects the N-variant identity.
pub fn read_summary(dir: &Path, diag: &Diag) -> Result<SummaryInfo> {
    let path = dir.join(SUMMARY_FILE);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("missing identification summary {}", path.display()))?;

    let board = if text.contains("O6N") || text.contains("CD8160") {
        BoardIdentity::OrionO6N
    } else {
        BoardIdentity::OrionO6
    };

    let cores = CORES_LINE
        .captures(&text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(DEFAULT_CORES);

    let acpi_boot = text
        .lines()
        .any(|l| l.starts_with("Boot mode:") && l.contains("ACPI"));
    if !acpi_boot {
        diag.warn("summary lacks the ACPI boot marker; tables may be stale");
    }

    Ok(SummaryInfo {
        board,
        cores,
        acpi_boot,
    })
}

/// Read the i2c probe grid into (bus, address) pairs.
///
/// Any two-hex-digit cell in a detection row that is not `--` (absent) and
/// not `UU` (claimed by a driver) is a detected address on the section's
/// bus. A missing file yields an empty probe.
pub fn read_i2c_probe(dir: &Path, diag: &Diag) -> I2cProbe {
    let path = dir.join(I2C_FILE);
    let Ok(text) = fs::read_to_string(&path) else {
        diag.warn("no i2c probe dump; child placeholders will be omitted");
        return I2cProbe::default();
    };

    let mut probe = I2cProbe::default();
    let mut bus: Option<u32> = None;

    for line in text.lines() {
        if let Some(caps) = I2C_SECTION.captures(line) {
            bus = caps[1].parse().ok();
            continue;
        }
        let (Some(bus), Some(caps)) = (bus, DETECT_ROW.captures(line)) else {
            continue;
        };
        for cell in caps[2].split_whitespace() {
            if HEX_CELL.is_match(cell) {
                if let Ok(addr) = u8::from_str_radix(cell, 16) {
                    probe.addresses.push((bus, addr));
                }
            }
        }
    }

    diag.note(&format!(
        "i2c probe: {} detected addresses",
        probe.addresses.len()
    ));
    probe
}

/// Read the runtime regulator dump (a captured `regulator_summary` table).
///
/// Each data row contributes (name, microvolts, always-on): the name is
/// the first column, a non-zero use count marks the regulator always-on,
/// and the first `<n>mV` column carries the voltage. The synthetic dummy
/// regulator and rows without a voltage are skipped.
pub fn read_regulator_dump(dir: &Path, diag: &Diag) -> Vec<RegulatorDef> {
    let path = dir.join(REGULATOR_FILE);
    let Ok(text) = fs::read_to_string(&path) else {
        diag.warn("no regulator dump; skipping runtime regulators");
        return Vec::new();
    };

    let mut out = Vec::new();
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else { continue };
        if name == "regulator" || name.starts_with('-') || name == "regulator-dummy" {
            continue;
        }
        let Some(use_count) = tokens.next().and_then(|t| t.parse::<u32>().ok()) else {
            continue;
        };
        let Some(millivolts) = tokens.find_map(|t| {
            MILLIVOLTS
                .captures(t)
                .and_then(|caps| caps[1].parse::<u32>().ok())
        }) else {
            continue;
        };
        if millivolts == 0 {
            continue;
        }
        out.push(RegulatorDef {
            name: name.to_string(),
            microvolts: millivolts * 1000,
            always_on: use_count > 0,
        });
    }

    diag.note(&format!("regulator dump: {} regulators", out.len()));
    out
}
