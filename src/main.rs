//! Sky1 ACPI-to-devicetree generator.
//!
//! Converts an on-target firmware extraction (disassembled ACPI tables
//! plus sidecar captures) into a devicetree source file.
//!
//! Pipeline: read summary → parse tables → extract board context →
//!           read sidecars → emit DTS → report.

mod acpi;
mod cli;
mod diag;
mod dts;
mod model;
mod report;
mod sidecar;
mod symbols;

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;

use diag::Diag;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cmd_generate(&cli)
}

fn cmd_generate(cli: &cli::Cli) -> Result<()> {
    let dir = cli.extract_dir.as_path();
    if !dir.is_dir() {
        bail!("extraction directory {} does not exist", dir.display());
    }
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| dir.join("generated.dts"));

    let diag = Diag::new(cli.quiet, cli.verbose);
    let started = Instant::now();

    let summary = sidecar::read_summary(dir, &diag)?;
    diag.phase(&format!(
        "Board: {} ({} cores)",
        summary.board.model(),
        summary.cores
    ));

    // The power-button HID is tabulated but shaped like a plug-and-play
    // ID; it rides the allowlist through the filter.
    let mut allow = vec!["PNP0C0C".to_string()];
    allow.extend(cli.allow_hid.iter().cloned());

    let mut tables = acpi::load_tables(dir, &allow, &diag)?;
    let extras = acpi::extract_board_extras(&mut tables.devices);

    // The runtime dump is a fallback for firmware that declares no fixed
    // regulators in its supplementary tables.
    let regulators = if extras.regulators.is_empty() {
        sidecar::read_regulator_dump(dir, &diag)
    } else {
        extras.regulators
    };

    let ctx = model::BoardContext {
        summary,
        regulators,
        leds: extras.leds,
        has_power_button: extras.has_power_button,
        power_button_gpio: extras.power_button_gpio,
        panel_compatible: extras.panel_compatible,
        has_backlight: extras.has_backlight,
        i2c_probe: sidecar::read_i2c_probe(dir, &diag),
    };

    if let Some(path) = &cli.dump_model {
        dump_model(path, &ctx, &tables, &diag)?;
    }

    diag.phase("Emitting devicetree...");
    let tally = report::DeviceTally::collect(&tables.devices);
    let stats = tables.stats;
    let dts_text = dts::render(&ctx, tables.devices);

    fs::write(&output, &dts_text)
        .with_context(|| format!("failed to write {}", output.display()))?;
    diag.phase(&format!("Wrote {}", output.display()));
    diag.note(&format!("generation took {:.1?}", started.elapsed()));

    report::print_report(&stats, &tally, &dts_text);
    Ok(())
}

/// Serialize the parsed model as JSON for offline inspection.
fn dump_model(
    path: &Path,
    ctx: &model::BoardContext,
    tables: &acpi::TableSet,
    diag: &Diag,
) -> Result<()> {
    let doc = serde_json::json!({
        "board": ctx,
        "devices": tables.devices,
        "stats": tables.stats,
    });
    let text = serde_json::to_string_pretty(&doc).context("failed to serialize model")?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    diag.phase(&format!("Dumped model to {}", path.display()));
    Ok(())
}
