//! Command-line interface definitions for sky1-dtsgen.

use std::path::PathBuf;

use clap::Parser;

/// Sky1 ACPI-to-devicetree generator.
///
/// Converts a firmware extraction directory (disassembled ACPI tables plus
/// runtime-captured sidecar files) into a devicetree source file for the
/// Sky1 SoC.
#[derive(Parser)]
#[command(name = "sky1-dtsgen", version, about)]
pub struct Cli {
    /// Extraction directory produced by the on-target capture step.
    pub extract_dir: PathBuf,

    /// Output DTS path (default: <extract_dir>/generated.dts).
    pub output: Option<PathBuf>,

    /// Admit an additional PNP* hardware-ID through the parser filter.
    #[arg(long, value_name = "HID")]
    pub allow_hid: Vec<String>,

    /// Write the parsed device model as JSON before emission.
    #[arg(long, value_name = "PATH")]
    pub dump_model: Option<PathBuf>,

    /// Suppress progress output; show only warnings and the final summary.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable per-input detail on the diagnostic stream.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
