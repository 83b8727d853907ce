//! Diagnostic stream for the generator.
//!
//! The driver builds one [`Diag`] from the CLI flags and lends it to the
//! table and sidecar loaders. Everything lands on stderr so the generated
//! tree and the commentary about it never share a stream. Three call
//! shapes cover the pipeline: phase progress (`-q` drops it), per-input
//! detail (`-v` adds it), and degraded-input warnings (always printed).
//!
//! The tool is a one-shot batch run, so this is a plain value passed by
//! reference — no process-global state.

pub struct Diag {
    quiet: bool,
    verbose: bool,
}

impl Diag {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self { quiet, verbose }
    }

    /// A phase-progress line, e.g. `Parsing acpi/DSDT.dsl...`.
    pub fn phase(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{msg}");
        }
    }

    /// Indented per-input detail, shown only with `-v`.
    pub fn note(&self, msg: &str) {
        if self.verbose {
            eprintln!("  {msg}");
        }
    }

    /// A degraded-input warning; never suppressed — the operator has to
    /// know which parts of the tree ran on reduced input.
    pub fn warn(&self, msg: &str) {
        eprintln!("warning: {msg}");
    }
}
