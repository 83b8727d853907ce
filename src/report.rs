//! Completion summary on the diagnostic stream.
//!
//! Per-category counts, the per-hardware-ID tally (unknown IDs flagged),
//! the generated line count, and the parse-degradation counters. Printed
//! even in quiet mode — this is the operator's receipt.

use std::collections::BTreeMap;

use crate::model::{Device, ParseStats};
use crate::symbols::{self, Category};

/// Device counts gathered before the list moves into the emitter.
pub struct DeviceTally {
    per_category: BTreeMap<Category, usize>,
    per_hid: BTreeMap<String, usize>,
}

impl DeviceTally {
    pub fn collect(devices: &[Device]) -> Self {
        let mut per_category = BTreeMap::new();
        let mut per_hid = BTreeMap::new();
        for dev in devices {
            *per_category
                .entry(symbols::category_for(&dev.hid))
                .or_insert(0) += 1;
            *per_hid.entry(dev.hid.clone()).or_insert(0) += 1;
        }
        Self {
            per_category,
            per_hid,
        }
    }

    /// Number of devices with untabulated hardware-IDs.
    pub fn unknown_count(&self) -> usize {
        self.per_category
            .get(&Category::Unknown)
            .copied()
            .unwrap_or(0)
    }
}

/// Print the completion summary.
pub fn print_report(stats: &ParseStats, tally: &DeviceTally, dts_text: &str) {
    eprintln!();
    eprintln!("Generated {} devicetree lines.", dts_text.lines().count());

    eprintln!("Peripheral categories:");
    for (category, count) in &tally.per_category {
        eprintln!("  {:<16} {}", category.as_str(), count);
    }

    eprintln!("Hardware-ID tally:");
    for (hid, count) in &tally.per_hid {
        let category = symbols::category_for(hid);
        eprintln!("  {:<10} {:<16} x{}", hid, category.as_str(), count);
    }

    eprintln!(
        "Parse notes: {} devices kept, {} PNP dropped, {} without HID, \
         {} duplicates removed, {} extra memory windows, {} malformed resources.",
        stats.kept,
        stats.dropped_pnp,
        stats.dropped_no_hid,
        stats.deduplicated,
        stats.extra_windows,
        stats.malformed_resources,
    );
    if tally.unknown_count() > 0 {
        eprintln!(
            "note: {} device(s) carry hardware-IDs outside the compatible table",
            tally.unknown_count()
        );
    }
}
