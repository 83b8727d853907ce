//! Named-package recognition inside device bodies.
//!
//! Three packages carry device wiring the resource template cannot
//! express: `CLKT` (clock gate), `RSTL` (reset line), and `_DSD` (generic
//! key/value properties). Each parser consumes its package by tracking
//! brace depth from the introducing line and scraping the handful of
//! literal shapes the dialect uses.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::acpi::lines::{LineStream, brace_delta};
use crate::model::{ClockEntry, PropValue, ResetEntry};

static HEX_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"0x([0-9A-Fa-f]+)").unwrap());
static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static QUOTED_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([A-Za-z_][A-Za-z0-9_]*)""#).unwrap());
static RST_SYMBOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(RST[0-9]),?$").unwrap());
static DSD_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^\s*"([^"]*)",$"#).unwrap());
static DSD_STR_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"^\s*"([^"]*)"$"#).unwrap());
static DSD_INT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:0x([0-9A-Fa-f]+)|([0-9]+)),?$").unwrap());

/// Consume a package body, returning its lines.
///
/// The cursor must sit just past the introducing `Name (XXXX, Package`
/// line; on return it sits past the closing `})`. The closing line itself
/// is not part of the body.
fn package_body<'a>(stream: &mut LineStream<'a>) -> Vec<&'a str> {
    let mut rel = 0i32;
    let mut entered = false;
    let mut body = Vec::new();

    while let Some(line) = stream.next_line() {
        rel += brace_delta(line);
        if rel > 0 {
            entered = true;
        }
        if entered && rel <= 0 {
            break;
        }
        body.push(line);
    }
    body
}

/// Parse a `CLKT` package into a clock-table entry.
///
/// The first hex literal on a non-`Package` line is the clock id; the
/// first non-empty quoted string is the clock name. An empty package
/// yields no entry.
pub fn parse_clkt(stream: &mut LineStream) -> Option<ClockEntry> {
    let mut id: Option<u32> = None;
    let mut name = String::new();

    for line in package_body(stream) {
        if line.contains("Package") {
            continue;
        }
        if id.is_none() {
            if let Some(caps) = HEX_LITERAL.captures(line) {
                id = u32::from_str_radix(&caps[1], 16).ok();
            }
        }
        if name.is_empty() {
            if let Some(caps) = QUOTED.captures(line) {
                name = caps[1].to_string();
            }
        }
    }

    id.map(|id| ClockEntry { id, name })
}

/// Parse an `RSTL` package into a reset-table entry.
///
/// Recognizes, in order: the `RST<n>` controller symbol on its own line,
/// the reset id as the first following hex literal, and the reset name as
/// the first following quoted identifier. An empty package yields no
/// entry.
pub fn parse_rstl(stream: &mut LineStream) -> Option<ResetEntry> {
    let mut controller: Option<String> = None;
    let mut id: Option<u32> = None;
    let mut name = String::new();

    for line in package_body(stream) {
        if controller.is_none() {
            if let Some(caps) = RST_SYMBOL.captures(line) {
                controller = Some(caps[1].to_string());
            }
            continue;
        }
        if id.is_none() {
            if let Some(caps) = HEX_LITERAL.captures(line) {
                id = u32::from_str_radix(&caps[1], 16).ok();
            }
            continue;
        }
        if name.is_empty() {
            if let Some(caps) = QUOTED_IDENT.captures(line) {
                name = caps[1].to_string();
            }
        }
    }

    match (controller, id) {
        (Some(controller), Some(id)) => Some(ResetEntry {
            controller,
            id,
            name,
        }),
        _ => None,
    }
}

/// Parse a `_DSD` package into a property bag.
///
/// A `"key",` line opens a pending pair completed by the next integer or
/// quoted-string value line. A quoted name that never receives a value is
/// stored as a boolean flag.
pub fn parse_dsd(stream: &mut LineStream) -> BTreeMap<String, PropValue> {
    let mut props = BTreeMap::new();
    let mut pending: Option<String> = None;

    for line in package_body(stream) {
        if line.contains("ToUUID") || line.trim_start().starts_with("Package") {
            continue;
        }

        if let Some(caps) = DSD_KEY.captures(line) {
            // A key line while another key is pending: the earlier name
            // carried no value and becomes a flag.
            if let Some(flag) = pending.take() {
                props.insert(flag, PropValue::Flag);
            }
            pending = Some(caps[1].to_string());
        } else if let Some(caps) = DSD_INT_VALUE.captures(line) {
            let value = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u64::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse::<u64>().ok(),
                _ => None,
            };
            if let (Some(key), Some(value)) = (pending.take(), value) {
                props.insert(key, PropValue::Integer(value));
            }
        } else if let Some(caps) = DSD_STR_VALUE.captures(line) {
            match pending.take() {
                Some(key) => {
                    props.insert(key, PropValue::Str(caps[1].to_string()));
                }
                None => {
                    props.insert(caps[1].to_string(), PropValue::Flag);
                }
            }
        }
    }

    if let Some(flag) = pending {
        props.insert(flag, PropValue::Flag);
    }
    props
}
