//! Resource descriptor recognition inside `_CRS` blocks.
//!
//! Four descriptor kinds are recovered from a resource template: fixed
//! memory windows, extended interrupts, pin-group function references, and
//! GPIO I/O references. Anything else in the template is skipped. A
//! descriptor whose literals cannot be recovered is tallied as malformed
//! and otherwise ignored; emission later omits the missing field.

use std::sync::LazyLock;

use regex::Regex;

use crate::acpi::lines::{LineStream, brace_delta};
use crate::model::{GpioRef, ParseStats, ResourceWindow};

/// One recovered resource descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Window(ResourceWindow),
    /// Firmware-absolute interrupt number.
    Interrupt(u32),
    /// Pin-group function label, e.g. `pinctrl_fch_i2c0`.
    PinGroup(String),
    Gpio(GpioRef),
}

static HEX8: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"0x([0-9A-F]{8})\b").unwrap());
static INT_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*0x([0-9A-F]+),$").unwrap());
static PIN_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([a-z][A-Za-z0-9_]*)""#).unwrap());
static SB_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\+_SB\.([A-Za-z0-9_]+)").unwrap());
static PIN_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*0x([0-9A-Fa-f]+),?$").unwrap());

/// Returns `true` when a line introduces a descriptor this parser knows.
fn is_descriptor_intro(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("Memory32Fixed")
        || t.starts_with("Interrupt (ResourceConsumer")
        || t.starts_with("PinGroupFunction")
        || t.starts_with("GpioIo")
}

/// Parse a `_CRS` resource template.
///
/// The cursor must sit just past the `Name (_CRS, ResourceTemplate ()`
/// line; on return it sits past the closing `})`. Descriptors are returned
/// in declaration order.
pub fn parse_crs(stream: &mut LineStream, stats: &mut ParseStats) -> Vec<Resource> {
    let mut out = Vec::new();
    let mut rel = 0i32;
    let mut entered = false;

    while let Some(line) = stream.next_line() {
        rel += brace_delta(line);
        if rel > 0 {
            entered = true;
        }
        if entered && rel <= 0 {
            break;
        }

        let t = line.trim_start();
        if t.starts_with("Memory32Fixed") {
            match read_window(stream, rel) {
                Some((window, r)) => {
                    rel = r;
                    out.push(Resource::Window(window));
                }
                None => stats.malformed_resources += 1,
            }
        } else if t.starts_with("Interrupt (ResourceConsumer") {
            match read_interrupt(stream, rel) {
                Some((irq, r)) => {
                    rel = r;
                    out.push(Resource::Interrupt(irq));
                }
                None => stats.malformed_resources += 1,
            }
        } else if t.starts_with("PinGroupFunction") {
            // The label sits on the introducing line itself.
            match PIN_GROUP.captures(line) {
                Some(caps) => out.push(Resource::PinGroup(caps[1].to_string())),
                None => stats.malformed_resources += 1,
            }
        } else if t.starts_with("GpioIo") {
            let before = out.len();
            rel = read_gpio(stream, rel, &mut out);
            if out.len() == before {
                stats.malformed_resources += 1;
            }
        }
    }

    out
}

/// Collect the (base, length) literals following a `Memory32Fixed` line.
///
/// Returns the window and the updated relative depth, or `None` when the
/// literals could not be recovered before the next descriptor.
fn read_window(stream: &mut LineStream, mut rel: i32) -> Option<(ResourceWindow, i32)> {
    let floor = rel;
    let mut values: Vec<u32> = Vec::new();

    while values.len() < 2 {
        let line = stream.peek()?;
        if is_descriptor_intro(line) || rel + brace_delta(line) < floor {
            return None;
        }
        let line = stream.next_line()?;
        rel += brace_delta(line);
        for caps in HEX8.captures_iter(line) {
            if values.len() < 2 {
                // Literals are 8 hex digits; the parse cannot overflow u32.
                values.push(u32::from_str_radix(&caps[1], 16).ok()?);
            }
        }
    }

    Some((
        ResourceWindow {
            base: values[0],
            length: values[1],
        },
        rel,
    ))
}

/// Find the standalone interrupt literal following an `Interrupt` line.
fn read_interrupt(stream: &mut LineStream, mut rel: i32) -> Option<(u32, i32)> {
    let floor = rel;

    loop {
        let line = stream.peek()?;
        if is_descriptor_intro(line) || rel + brace_delta(line) < floor {
            return None;
        }
        let line = stream.next_line()?;
        rel += brace_delta(line);
        if let Some(caps) = INT_LITERAL.captures(line) {
            let irq = u32::from_str_radix(&caps[1], 16).ok()?;
            return Some((irq, rel));
        }
    }
}

/// Recover (controller, pin) pairs from a `GpioIo` descriptor.
///
/// The controller is named on a continuation line (`\_SB.<ID>`); the pin
/// indices follow the `Pin list` marker. Appends one [`Resource::Gpio`]
/// per pin and returns the updated relative depth.
fn read_gpio(stream: &mut LineStream, mut rel: i32, out: &mut Vec<Resource>) -> i32 {
    let floor = rel;
    let mut controller: Option<String> = None;
    let mut in_pin_list = false;

    loop {
        let Some(line) = stream.peek() else {
            return rel;
        };
        if is_descriptor_intro(line) || rel + brace_delta(line) < floor {
            return rel;
        }
        let Some(line) = stream.next_line() else {
            return rel;
        };
        rel += brace_delta(line);

        if controller.is_none() {
            if let Some(caps) = SB_PATH.captures(line) {
                controller = Some(caps[1].to_string());
            }
            continue;
        }

        if line.contains("Pin list") {
            in_pin_list = true;
            continue;
        }

        if in_pin_list {
            if let Some(caps) = PIN_LITERAL.captures(line) {
                if let Ok(pin) = u32::from_str_radix(&caps[1], 16) {
                    out.push(Resource::Gpio(GpioRef {
                        controller: controller.clone().unwrap_or_default(),
                        pin,
                    }));
                }
            } else if line.contains('}') {
                // Pin list exhausted.
                return rel;
            }
        }
    }
}
