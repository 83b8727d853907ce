//! Devicetree emission.
//!
//! Model-then-render: the parsers and sidecar readers build the device
//! list and board context, and this module walks them in a fixed order to
//! produce the output text. Everything here is deterministic — same
//! inputs, same bytes out.

pub mod soc;
pub mod writer;

use crate::model::{BoardContext, Device};
use crate::symbols::{self, Category};

use self::writer::{DtsWriter, reg_cells};

/// GICv3 distributor window.
const GICD: (u32, u32) = (0x0e01_0000, 0x0001_0000);
/// GICv3 redistributor window (one 128 KiB frame per core, 12 cores).
const GICR: (u32, u32) = (0x0e09_0000, 0x0018_0000);

/// Cores declared as big cores (`cortex-a720`); the rest are little.
const BIG_CORES: u32 = 4;

/// Render the complete devicetree source.
///
/// The device list is consumed; the board context is borrowed from the
/// driver.
pub fn render(ctx: &BoardContext, devices: Vec<Device>) -> String {
    let mut w = DtsWriter::new();

    emit_header(&mut w, ctx);
    w.open("/");
    emit_root_preamble(&mut w, ctx);
    emit_cpus(&mut w, ctx.summary.cores);
    emit_psci_and_timer(&mut w);
    emit_gic(&mut w);
    let cru_cells = emit_clock_controller(&mut w, &devices);
    emit_reset_controllers(&mut w, &devices);
    emit_regulators(&mut w, ctx);
    emit_board_auxiliaries(&mut w, ctx);
    soc::emit_soc(&mut w, &devices, ctx, cru_cells);
    w.close();

    w.finish()
}

fn emit_header(w: &mut DtsWriter, ctx: &BoardContext) {
    w.raw("// SPDX-License-Identifier: (GPL-2.0-only OR MIT)");
    w.raw("/*");
    w.raw(&format!(" * Devicetree for the {}.", ctx.summary.board.model()));
    w.raw(" *");
    w.raw(" * Generated from the firmware ACPI description and on-target probe");
    w.raw(" * captures. Hand-review before shipping: the firmware does not");
    w.raw(" * describe everything a devicetree can.");
    w.raw(" */");
    w.blank();
    w.raw("/dts-v1/;");
    w.blank();
    w.raw("#include <dt-bindings/interrupt-controller/arm-gic.h>");
    w.blank();
}

fn emit_root_preamble(w: &mut DtsWriter, ctx: &BoardContext) {
    w.prop_str("model", ctx.summary.board.model());
    w.prop_str_list("compatible", ctx.summary.board.compatibles());
    w.prop_cells("interrupt-parent", "&gic");
    w.prop_u32("#address-cells", 2);
    w.prop_u32("#size-cells", 2);
    w.blank();

    w.open("aliases");
    for i in 0..4 {
        w.line(&format!("serial{i} = &uart{i};"));
    }
    for i in 0..6 {
        w.line(&format!("i2c{i} = &i2c{i};"));
    }
    w.close();
    w.blank();

    w.open("chosen");
    w.prop_str("stdout-path", "serial2:115200n8");
    w.close();
    w.blank();

    // The firmware memory map is not recoverable from the tables; assume
    // the stock 16 GiB configuration starting at the DRAM base.
    w.open("memory@80000000");
    w.prop_str("device_type", "memory");
    w.prop_cells("reg", "0x0 0x80000000 0x4 0x00000000");
    w.close();
    w.blank();
}

fn emit_cpus(w: &mut DtsWriter, cores: u32) {
    w.open("cpus");
    w.prop_u32("#address-cells", 1);
    w.prop_u32("#size-cells", 0);

    for core in 0..cores {
        let compatible = if core < BIG_CORES {
            "arm,cortex-a720"
        } else {
            "arm,cortex-a520"
        };
        w.blank();
        w.open(&format!("cpu@{core}"));
        w.prop_str("device_type", "cpu");
        w.prop_str("compatible", compatible);
        w.prop_u32("reg", core);
        w.prop_str("enable-method", "psci");
        w.close();
    }

    w.close();
    w.blank();
}

fn emit_psci_and_timer(w: &mut DtsWriter) {
    w.open("psci");
    w.prop_str("compatible", "arm,psci-1.0");
    w.prop_str("method", "smc");
    w.close();
    w.blank();

    w.open("timer");
    w.prop_str("compatible", "arm,armv8-timer");
    w.line(
        "interrupts = <GIC_PPI 13 IRQ_TYPE_LEVEL_LOW>, <GIC_PPI 14 IRQ_TYPE_LEVEL_LOW>, \
         <GIC_PPI 11 IRQ_TYPE_LEVEL_LOW>, <GIC_PPI 10 IRQ_TYPE_LEVEL_LOW>;",
    );
    w.close();
    w.blank();
}

fn emit_gic(w: &mut DtsWriter) {
    w.open(&format!("gic: interrupt-controller@{:x}", GICD.0));
    w.prop_str("compatible", "arm,gic-v3");
    w.prop_u32("#interrupt-cells", 3);
    w.prop_flag("interrupt-controller");
    w.line(&format!(
        "reg = <{}>, <{}>;",
        reg_cells(GICD.0, GICD.1),
        reg_cells(GICR.0, GICR.1)
    ));
    w.close();
    w.blank();
}

/// Emit the clock controller from the first parsed instance, or a
/// placeholder fixed clock when the firmware declared none.
///
/// Returns the controller's `#clock-cells` so device references stay
/// well-formed against either shape.
fn emit_clock_controller(w: &mut DtsWriter, devices: &[Device]) -> u32 {
    let cru = devices
        .iter()
        .find(|d| symbols::category_for(&d.hid) == Category::Clock);

    match cru {
        Some(dev) => {
            let compatible = symbols::compatible_for(&dev.hid).unwrap_or("cix,sky1-cru");
            match dev.window {
                Some(window) => {
                    w.open(&format!("cru: clock-controller@{:08x}", window.base));
                    w.prop_str("compatible", compatible);
                    w.prop_cells("reg", &reg_cells(window.base, window.length));
                }
                None => {
                    w.open("cru: clock-controller");
                    w.prop_str("compatible", compatible);
                }
            }
            w.prop_u32("#clock-cells", 1);
            w.close();
            w.blank();
            1
        }
        None => {
            w.open("cru: clock-24m");
            w.prop_str("compatible", "fixed-clock");
            w.prop_u32("#clock-cells", 0);
            w.prop_u32("clock-frequency", 24_000_000);
            w.close();
            w.blank();
            0
        }
    }
}

fn emit_reset_controllers(w: &mut DtsWriter, devices: &[Device]) {
    for dev in devices
        .iter()
        .filter(|d| symbols::category_for(&d.hid) == Category::Reset)
    {
        let label = if dev.name.starts_with("RST") {
            symbols::controller_label(&dev.name)
        } else {
            symbols::node_label(Category::Reset, dev.uid)
        };
        let compatible = symbols::compatible_for(&dev.hid).unwrap_or("cix,sky1-reset");
        match dev.window {
            Some(window) => {
                w.open(&format!("{label}: reset-controller@{:08x}", window.base));
                w.prop_str("compatible", compatible);
                w.prop_cells("reg", &reg_cells(window.base, window.length));
            }
            None => {
                w.open(&format!("{label}: reset-controller"));
                w.prop_str("compatible", compatible);
            }
        }
        w.prop_u32("#reset-cells", 1);
        w.close();
        w.blank();
    }
}

fn emit_regulators(w: &mut DtsWriter, ctx: &BoardContext) {
    for reg in &ctx.regulators {
        w.open(&format!(
            "{}: regulator-{}",
            label_name(&reg.name),
            node_name(&reg.name)
        ));
        w.prop_str("compatible", "regulator-fixed");
        w.prop_str("regulator-name", &reg.name);
        if reg.microvolts > 0 {
            w.prop_u32("regulator-min-microvolt", reg.microvolts);
            w.prop_u32("regulator-max-microvolt", reg.microvolts);
        }
        if reg.always_on {
            w.prop_flag("regulator-always-on");
        }
        w.close();
        w.blank();
    }
}

/// Input and display auxiliaries, each present only when the firmware
/// declared it.
fn emit_board_auxiliaries(w: &mut DtsWriter, ctx: &BoardContext) {
    if ctx.has_power_button {
        w.open("gpio-keys");
        w.prop_str("compatible", "gpio-keys");
        w.blank();
        w.open("key-power");
        w.prop_str("label", "power");
        // KEY_POWER
        w.prop_u32("linux,code", 116);
        if let Some(gpio) = &ctx.power_button_gpio {
            // Polarity is not recoverable from the GpioIo descriptor.
            w.prop_cells(
                "gpios",
                &format!("&{} {} 0", symbols::controller_label(&gpio.controller), gpio.pin),
            );
        }
        w.prop_flag("wakeup-source");
        w.close();
        w.close();
        w.blank();
    }

    if !ctx.leds.is_empty() {
        w.open("leds");
        w.prop_str("compatible", "gpio-leds");
        for (i, led) in ctx.leds.iter().enumerate() {
            w.blank();
            w.open(&format!("led-{i}"));
            w.prop_str("label", &led.label);
            w.close();
        }
        w.close();
        w.blank();
    }

    if ctx.has_backlight {
        w.open("backlight: backlight");
        w.prop_str("compatible", "pwm-backlight");
        w.close();
        w.blank();
    }

    if let Some(panel) = &ctx.panel_compatible {
        w.open("panel");
        w.prop_str("compatible", panel);
        if ctx.has_backlight {
            w.prop_cells("backlight", "&backlight");
        }
        w.close();
        w.blank();
    }
}

/// Devicetree node-name form of a free-form name: lowercase, hyphens.
fn node_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Label form of a free-form name: lowercase, underscores.
fn label_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
