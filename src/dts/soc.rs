//! The `soc@0` container: one node per recognized peripheral instance.
//!
//! Categories come out in a fixed order, instances within a category by
//! unique-ID, so regeneration never reshuffles the tree. Unknown
//! hardware-IDs still get a best-effort node; the report flags them.

use crate::dts::writer::{DtsWriter, reg_cells};
use crate::model::{BoardContext, Device};
use crate::symbols::{self, Category};

/// Default i2c bus frequency when the firmware does not declare one.
const I2C_DEFAULT_HZ: u32 = 100_000;
/// The UART wired to the debug console.
const CONSOLE_UART_UID: u32 = 3;

pub fn emit_soc(w: &mut DtsWriter, devices: &[Device], ctx: &BoardContext, cru_cells: u32) {
    w.open("soc@0");
    w.prop_str("compatible", "simple-bus");
    w.prop_u32("#address-cells", 2);
    w.prop_u32("#size-cells", 2);
    w.prop_flag("ranges");

    let mut ordered: Vec<(usize, &Device)> = devices
        .iter()
        .filter_map(|dev| {
            symbols::category_for(&dev.hid)
                .soc_order()
                .map(|order| (order, dev))
        })
        .collect();
    ordered.sort_by_key(|(order, dev)| (*order, dev.uid));

    for (_, dev) in ordered {
        w.blank();
        emit_device(w, dev, ctx, cru_cells);
    }

    w.close();
}

fn emit_device(w: &mut DtsWriter, dev: &Device, ctx: &BoardContext, cru_cells: u32) {
    let category = symbols::category_for(&dev.hid);
    let label = symbols::node_label(category, dev.uid);
    let prefix = category.node_prefix();

    let header = match dev.window {
        Some(window) => format!("{label}: {prefix}@{:08x}", window.base),
        None => format!("{label}: {prefix}-{}", dev.uid),
    };
    w.open(&header);

    // Untabulated hardware-IDs pass through verbatim so the node stays
    // greppable back to the firmware.
    match symbols::compatible_for(&dev.hid) {
        Some(compatible) => w.prop_str("compatible", compatible),
        None => w.prop_str("compatible", &dev.hid),
    }

    if let Some(window) = dev.window {
        w.prop_cells("reg", &reg_cells(window.base, window.length));
    }
    if let Some(irq) = dev.interrupt {
        w.prop_cells(
            "interrupts",
            &format!("GIC_SPI {} IRQ_TYPE_LEVEL_HIGH", symbols::spi_number(irq)),
        );
    }

    if let Some(clock) = &dev.clock {
        if cru_cells == 1 {
            w.prop_cells("clocks", &format!("&cru {}", clock.id));
        } else {
            w.prop_cells("clocks", "&cru");
        }
        if !clock.name.is_empty() {
            w.prop_str("clock-names", &clock.name);
        }
    }
    if let Some(reset) = &dev.reset {
        let controller = symbols::controller_label(&reset.controller);
        w.prop_cells("resets", &format!("&{} {}", controller, reset.id));
        if !reset.name.is_empty() {
            w.prop_str("reset-names", &reset.name);
        }
    }
    if let Some(group) = dev.pin_groups.first() {
        w.prop_str("pinctrl-names", "default");
        w.prop_cells("pinctrl-0", &format!("&{group}"));
    }

    emit_category_details(w, dev, category);
    w.prop_str("status", device_status(dev, category));

    match category {
        Category::I2c => emit_i2c_children(w, dev, ctx),
        Category::Ethernet => emit_mdio(w, dev),
        _ => {}
    }

    w.close();
}

/// Category-specific scalars and controller markers.
fn emit_category_details(w: &mut DtsWriter, dev: &Device, category: Category) {
    match category {
        Category::I2c => {
            w.prop_u32("#address-cells", 1);
            w.prop_u32("#size-cells", 0);
            let hz = dev.prop_int("clock-frequency").unwrap_or(I2C_DEFAULT_HZ as u64);
            w.prop_u32("clock-frequency", hz as u32);
        }
        Category::Serial => {
            if let Some(speed) = dev.prop_int("current-speed") {
                w.prop_u32("current-speed", speed as u32);
            }
        }
        Category::Gpio => {
            w.prop_flag("gpio-controller");
            w.prop_u32("#gpio-cells", 2);
            w.prop_flag("interrupt-controller");
            w.prop_u32("#interrupt-cells", 2);
        }
        Category::Usb => {
            if let Some(mode) = dev.prop_str("dr_mode") {
                w.prop_str("dr_mode", mode);
            }
            if let Some(speed) = dev.prop_str("maximum-speed") {
                w.prop_str("maximum-speed", speed);
            }
        }
        Category::Ethernet => {
            if let Some(mode) = dev.prop_str("phy-mode") {
                w.prop_str("phy-mode", mode);
            }
        }
        Category::Pcie => {
            if let Some(lanes) = dev.prop_int("num-lanes") {
                w.prop_u32("num-lanes", lanes as u32);
            }
            if let Some(speed) = dev.prop_int("max-link-speed") {
                w.prop_u32("max-link-speed", speed as u32);
            }
        }
        _ => {}
    }
}

/// Watchdogs and non-console UARTs start disabled; everything else is
/// enabled as parsed.
fn device_status(dev: &Device, category: Category) -> &'static str {
    match category {
        Category::Watchdog => "disabled",
        Category::Serial if dev.uid != CONSOLE_UART_UID => "disabled",
        _ => "okay",
    }
}

/// One placeholder child per address the sidecar probe reported on this
/// bus.
fn emit_i2c_children(w: &mut DtsWriter, dev: &Device, ctx: &BoardContext) {
    for addr in ctx.i2c_probe.on_bus(dev.uid) {
        w.blank();
        w.comment("unidentified device reported by the bus probe");
        w.open(&format!("device@{addr:02x}"));
        w.prop_cells("reg", &format!("0x{addr:02x}"));
        w.close();
    }
}

/// The MDIO bus beneath an Ethernet MAC, with one PHY child per declared
/// firmware child device.
fn emit_mdio(w: &mut DtsWriter, dev: &Device) {
    if dev.children.is_empty() {
        return;
    }

    w.blank();
    w.open("mdio");
    w.prop_str("compatible", "snps,dwmac-mdio");
    w.prop_u32("#address-cells", 1);
    w.prop_u32("#size-cells", 0);

    for child in &dev.children {
        let adr = child.adr.unwrap_or(0);
        w.blank();
        w.open(&format!("ethernet-phy@{adr}"));
        let compatible = child
            .prop_str("compatible")
            .unwrap_or("ethernet-phy-ieee802.3-c22");
        w.prop_str("compatible", compatible);
        w.prop_u32("reg", adr as u32);
        w.close();
    }

    w.close();
}
