//! Firmware-symbol resolution.
//!
//! Three total translations sit between the parsed device model and the
//! emitter: hardware-ID → kernel compatible string, firmware controller
//! symbol → devicetree label, and firmware-absolute interrupt number →
//! bus-relative SPI number.

use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Peripheral category, used for node naming, soc ordering, and the
/// per-category tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Category {
    I2c,
    Serial,
    Gpio,
    Usb,
    Pcie,
    Dp,
    Watchdog,
    Thermal,
    Gpu,
    Ethernet,
    Spi,
    Pwm,
    Npu,
    Vpu,
    Audio,
    Dma,
    Rtc,
    Iommu,
    Mailbox,
    PowerDomain,
    Pinctrl,
    Clock,
    Reset,
    Input,
    Unknown,
}

impl Category {
    /// Label prefix for node labels (`i2c3`, `uart2`, ...).
    pub fn label_prefix(&self) -> &'static str {
        match self {
            Category::I2c => "i2c",
            Category::Serial => "uart",
            Category::Gpio => "gpio",
            Category::Usb => "usb",
            Category::Pcie => "pcie",
            Category::Dp => "dp",
            Category::Watchdog => "wdt",
            Category::Thermal => "tsens",
            Category::Gpu => "gpu",
            Category::Ethernet => "gmac",
            Category::Spi => "spi",
            Category::Pwm => "pwm",
            Category::Npu => "npu",
            Category::Vpu => "vpu",
            Category::Audio => "audio",
            Category::Dma => "dma",
            Category::Rtc => "rtc",
            Category::Iommu => "smmu",
            Category::Mailbox => "mbox",
            Category::PowerDomain => "pd",
            Category::Pinctrl => "pinctrl",
            Category::Clock => "cru",
            Category::Reset => "rst",
            Category::Input => "keys",
            Category::Unknown => "dev",
        }
    }

    /// Node-name prefix (`serial@...`, `i2c@...`).
    pub fn node_prefix(&self) -> &'static str {
        match self {
            Category::I2c => "i2c",
            Category::Serial => "serial",
            Category::Gpio => "gpio",
            Category::Usb => "usb",
            Category::Pcie => "pcie",
            Category::Dp => "dp",
            Category::Watchdog => "watchdog",
            Category::Thermal => "thermal-sensor",
            Category::Gpu => "gpu",
            Category::Ethernet => "ethernet",
            Category::Spi => "spi",
            Category::Pwm => "pwm",
            Category::Npu => "npu",
            Category::Vpu => "video-codec",
            Category::Audio => "audio-controller",
            Category::Dma => "dma-controller",
            Category::Rtc => "rtc",
            Category::Iommu => "iommu",
            Category::Mailbox => "mailbox",
            Category::PowerDomain => "power-controller",
            Category::Pinctrl => "pinctrl",
            Category::Clock => "clock-controller",
            Category::Reset => "reset-controller",
            Category::Input => "gpio-keys",
            Category::Unknown => "device",
        }
    }

    /// Position in the `soc@0` container, or `None` for categories emitted
    /// outside it (clocks, resets, input) and for pass-through devices.
    pub fn soc_order(&self) -> Option<usize> {
        match self {
            Category::I2c => Some(0),
            Category::Serial => Some(1),
            Category::Gpio => Some(2),
            Category::Usb => Some(3),
            Category::Pcie => Some(4),
            Category::Dp => Some(5),
            Category::Watchdog => Some(6),
            Category::Thermal => Some(7),
            Category::Gpu => Some(8),
            Category::Ethernet => Some(9),
            Category::Spi => Some(10),
            Category::Pwm => Some(11),
            Category::Npu => Some(12),
            Category::Vpu => Some(13),
            Category::Audio => Some(14),
            Category::Dma => Some(15),
            Category::Rtc => Some(16),
            Category::Iommu => Some(17),
            Category::Mailbox => Some(18),
            Category::PowerDomain => Some(19),
            Category::Pinctrl => Some(20),
            Category::Unknown => Some(21),
            Category::Clock | Category::Reset | Category::Input => None,
        }
    }

    /// Human-readable name for the diagnostic tally.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Unknown => "unknown",
            other => other.node_prefix(),
        }
    }
}

/// One row of the hardware-ID table.
pub struct CompatEntry {
    pub compatible: &'static str,
    pub category: Category,
}

/// The closed hardware-ID enumeration for the Sky1 firmware.
///
/// The two plug-and-play rows (`PNP0C0C`, `ACPI0011`) describe the power
/// button; they only pass the parser when allowlisted.
#[rustfmt::skip]
const COMPAT_ROWS: &[(&str, &str, Category)] = &[
    // Clock / reset / power infrastructure
    ("CIXH0010", "cix,sky1-cru",             Category::Clock),
    ("CIXH0012", "cix,sky1-s5-cru",          Category::Clock),
    ("CIXH0011", "cix,sky1-reset",           Category::Reset),
    ("CIXH0020", "cix,sky1-pd",              Category::PowerDomain),
    ("CIXH0021", "cix,sky1-s5-pd",           Category::PowerDomain),
    // Pin control and GPIO banks
    ("CIXH1003", "cix,sky1-gpio",            Category::Gpio),
    ("CIXH1004", "cix,sky1-pinctrl",         Category::Pinctrl),
    // Low-speed buses
    ("ARMH0011", "arm,pl011",                Category::Serial),
    ("CIXH2000", "snps,dw-apb-uart",         Category::Serial),
    ("CIXH200B", "cdns,i2c-r1p14",           Category::I2c),
    ("CIXH2010", "cix,sky1-s5-i2c",          Category::I2c),
    ("CIXH2004", "cix,sky1-spi",             Category::Spi),
    ("CIXH2005", "snps,dw-apb-ssi",          Category::Spi),
    ("CIXH2020", "cix,sky1-qspi",            Category::Spi),
    ("CIXH2007", "cix,sky1-pwm",             Category::Pwm),
    // Audio
    ("CIXH3000", "cix,sky1-i2s",             Category::Audio),
    ("CIXH3001", "cix,sky1-hda",             Category::Audio),
    ("CIXH3010", "cix,sky1-audio-dsp",       Category::Audio),
    ("CIXH3020", "cix,sky1-dmic",            Category::Audio),
    ("CIXH3030", "cix,sky1-spdif",           Category::Audio),
    // Accelerators and codecs
    ("CIXH4000", "arm,mali-valhall-csf",     Category::Gpu),
    ("CIXH4100", "cix,sky1-npu",             Category::Npu),
    ("CIXH4200", "cix,sky1-vpu",             Category::Vpu),
    ("CIXH4210", "cix,sky1-jpeg",            Category::Vpu),
    // Display
    ("CIXH5000", "cix,sky1-dpu",             Category::Dp),
    ("CIXH5001", "cix,sky1-dp",              Category::Dp),
    ("CIXH5002", "cix,sky1-edp",             Category::Dp),
    ("CIXH5020", "cix,sky1-dsi",             Category::Dp),
    ("CIXH5030", "cix,sky1-hdmi",            Category::Dp),
    // USB
    ("CIXH6000", "snps,dwc3",                Category::Usb),
    ("CIXH6001", "snps,dwc3",                Category::Usb),
    ("CIXH6010", "cix,sky1-usb2-phy",        Category::Usb),
    ("CIXH6020", "cix,sky1-usb3-phy",        Category::Usb),
    // Ethernet
    ("CIXH7020", "cix,sky1-dwmac",           Category::Ethernet),
    // PCIe
    ("CIXH8000", "cix,sky1-pcie",            Category::Pcie),
    ("CIXH8010", "cix,sky1-pcie-phy",        Category::Pcie),
    // Thermal
    ("CIXH9000", "cix,sky1-tsensor",         Category::Thermal),
    ("CIXH9001", "cix,sky1-s5-tsensor",      Category::Thermal),
    // Watchdog
    ("CIXHA000", "arm,sbsa-gwdt",            Category::Watchdog),
    ("CIXHA001", "cix,sky1-wdt",             Category::Watchdog),
    // DMA
    ("CIXHB000", "snps,axi-dma-1.01a",       Category::Dma),
    ("CIXHB001", "snps,axi-dma-1.01a",       Category::Dma),
    // RTC
    ("CIXHC000", "cix,sky1-rtc",             Category::Rtc),
    ("CIXHC001", "cix,sky1-s5-rtc",          Category::Rtc),
    // IOMMU
    ("CIXHD000", "arm,smmu-v3",              Category::Iommu),
    ("CIXHD001", "arm,smmu-v3",              Category::Iommu),
    // Mailboxes
    ("CIXHE000", "cix,sky1-mbox",            Category::Mailbox),
    ("CIXHE001", "cix,sky1-s5-mbox",         Category::Mailbox),
    // Board input devices
    ("PNP0C0C",  "gpio-keys",                Category::Input),
    ("ACPI0011", "gpio-keys",                Category::Input),
];

static COMPAT_TABLE: LazyLock<BTreeMap<&'static str, CompatEntry>> = LazyLock::new(|| {
    COMPAT_ROWS
        .iter()
        .map(|&(hid, compatible, category)| {
            (
                hid,
                CompatEntry {
                    compatible,
                    category,
                },
            )
        })
        .collect()
});

/// Compatible string for a hardware-ID, if tabulated.
pub fn compatible_for(hid: &str) -> Option<&'static str> {
    COMPAT_TABLE.get(hid).map(|e| e.compatible)
}

/// Category for a hardware-ID; untabulated IDs are [`Category::Unknown`].
pub fn category_for(hid: &str) -> Category {
    COMPAT_TABLE
        .get(hid)
        .map(|e| e.category)
        .unwrap_or(Category::Unknown)
}

/// Translate a firmware controller symbol into its devicetree label.
///
/// Idempotent: already-translated labels map to themselves, and the
/// fallback lowercase rewrite is its own fixed point.
pub fn controller_label(symbol: &str) -> String {
    match symbol {
        "GPI0" => "fch_gpio0".into(),
        "GPI1" => "fch_gpio1".into(),
        "GPI2" => "fch_gpio2".into(),
        "GPI3" => "fch_gpio3".into(),
        "GPI4" => "s5_gpio0".into(),
        "GPI5" => "s5_gpio1".into(),
        "GPI6" => "s5_gpio2".into(),
        "RST0" => "rst0".into(),
        "RST1" => "rst1".into(),
        "CRU0" => "cru".into(),
        other => other.to_lowercase(),
    }
}

/// Firmware-absolute interrupt to bus-relative SPI number.
///
/// Values at or below the architectural offset signal a parse-failure
/// fallback and translate to 0.
pub fn spi_number(raw: u32) -> u32 {
    if raw > 32 { raw - 32 } else { 0 }
}

/// Node label for a device: category prefix plus unique-ID.
///
/// Firmware UART uids are 1-based, so serial labels shift down one to
/// keep the alias block 0-based.
pub fn node_label(category: Category, uid: u32) -> String {
    let index = match category {
        Category::Serial => uid.saturating_sub(1),
        _ => uid,
    };
    format!("{}{}", category.label_prefix(), index)
}
