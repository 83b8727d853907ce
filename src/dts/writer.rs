//! Indentation-scoped devicetree source printer.
//!
//! The emitter builds the whole tree into a string and the driver writes
//! it out in one pass. Nodes are opened and closed explicitly; properties
//! come in the handful of shapes devicetree source uses (string, string
//! list, cell tuple, bare flag). Kernel convention: one tab per nesting
//! level.

/// Text builder with node-scoped indentation.
pub struct DtsWriter {
    buf: String,
    indent: usize,
}

impl DtsWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            indent: 0,
        }
    }

    /// A verbatim line at column 0 (header comments, directives).
    pub fn raw(&mut self, line: &str) {
        self.buf.push_str(line);
        self.buf.push('\n');
    }

    /// An indented line.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.buf.push('\t');
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Open a node: `header {` and one level deeper.
    pub fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.indent += 1;
    }

    /// Close the innermost node.
    pub fn close(&mut self) {
        debug_assert!(self.indent > 0, "unbalanced node close");
        self.indent = self.indent.saturating_sub(1);
        self.line("};");
    }

    /// `name = "value";`
    pub fn prop_str(&mut self, name: &str, value: &str) {
        self.line(&format!("{name} = \"{value}\";"));
    }

    /// `name = "a", "b";`
    pub fn prop_str_list(&mut self, name: &str, values: &[&str]) {
        let joined = values
            .iter()
            .map(|v| format!("\"{v}\""))
            .collect::<Vec<_>>()
            .join(", ");
        self.line(&format!("{name} = {joined};"));
    }

    /// `name = <cells...>;` with the cells already formatted.
    pub fn prop_cells(&mut self, name: &str, cells: &str) {
        self.line(&format!("{name} = <{cells}>;"));
    }

    /// `name = <n>;` with a decimal cell.
    pub fn prop_u32(&mut self, name: &str, value: u32) {
        self.prop_cells(name, &value.to_string());
    }

    /// `name;`
    pub fn prop_flag(&mut self, name: &str) {
        self.line(&format!("{name};"));
    }

    /// A `/* ... */` comment line.
    pub fn comment(&mut self, text: &str) {
        self.line(&format!("/* {text} */"));
    }

    pub fn finish(self) -> String {
        debug_assert_eq!(self.indent, 0, "unbalanced node nesting at finish");
        self.buf
    }
}

/// Format a (base, length) pair as the 4-cell `reg` tuple with zeroed
/// high cells.
pub fn reg_cells(base: u32, length: u32) -> String {
    format!("0x0 0x{base:08x} 0x0 0x{length:08x}")
}
