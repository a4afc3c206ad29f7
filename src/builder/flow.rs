//! Per-stage ordered line buffer with indentation state.

/// Flow code accumulated for one shader stage during a build.
#[derive(Debug, Default)]
pub(crate) struct FlowBuffer {
    lines: Vec<String>,
    indent: usize,
}

impl FlowBuffer {
    pub fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.lines.push(String::new());
            return;
        }
        self.lines.push(format!("{}{}", "    ".repeat(self.indent), text));
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.indent > 0, "unbalanced dedent");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Render the buffer at the given base indentation (entry-point bodies
    /// sit one level in).
    pub fn render(&self, base_indent: usize) -> String {
        let pad = "    ".repeat(base_indent);
        let mut out = String::new();
        for line in &self.lines {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str(&pad);
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_applies_per_line() {
        let mut flow = FlowBuffer::default();
        flow.line("if (x) {");
        flow.indent();
        flow.line("y = 1.0;");
        flow.dedent();
        flow.line("}");

        assert_eq!(flow.render(1), "    if (x) {\n        y = 1.0;\n    }\n");
    }
}
