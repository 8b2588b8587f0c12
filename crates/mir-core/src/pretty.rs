use std::fmt::{self, Formatter};

/// Layout knobs for function dumps.
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    pub indent_size: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self { indent_size: 4 }
    }
}

/// Current nesting while a dump is written.
pub struct PrettyCtx<'a> {
    pub options: &'a PrettyOptions,
    depth: usize,
}

impl<'a> PrettyCtx<'a> {
    pub fn new(options: &'a PrettyOptions) -> Self {
        Self { options, depth: 0 }
    }

    pub fn writeln(&self, f: &mut Formatter<'_>, line: impl AsRef<str>) -> fmt::Result {
        writeln!(f, "{:width$}{}", "", line.as_ref(), width = self.depth)
    }

    /// Run `body` one level deeper.
    pub fn with_indent<F>(&mut self, mut body: F) -> fmt::Result
    where
        F: FnMut(&mut Self) -> fmt::Result,
    {
        self.depth += self.options.indent_size;
        let result = body(self);
        self.depth -= self.options.indent_size;
        result
    }
}

pub trait PrettyPrintable {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result;
}

pub struct PrettyDisplay<'a, T> {
    value: &'a T,
    options: PrettyOptions,
}

impl<T: PrettyPrintable> fmt::Display for PrettyDisplay<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.value.fmt_pretty(f, &mut PrettyCtx::new(&self.options))
    }
}

/// Multi-line dump of `value`, usable with `{}`.
pub fn pretty<T: PrettyPrintable>(value: &T, options: PrettyOptions) -> PrettyDisplay<'_, T> {
    PrettyDisplay { value, options }
}

/// Byte string body with printable ASCII kept and everything else as `\xNN`.
pub fn escape_bytes(input: &[u8]) -> String {
    input
        .iter()
        .map(|&byte| match byte {
            b'"' => "\\\"".to_string(),
            b'\\' => "\\\\".to_string(),
            0x20..=0x7e => char::from(byte).to_string(),
            _ => format!("\\x{:02x}", byte),
        })
        .collect()
}
