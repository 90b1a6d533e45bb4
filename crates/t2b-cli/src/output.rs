//! Colored terminal output for the transform summary.
//!
//! Uses `termcolor`; `NO_COLOR` wins over `--color`.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Map the `--color` flag and environment to a `ColorChoice`
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// How a fragment of summary text is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Unit names
    Heading,
    /// Benchmarks and the final tally
    Added,
    /// Skipped members
    Skipped,
    /// Failures
    Failed,
    /// Arrows and lifecycle labels
    Muted,
    /// Everything else
    Plain,
}

impl Style {
    fn spec(self) -> Option<ColorSpec> {
        let (color, bold) = match self {
            Style::Heading => (None, true),
            Style::Added => (Some(Color::Green), true),
            Style::Skipped => (Some(Color::Yellow), true),
            Style::Failed => (Some(Color::Red), true),
            Style::Muted => (Some(Color::White), false),
            Style::Plain => return None,
        };
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        Some(spec)
    }
}

/// Styled stdout writer; write errors are ignored
pub struct StyledOutput {
    stdout: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    /// Write `text` in `style`
    pub fn write(&mut self, style: Style, text: &str) -> &mut Self {
        match style.spec() {
            Some(spec) => {
                let _ = self.stdout.set_color(&spec);
                let _ = write!(self.stdout, "{}", text);
                let _ = self.stdout.reset();
            }
            None => {
                let _ = write!(self.stdout, "{}", text);
            }
        }
        self
    }

    /// Indented `label` followed by plain `text` and a newline
    pub fn item(&mut self, style: Style, label: &str, text: &str) -> &mut Self {
        self.write(style, &format!("  {:<10}", label))
            .write(Style::Plain, text)
            .newline()
    }

    pub fn newline(&mut self) -> &mut Self {
        let _ = writeln!(self.stdout);
        self
    }

    pub fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}
