//! Colored terminal output, separate from `log` records.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{self, Write};

/// Writes user-facing messages honoring `--verbose` and `--quiet`.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose: verbose && !quiet,
            quiet,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn stdout() -> StandardStream {
        StandardStream::stdout(ColorChoice::Auto)
    }

    fn stderr() -> StandardStream {
        StandardStream::stderr(ColorChoice::Auto)
    }

    fn colored(stream: &mut StandardStream, color: Color, bold: bool, prefix: &str, message: &str) -> io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(stream, "{}", prefix)?;
        stream.reset()?;
        writeln!(stream, "{}", message)
    }

    /// Plain line on stdout, printed even in quiet mode.
    pub fn println(&self, message: &str) -> io::Result<()> {
        writeln!(Self::stdout(), "{}", message)
    }

    /// Only shown with `--verbose`.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        Self::colored(&mut Self::stdout(), Color::Cyan, false, "  ", message)
    }

    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::colored(&mut Self::stdout(), Color::Blue, true, "→ ", message)
    }

    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::colored(&mut Self::stdout(), Color::Green, true, "✓ ", message)
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        Self::colored(&mut Self::stderr(), Color::Yellow, true, "⚠ ", message)
    }

    /// Always printed, on stderr.
    pub fn error(&self, message: &str) -> io::Result<()> {
        Self::colored(&mut Self::stderr(), Color::Red, true, "✗ ", message)
    }

    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut stream = Self::stdout();
        writeln!(stream)?;
        stream.set_color(ColorSpec::new().set_bold(true).set_underline(true))?;
        write!(stream, "{}", title)?;
        stream.reset()?;
        writeln!(stream)
    }

    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(Self::stdout(), "    {}", message)
    }
}
