use crate::Result;
use crate::scan::{Digest, RecordSink, RepositoryDescriptor};
use ohno::IntoAppError;
use owo_colors::OwoColorize;
use std::io::Write;

/// Writes scan records as text lines.
#[derive(Debug)]
pub struct LineWriter<W: Write> {
    writer: W,
    use_colors: bool,
}

impl<W: Write> LineWriter<W> {
    pub const fn new(writer: W, use_colors: bool) -> Self {
        Self { writer, use_colors }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{text}").into_app_err("unable to write output")?;
        self.writer.flush().into_app_err("unable to flush output")
    }
}

impl<W: Write> RecordSink for LineWriter<W> {
    fn repository(&mut self, repo: &RepositoryDescriptor) -> Result<()> {
        self.line(repo.display_url())
    }

    fn digest(&mut self, digest: Digest, source_label: &str) -> Result<()> {
        self.line(&format!("{digest}  {source_label}"))
    }

    /// The leading `#` is never colored.
    fn comment(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            self.line("#")
        } else if self.use_colors {
            self.line(&format!("# {}", text.dimmed()))
        } else {
            self.line(&format!("# {text}"))
        }
    }
}
