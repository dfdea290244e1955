use crate::PdfTools;
use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The Poppler command-line utilities used for extraction.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    #[display("pdfinfo")]
    PdfInfo,
    #[display("pdftotext")]
    PdfToText,
}
impl Tool {
    pub fn executable(&self) -> &'static str {
        match self {
            Self::PdfInfo => "pdfinfo",
            Self::PdfToText => "pdftotext",
        }
    }

    /// Locate the executable on `PATH`.
    ///
    /// A missing tool is not an error yet: the bare name is kept, so the
    /// failure surfaces as [`ToolNotFound`](ErrorKind::ToolNotFound) only
    /// if something actually needs extracting.
    fn discover(self) -> PathBuf {
        match which::which(self.executable()) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(tool = %self, error = %e, "Executable not found in PATH");
                PathBuf::from(self.executable())
            },
        }
    }
}

/// Page count and text extraction via `pdfinfo` and `pdftotext`.
///
/// Each call spawns one process and blocks until it exits.
#[derive(Debug, Clone)]
pub struct Poppler {
    pdfinfo: PathBuf,
    pdftotext: PathBuf,
    layout: bool,
}
impl Poppler {
    /// Use explicit executables, falling back to `PATH` discovery for
    /// whichever is not given.
    pub fn with_paths(pdfinfo: Option<PathBuf>, pdftotext: Option<PathBuf>) -> Self {
        let pdfinfo = pdfinfo.unwrap_or_else(|| Tool::PdfInfo.discover());
        let pdftotext = pdftotext.unwrap_or_else(|| Tool::PdfToText.discover());
        Self::new(pdfinfo, pdftotext)
    }

    pub fn new(pdfinfo: impl Into<PathBuf>, pdftotext: impl Into<PathBuf>) -> Self {
        Self {
            pdfinfo: pdfinfo.into(),
            pdftotext: pdftotext.into(),
            layout: true,
        }
    }

    /// Whether `pdftotext` should keep the physical layout of the page
    /// (`-layout`). Enabled by default; tables in handbooks are unreadable
    /// without it.
    pub fn with_layout(mut self, layout: bool) -> Self {
        self.layout = layout;
        self
    }

    fn run<I, S>(&self, tool: Tool, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = match tool {
            Tool::PdfInfo => &self.pdfinfo,
            Tool::PdfToText => &self.pdftotext,
        };
        let mut command = Command::new(program);
        command.args(args);
        tracing::trace!(command = ?command, "Running Poppler");
        let output = match command.output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => exn::bail!(ErrorKind::ToolNotFound(tool)),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            exn::bail!(ErrorKind::ToolFailed {
                tool,
                status: format!("{} ({})", output.status, stderr.trim()),
            });
        }
        Ok(output.stdout)
    }
}

impl PdfTools for Poppler {
    fn page_count(&self, source: &Path) -> Result<u32> {
        if !source.try_exists().or_raise(|| ErrorKind::Io)? {
            exn::bail!(ErrorKind::SourceNotFound(source.to_path_buf()));
        }
        let report = match self.run(Tool::PdfInfo, [source]) {
            Ok(report) => report,
            Err(e) if matches!(&*e, ErrorKind::ToolNotFound(_)) => return Err(e),
            Err(e) => return Err(e.raise(ErrorKind::MetadataUnavailable(source.to_path_buf()))),
        };
        parse_page_count(&String::from_utf8_lossy(&report))
            .ok_or_raise(|| ErrorKind::MetadataUnavailable(source.to_path_buf()))
    }

    fn extract_range(&self, source: &Path, first: u32, last: u32) -> Result<String> {
        let (first, last) = (first.to_string(), last.to_string());
        let mut args: Vec<&OsStr> = vec!["-f".as_ref(), first.as_ref(), "-l".as_ref(), last.as_ref()];
        if self.layout {
            args.push("-layout".as_ref());
        }
        // Trailing "-" sends the text to stdout instead of a file.
        args.extend([source.as_os_str(), "-".as_ref()]);
        let text = self.run(Tool::PdfToText, args)?;
        Ok(String::from_utf8_lossy(&text).into_owned())
    }
}

/// Find the page count in a `pdfinfo` report.
///
/// Returns `None` when there is no `Pages:` line with a positive integer;
/// a document reporting zero pages is treated as unreadable rather than
/// empty.
pub fn parse_page_count(report: &str) -> Option<u32> {
    report
        .lines()
        .filter_map(|line| line.strip_prefix("Pages:"))
        .find_map(|value| value.split_whitespace().next()?.parse::<u32>().ok())
        .filter(|pages| *pages > 0)
}
