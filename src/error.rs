use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Converts this byte span to character offsets into `source`, clamped
    /// to its length.
    pub fn char_range(&self, source: &str) -> Range<usize> {
        let end = char_offset(source, self.end);
        let start = char_offset(source, self.start).min(end);
        start..end
    }
}

fn char_offset(source: &str, byte: usize) -> usize {
    source
        .char_indices()
        .take_while(|(index, _)| *index < byte)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        };
        write!(f, "{}", name)
    }
}

/// A diagnostic from any stage of the pipeline.
///
/// Lexical and parse errors are collected into a list and reported together;
/// a runtime error is raised once and aborts the remaining statements.
#[derive(Debug, Clone, Error)]
#[error("[line {line}] {kind}: {message}")]
pub struct BisayaError {
    pub kind: ErrorKind,
    pub span: Span,
    pub line: usize,
    pub message: String,
    pub help: Option<String>,
}

impl BisayaError {
    pub fn new(kind: ErrorKind, span: Span, line: usize, message: String) -> Self {
        Self {
            kind,
            span,
            line,
            message,
            help: None,
        }
    }

    pub fn new_with_help(
        kind: ErrorKind,
        span: Span,
        line: usize,
        message: String,
        help: String,
    ) -> Self {
        Self {
            kind,
            span,
            line,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, line, message)
    }

    pub fn parse_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, line, message)
    }

    pub fn parse_error_with_help(span: Span, line: usize, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, line, message, help)
    }

    pub fn runtime_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, span, line, message)
    }

    pub fn runtime_error_with_help(
        span: Span,
        line: usize,
        message: String,
        help: String,
    ) -> Self {
        Self::new_with_help(ErrorKind::RuntimeError, span, line, message, help)
    }

    pub fn is_runtime(&self) -> bool {
        self.kind == ErrorKind::RuntimeError
    }

    /// Renders the diagnostic to stderr with the offending source highlighted.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        };

        // ariadne counts characters, spans count bytes
        let range = self.span.char_range(source);

        let mut report_builder = Report::build(ReportKind::Error, filename, range.start)
            .with_message(format!(
                "{} at line {}: {}",
                self.kind.fg(color),
                self.line,
                self.message
            ))
            .with_label(
                Label::new((filename, range))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if report_builder
            .finish()
            .eprint((filename, Source::from(source)))
            .is_err()
        {
            // Fall back to the plain form when the terminal rejects the report.
            eprintln!("{}", self);
        }
    }
}
