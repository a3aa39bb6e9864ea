//! Diagnostic channel for decode sessions.
//!
//! A session reports every error it returns through [`DiagnosticSink::on_error`]
//! and every advisory condition through [`DiagnosticSink::on_warning`]. Warnings
//! never change the outcome of an operation.

/// Receiver of session diagnostics, passed to [`PngSession::open`](crate::PngSession::open).
pub trait DiagnosticSink {
    /// A fatal condition; the operation that raised it returns an error.
    fn on_error(&mut self, message: &str);

    /// An advisory condition; the operation continues.
    fn on_warning(&mut self, message: &str);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn on_error(&mut self, message: &str) {
        (**self).on_error(message);
    }

    fn on_warning(&mut self, message: &str) {
        (**self).on_warning(message);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn on_error(&mut self, message: &str) {
        (**self).on_error(message);
    }

    fn on_warning(&mut self, message: &str) {
        (**self).on_warning(message);
    }
}

/// Forwards diagnostics to the `log` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn on_error(&mut self, message: &str) {
        log::error!("{message}");
    }

    fn on_warning(&mut self, message: &str) {
        log::warn!("{message}");
    }
}

/// Severity of a recorded [`Diagnostic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One recorded diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Records diagnostics in arrival order.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics, oldest first.
    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.messages(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.messages(Severity::Warning)
    }

    fn messages(&self, severity: Severity) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .filter(move |d| d.severity == severity)
            .map(|d| d.message.as_str())
    }
}

impl DiagnosticSink for Diagnostics {
    fn on_error(&mut self, message: &str) {
        self.events.push(Diagnostic {
            severity: Severity::Error,
            message: message.to_owned(),
        });
    }

    fn on_warning(&mut self, message: &str) {
        self.events.push(Diagnostic {
            severity: Severity::Warning,
            message: message.to_owned(),
        });
    }
}
