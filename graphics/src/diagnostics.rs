//! Build diagnostics.
//!
//! Every stage of a frame build can report anomalies that do not abort the
//! build: pruned passes, a debug probe that found nothing to tap, link copies
//! made by the normalizer. They are collected in a [`Diagnostics`] value that
//! is threaded through the stages and returned with the built frame.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
}

/// Build stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    Assembly,
    Normalization,
    Stereo,
    DebugProbe,
    Binding,
    Linearization,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assembly => "assembly",
            Self::Normalization => "normalization",
            Self::Stereo => "stereo",
            Self::DebugProbe => "debug probe",
            Self::Binding => "binding",
            Self::Linearization => "linearization",
        };
        f.write_str(name)
    }
}

/// A single reported anomaly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: BuildStage,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:?}: {}", self.stage, self.severity, self.message)
    }
}

/// Collected diagnostics of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational entry.
    pub fn info(&mut self, stage: BuildStage, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{stage}: {message}");
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            stage,
            message,
        });
    }

    /// Record a warning. Warnings are also forwarded to `log::warn!`.
    pub fn warn(&mut self, stage: BuildStage, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{stage}: {message}");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            stage,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Warnings only, in report order.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Entries reported by `stage`.
    pub fn from_stage(&self, stage: BuildStage) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_collect_in_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.info(BuildStage::Normalization, "copied 3 links");
        diagnostics.warn(BuildStage::DebugProbe, "no SSAO pass to tap");

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_warnings());
        assert_eq!(diagnostics.entries()[0].severity, Severity::Info);

        let warnings: Vec<_> = diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, BuildStage::DebugProbe);
        assert_eq!(diagnostics.from_stage(BuildStage::Normalization).count(), 1);
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            severity: Severity::Warning,
            stage: BuildStage::Assembly,
            message: "pruned 2 passes".into(),
        };
        assert_eq!(d.to_string(), "[assembly] Warning: pruned 2 passes");
    }
}
