use crate::span::Span;
use once_cell::sync::Lazy;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

impl DiagnosticLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticLevel::Warning => "WARNING",
            DiagnosticLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub span: Option<Span>,
    pub suggestions: Vec<String>,
    /// Where the diagnostic was raised, e.g. `crate::f @ bb2/s1`.
    pub source_context: Option<String>,
    pub code: Option<String>,
}

impl Diagnostic {
    fn with_level(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            span: None,
            suggestions: Vec::new(),
            source_context: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warning, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source_context(mut self, context: impl Into<String>) -> Self {
        self.source_context = Some(context.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Render the diagnostic as plain text lines, header first.
    pub fn render_plain(&self) -> Vec<String> {
        let context = self.source_context.as_deref().unwrap_or("mir");
        let header = match self.code.as_ref() {
            Some(code) => format!(
                "[{}] {}: {} ({})",
                context,
                self.level.as_str(),
                self.message,
                code
            ),
            None => format!("[{}] {}: {}", context, self.level.as_str(), self.message),
        };

        let mut lines = vec![header];
        if let Some(span) = &self.span {
            lines.push(format!("   at {}", span));
        }
        for suggestion in &self.suggestions {
            lines.push(format!("   suggestion: {}", suggestion));
        }
        lines
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(context) = &self.source_context {
            write!(f, "[{}] ", context)?;
        }
        write!(f, "{}", self.message)?;

        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(span) = &self.span {
            write!(f, " at {}", span)?;
        }

        if !self.suggestions.is_empty() {
            let hints = self.suggestions.join("; ");
            write!(f, " (hints: {})", hints)?;
        }

        Ok(())
    }
}

/// Thread-safe sink for diagnostics raised while passes run.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticManager {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_diagnostic(&self, diagnostic: Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.push(diagnostic);
        }
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.get_diagnostics()
            .into_iter()
            .filter(|diag| diag.level == DiagnosticLevel::Warning)
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .map(|d| d.iter().any(|diag| diag.level == DiagnosticLevel::Error))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.clear();
        }
    }
}

static GLOBAL_DIAGNOSTIC_MANAGER: Lazy<Arc<DiagnosticManager>> =
    Lazy::new(|| Arc::new(DiagnosticManager::new()));

pub fn diagnostic_manager() -> Arc<DiagnosticManager> {
    GLOBAL_DIAGNOSTIC_MANAGER.clone()
}
