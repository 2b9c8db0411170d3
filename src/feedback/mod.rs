//! Structured Feedback Module
//!
//! Renders compiler errors either as human-readable text or as JSON
//! reports for tools:
//! - a stable error code and severity
//! - the source location, when known
//! - fix suggestions for the common mistakes

use serde::Serialize;

use crate::utils::Error;

// ==================== Structured Error Report ====================

/// A structured error report
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0200")
    pub code: String,

    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    pub location: Option<Location>,

    /// Suggested fixes
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The compiled program is wrong
    Error,
    /// The program exceeds a fixed limit of this compiler
    Limit,
    /// The compiler broke one of its own invariants
    Bug,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    /// Description of the fix
    pub message: String,

    /// The replacement text
    pub replacement: Option<String>,
}

// ==================== Error Conversion ====================

impl ErrorReport {
    /// Create an error report from a compiler error
    pub fn from_error(error: &Error, file_name: &str) -> Self {
        let severity = if error.is_internal() {
            Severity::Bug
        } else if error.is_capacity_limit() {
            Severity::Limit
        } else {
            Severity::Error
        };

        let location = error.span().map(|s| Location {
            file: file_name.to_string(),
            line: s.line,
            column: s.column,
        });

        Self {
            code: error.code().to_string(),
            severity,
            message: error.to_string(),
            location,
            suggestions: suggestions_for(error),
        }
    }

    /// Process exit status for a compilation that failed with this report
    pub fn exit_code(&self) -> i32 {
        match self.severity {
            Severity::Error => 1,
            Severity::Limit | Severity::Bug => 2,
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Render as `file:line:col: error[CODE]: message` plus help lines
    pub fn render_human(&self) -> String {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Limit => "limit",
            Severity::Bug => "internal error",
        };

        let mut out = match &self.location {
            Some(loc) => format!("{}:{}:{}: ", loc.file, loc.line, loc.column),
            None => String::new(),
        };
        out.push_str(&format!("{}[{}]: {}", label, self.code, self.message));

        for suggestion in &self.suggestions {
            out.push_str(&format!("\n  help: {}", suggestion.message));
            if let Some(replacement) = &suggestion.replacement {
                out.push_str(&format!(": `{}`", replacement));
            }
        }
        out
    }
}

fn suggestions_for(error: &Error) -> Vec<Suggestion> {
    match error {
        Error::UnboundName { name, .. } => vec![Suggestion {
            message: format!("declare `{}` in this function before using it", name),
            replacement: Some(format!("int {};", name)),
        }],

        Error::DuplicateDeclaration { name, .. } => vec![Suggestion {
            message: format!("remove the second declaration of `{}` or rename it", name),
            replacement: None,
        }],

        Error::NotAssignable { .. } => vec![Suggestion {
            message: "only a variable name may appear left of `=`".to_string(),
            replacement: None,
        }],

        Error::RegisterExhaustion { .. } => vec![Suggestion {
            message: "split the expression across statements using local variables".to_string(),
            replacement: None,
        }],

        Error::TooManyArguments { limit, .. } => vec![Suggestion {
            message: format!("pass at most {} arguments", limit),
            replacement: None,
        }],

        Error::UnexpectedChar { ch: '!', .. } => vec![Suggestion {
            message: "`!` is only valid as part of `!=`".to_string(),
            replacement: Some("!=".to_string()),
        }],

        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_human_rendering() {
        let err = Error::UnboundName { name: "y".to_string(), span: Span::new(3, 7) };
        let report = ErrorReport::from_error(&err, "main.c");

        assert_eq!(
            report.render_human(),
            "main.c:3:7: error[E0200]: Unbound name: y\n  \
             help: declare `y` in this function before using it: `int y;`"
        );
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_json_report() {
        let err = Error::RegisterExhaustion { capacity: 7, span: Span::new(1, 14) };
        let report = ErrorReport::from_error(&err, "deep.c");
        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();

        assert_eq!(json["code"], "L0001");
        assert_eq!(json["severity"], "limit");
        assert_eq!(json["location"]["line"], 1);
        assert_eq!(json["location"]["column"], 14);
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn test_internal_error_has_no_location() {
        let report = ErrorReport::from_error(&Error::CodeGen("boom".to_string()), "x.c");

        assert_eq!(report.severity, Severity::Bug);
        assert_eq!(report.location, None);
        assert_eq!(
            report.render_human(),
            "internal error[I0002]: Code generation error: boom"
        );
        assert_eq!(report.exit_code(), 2);
    }
}
