use std::fmt;

/// Outcome of a single sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Partial,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Success => "SUCCESS",
            Status::Partial => "PARTIAL",
            Status::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Status::Success),
            "PARTIAL" => Ok(Status::Partial),
            "ERROR" => Ok(Status::Error),
            _ => Err(()),
        }
    }
}

/// A single sync outcome, ready to be written to the domain log or rendered
/// as an EXEC report.
#[derive(Debug, Clone)]
pub struct Report {
    pub source: String,
    pub target: String,
    pub worker_id: String,
    pub operation: String,
    pub status: Status,
    pub details: String,
    /// Populated only for `Status::Error` / `Status::Partial` outcomes that
    /// carry a separate error narrative distinct from `details`.
    pub errors: String,
}

impl Report {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        worker_id: impl Into<String>,
        operation: impl Into<String>,
        status: Status,
        details: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            worker_id: worker_id.into(),
            operation: operation.into(),
            status,
            details: details.into(),
            errors: String::new(),
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: impl Into<String>) -> Self {
        self.errors = errors.into();
        self
    }

    /// Render the human-readable EXEC report block written to the
    /// supervisor's standard output.
    #[must_use]
    pub fn render_exec_report(&self) -> String {
        let mut out = String::new();
        out.push_str("EXEC_REPORT_START\n");
        out.push_str(&format!("OPERATION: {}\n", self.operation));
        out.push_str(&format!("STATUS: {}\n", self.status));
        out.push_str(&format!("DETAILS: {}\n", self.details));
        if !self.errors.is_empty() {
            out.push_str("ERRORS:\n");
            out.push_str(&self.errors);
            out.push('\n');
        }
        out.push_str("EXEC_REPORT_END\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_success_report_without_errors_section() {
        let report = Report::new("/src", "/tgt", "123", "ADDED", Status::Success, "File: a.txt");
        let rendered = report.render_exec_report();
        assert!(rendered.starts_with("EXEC_REPORT_START\n"));
        assert!(rendered.contains("OPERATION: ADDED\n"));
        assert!(rendered.contains("STATUS: SUCCESS\n"));
        assert!(rendered.contains("DETAILS: File: a.txt\n"));
        assert!(!rendered.contains("ERRORS:"));
        assert!(rendered.ends_with("EXEC_REPORT_END\n"));
    }

    #[test]
    fn renders_error_report_with_errors_section() {
        let report = Report::new("/src", "/tgt", "123", "ADDED", Status::Error, "0 files copied")
            .with_errors("- File a.txt: Permission denied");
        let rendered = report.render_exec_report();
        assert!(rendered.contains("ERRORS:\n- File a.txt: Permission denied\n"));
    }

    #[test]
    fn status_round_trips_through_display_and_from_str() {
        for status in [Status::Success, Status::Partial, Status::Error] {
            let text = status.to_string();
            assert_eq!(text.parse::<Status>().unwrap(), status);
        }
    }
}
