use crate::now_string;

/// Render a single `[WORKER_REPORT]` line an FSS child worker prints to its
/// stdout pipe, parsed back by the supervisor's reader
/// thread via [`parse_worker_report`].
#[must_use]
pub fn render_worker_report(
    source: &str,
    target: &str,
    pid: u32,
    operation: &str,
    status: &str,
    details: &str,
) -> String {
    format!(
        "[{}] [WORKER_REPORT] [{source}] [{target}] [{pid}] [{operation}] [{status}] [{details}]",
        now_string()
    )
}

/// A parsed `[WORKER_REPORT]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub source: String,
    pub target: String,
    pub pid: u32,
    pub operation: String,
    pub status: String,
    pub details: String,
}

/// Parse a line printed by [`render_worker_report`]. Returns `None` for
/// lines that aren't a worker report at all (a child is free to print
/// other diagnostics to stdout; only `[WORKER_REPORT]` lines are routed to
/// the domain log).
#[must_use]
pub fn parse_worker_report(line: &str) -> Option<WorkerReport> {
    if !line.contains("[WORKER_REPORT]") {
        return None;
    }

    let fields = bracketed_fields(line);
    // [ts] [WORKER_REPORT] [src] [tgt] [pid] [op] [status] [details]
    if fields.len() < 8 {
        return None;
    }

    let pid = fields[4].parse().ok()?;
    Some(WorkerReport {
        source: fields[2].to_string(),
        target: fields[3].to_string(),
        pid,
        operation: fields[5].to_string(),
        status: fields[6].to_string(),
        details: fields[7..].join("] ["),
    })
}

/// Split a line of `[a] [b] [c]...` fields, tolerating `]` characters inside
/// a field's own content (the details field, in particular, may itself
/// contain bracketed text from an underlying OS error message).
fn bracketed_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find('[') {
        rest = &rest[start + 1..];
        // The last field runs to the end of the line (minus its closing
        // bracket), not just to the next `]`, so embedded `]`s survive.
        if fields.len() == 7 {
            let end = rest.rfind(']').unwrap_or(rest.len());
            fields.push(&rest[..end]);
            break;
        }
        let Some(end) = rest.find(']') else {
            break;
        };
        fields.push(&rest[..end]);
        rest = &rest[end + 1..];
    }
    fields
}
