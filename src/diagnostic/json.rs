use super::{Diagnostic, Severity, SourceMap, registry};

/// One diagnostic as a single-line JSON object.
pub fn render(d: &Diagnostic) -> String {
    let severity = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };

    let map = d.source.as_deref().map(SourceMap::new);
    let labels: Vec<serde_json::Value> = d.labels.iter().map(|l| {
        let mut obj = serde_json::json!({
            "start": l.span.start,
            "end": l.span.end,
            "message": l.message,
        });
        if let Some(map) = &map {
            let (line, col) = map.lookup(l.span.start);
            obj["line"] = line.into();
            obj["col"] = col.into();
        }
        obj
    }).collect();

    let mut obj = serde_json::json!({
        "severity": severity,
        "message": d.message,
        "labels": labels,
        "notes": d.notes,
    });
    if let Some(code) = d.code {
        obj["code"] = code.into();
        if let Some(entry) = registry::lookup(code) {
            obj["summary"] = entry.short.into();
        }
    }
    if let Some(s) = &d.suggestion {
        obj["suggestion"] = s.as_str().into();
    }

    serde_json::to_string(&obj).unwrap_or_else(|_| {
        r#"{"severity":"error","message":"could not serialize diagnostic"}"#.to_string()
    })
}
