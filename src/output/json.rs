//! JSON rendering of result values.

use std::io::{self, Write};

use serde::Serialize;

/// Pretty-print any serializable result to `w`, newline-terminated.
pub fn render_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    // to_writer_pretty does not emit a trailing newline.
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Finding, Severity};

    #[test]
    fn test_enums_serialize_as_lowercase_strings() {
        let finding = Finding {
            severity: Severity::Critical,
            node_type: "Seq Scan".to_string(),
            relation: "events".to_string(),
            description: "d".to_string(),
            suggestion: "s".to_string(),
        };

        let mut buf = Vec::new();
        render_json(&mut buf, &finding).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#""severity": "critical""#), "{}", text);
        assert!(text.ends_with('\n'));
    }
}
