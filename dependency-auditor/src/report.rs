//! Flat-text rendering and filtering of persisted dependency records.
//!
//! Both helpers operate on a combined-unique record list, typically loaded
//! back from a persisted JSON report.

use crate::types::DependencyRecord;

/// Renders records as a flat human-readable report, sorted by name.
///
/// One block per record: the name line, then description, homepage, author,
/// and a comma-joined license line, each emitted only when present. Blocks
/// are separated by a blank line.
#[must_use]
pub fn render_text(records: &[DependencyRecord]) -> String {
    let mut sorted: Vec<&DependencyRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    for record in sorted {
        out.push_str(&format!("name: {}\n", record.name));
        if let Some(description) = &record.description {
            out.push_str(&format!("description: {description}\n"));
        }
        if let Some(homepage) = &record.homepage {
            out.push_str(&format!("homepage: {homepage}\n"));
        }
        if let Some(author) = &record.author {
            out.push_str(&format!("author: {author}\n"));
        }
        if let Some(licenses) = &record.licenses {
            out.push_str(&format!("licenses: {}\n", licenses.join(", ")));
        }
        out.push('\n');
    }

    out
}

/// Keeps records that carry at least a license list or a description,
/// sorted by name.
#[must_use]
pub fn filter_known(records: Vec<DependencyRecord>) -> Vec<DependencyRecord> {
    let mut kept: Vec<DependencyRecord> = records
        .into_iter()
        .filter(DependencyRecord::has_metadata)
        .collect();
    kept.sort_by(|a, b| a.name.cmp(&b.name));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_sorts_by_name_and_joins_licenses() {
        let records = vec![
            DependencyRecord {
                description: Some("d".to_string()),
                licenses: Some(vec!["MIT".to_string(), "ISC".to_string()]),
                ..DependencyRecord::bare("b")
            },
            DependencyRecord::bare("a"),
        ];

        let text = render_text(&records);

        let a_position = text.find("name: a").unwrap();
        let b_position = text.find("name: b").unwrap();
        assert!(a_position < b_position);
        assert!(text.contains("licenses: MIT, ISC\n"));
        assert!(text.contains("description: d\n"));
    }

    #[test]
    fn render_omits_absent_fields() {
        let text = render_text(&[DependencyRecord::bare("a")]);

        assert_eq!(text, "name: a\n\n");
    }

    #[test]
    fn filter_drops_records_without_metadata() {
        let records = vec![
            DependencyRecord::bare("unknown"),
            DependencyRecord {
                licenses: Some(vec!["MIT".to_string()]),
                ..DependencyRecord::bare("licensed")
            },
            DependencyRecord {
                description: Some("a module".to_string()),
                ..DependencyRecord::bare("described")
            },
        ];

        let kept = filter_known(records);

        let names: Vec<&str> = kept.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["described", "licensed"]);
    }
}
