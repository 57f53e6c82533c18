//! Format detection: pick the config whose identifying pattern appears in a file's header.

use std::sync::Arc;

use super::config::{ConfigLibrary, FormatConfig};

/// Returns the first config (in library order) whose identifying pattern matches any of the
/// first `limit` lines.
pub fn match_format(
    library: &ConfigLibrary,
    lines: &[&str],
    limit: usize,
) -> Option<Arc<FormatConfig>> {
    let window = &lines[..limit.min(lines.len())];
    library
        .iter()
        .find(|cfg| window.iter().any(|line| cfg.file_identifier.is_match(line)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> ConfigLibrary {
        let mut lib = ConfigLibrary::default();
        lib.insert_documents(
            r#"[
                {"name": "b_rack", "file_identifier": "Rack ID:.*"},
                {"name": "a_station", "file_identifier": "Station \\d+"},
                {"name": "c_any", "file_identifier": ".*ID.*"}
            ]"#,
            "mem",
        )
        .unwrap();
        lib
    }

    #[test]
    fn first_config_in_name_order_wins() {
        let lines = ["Station 4", "Rack ID: 9", "Time,Power"];
        let cfg = match_format(&library(), &lines, 256).unwrap();
        assert_eq!(cfg.name, "a_station");

        let lines = ["Rack ID: 9"];
        // Both "b_rack" and "c_any" match; "b_rack" sorts first.
        assert_eq!(match_format(&library(), &lines, 256).unwrap().name, "b_rack");
    }

    #[test]
    fn lines_past_the_limit_are_ignored() {
        let lines = ["header", "header", "Station 4"];
        assert!(match_format(&library(), &lines, 2).is_none());
        assert!(match_format(&library(), &lines, 3).is_some());
    }

    #[test]
    fn patterns_must_match_whole_lines() {
        let lines = ["xx Station 4 yy"];
        assert!(match_format(&library(), &lines, 10).is_none());
    }
}
