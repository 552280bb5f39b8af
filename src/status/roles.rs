//! Status-table detection and column role resolution.
//!
//! Report tables merge header cells unpredictably, so the raw grid
//! repeats merged text across spanned columns. Roles are resolved over
//! the deduplicated header list but always mapped back to raw grid
//! indices, which is what row lookups use.

use tracing::debug;

/// True when a header row looks like a measurement status table.
/// `joined_lower` is the lower-cased concatenation of the header cells.
pub fn is_status_table(joined_lower: &str) -> bool {
    joined_lower.contains("smd")
        && joined_lower.contains("status")
        && (joined_lower.contains("single value") || joined_lower.contains("description"))
}

/// Collapse consecutive equal cells, keeping the first raw index of
/// each run. Merged header cells repeat their text across the span.
pub fn unique_headers(cells: &[String]) -> Vec<(usize, String)> {
    let mut out: Vec<(usize, String)> = Vec::new();
    for (i, cell) in cells.iter().enumerate() {
        if out.last().map(|(_, prev)| prev) != Some(cell) {
            out.push((i, cell.clone()));
        }
    }
    out
}

/// Collapse consecutive equal cells of a data row.
pub fn dedup_consecutive(cells: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cell in cells {
        if out.last() != Some(cell) {
            out.push(cell.clone());
        }
    }
    out
}

/// Raw grid indices of the columns a status row is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRoles {
    pub device: usize,
    pub status: usize,
    /// Absent in tables that qualify through "single value" alone; the
    /// row then carries an empty description, never another column.
    pub description: Option<usize>,
    pub value: Option<usize>,
}

/// Resolve column roles from the deduplicated header list. Returns
/// `None` unless both a device and a status column are found.
pub fn resolve_roles(unique: &[(usize, String)]) -> Option<ColumnRoles> {
    let mut device = None;
    let mut status = None;
    let mut description = None;
    let mut value = None;

    for (index, header) in unique {
        let normalized = header.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        let lower = header.to_lowercase();

        if device.is_none() && normalized.contains("smd") {
            device = Some(*index);
        } else if status.is_none() && normalized == "status" {
            status = Some(*index);
        } else if description.is_none() && normalized.contains("description") {
            description = Some(*index);
        } else if value.is_none()
            && (normalized.contains("single value") || lower.contains("single\nvalue"))
            && !normalized.contains("description")
        {
            value = Some(*index);
        }
    }

    // Wide tables often lack an explicit "Single Value" header; the
    // value column then sits fourth, or second-to-last when a trailing
    // "Object" column exists.
    if value.is_none() && unique.len() >= 4 {
        let last = &unique[unique.len() - 1].1;
        if last.to_lowercase().contains("object") && unique.len() >= 5 {
            value = Some(unique[unique.len() - 2].0);
        } else {
            value = Some(unique[3].0);
        }
    }

    let roles = ColumnRoles {
        device: device?,
        status: status?,
        description,
        value,
    };
    debug!(?roles, "resolved status table columns");
    Some(roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cells: &[&str]) -> Vec<(usize, String)> {
        unique_headers(&cells.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn detects_status_tables_by_header_content() {
        assert!(is_status_table("smd | status | single value"));
        assert!(is_status_table("smd | status | description"));
        assert!(!is_status_table("smd | result | single value"));
        assert!(!is_status_table("limits | status | description"));
    }

    #[test]
    fn merged_headers_keep_first_raw_index() {
        let unique = headers(&["SMD", "SMD", "Status", "Description", "Description", "Value"]);
        assert_eq!(
            unique,
            vec![
                (0, "SMD".to_string()),
                (2, "Status".to_string()),
                (3, "Description".to_string()),
                (5, "Value".to_string()),
            ]
        );
    }

    #[test]
    fn plain_header_layout_resolves_named_roles() {
        let unique = headers(&["SMD", "Status", "Description", "Single Value"]);
        let roles = resolve_roles(&unique).unwrap();
        assert_eq!(roles.device, 0);
        assert_eq!(roles.status, 1);
        assert_eq!(roles.description, Some(2));
        assert_eq!(roles.value, Some(3));
    }

    #[test]
    fn merged_layout_maps_back_to_raw_indices() {
        let unique = headers(&["SMD", "SMD", "Status", "Description", "Single Value"]);
        let roles = resolve_roles(&unique).unwrap();
        assert_eq!(roles.device, 0);
        assert_eq!(roles.status, 2);
        assert_eq!(roles.value, Some(4));
    }

    #[test]
    fn value_column_falls_back_to_fourth_unique() {
        let unique = headers(&["SMD", "Status", "Description", "Result"]);
        let roles = resolve_roles(&unique).unwrap();
        assert_eq!(roles.value, Some(3));
    }

    #[test]
    fn trailing_object_column_shifts_value_left() {
        let unique = headers(&["SMD", "Status", "Description", "Result", "Object"]);
        let roles = resolve_roles(&unique).unwrap();
        assert_eq!(roles.value, Some(3));
    }

    #[test]
    fn missing_status_column_yields_none() {
        let unique = headers(&["SMD", "Result", "Description"]);
        assert!(resolve_roles(&unique).is_none());
    }

    #[test]
    fn status_match_is_exact_not_substring() {
        // "Status Detail" must not claim the status role.
        let unique = headers(&["SMD", "Status Detail", "Description"]);
        assert!(resolve_roles(&unique).is_none());
    }

    #[test]
    fn missing_description_header_leaves_the_role_unassigned() {
        let unique = headers(&["SMD", "Status", "Single Value", "Extra"]);
        let roles = resolve_roles(&unique).unwrap();
        assert_eq!(roles.description, None);
        assert_eq!(roles.value, Some(2));
    }

    #[test]
    fn dedup_consecutive_preserves_nonadjacent_repeats() {
        let row: Vec<String> = ["a", "a", "b", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedup_consecutive(&row), vec!["a", "b", "a"]);
    }
}
