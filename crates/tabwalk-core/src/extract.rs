// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Map scanned column identifiers onto table rows.
// Author: Lukas Bower

//! Row index extraction for scanned columns.

use crate::path::Oid;

/// Where a scanned column lands relative to a table root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The column is not a strict descendant of the root; the walk has left the table.
    NotInSubtree,
    /// The column ends in arc `0` and names a scalar companion object.
    Scalar,
    /// The column is a table cell.
    Cell {
        /// One-based row index taken from the final arc.
        row: usize,
        /// Full column identifier.
        column: Oid,
    },
}

/// Classify `column` against the table `root`.
#[must_use]
pub fn classify(column: &Oid, root: &Oid) -> Placement {
    if !column.is_strict_descendant_of(root) {
        return Placement::NotInSubtree;
    }
    match column.last_arc() {
        Some(0) => Placement::Scalar,
        Some(arc) => match usize::try_from(arc) {
            Ok(row) => Placement::Cell {
                row,
                column: column.clone(),
            },
            Err(_) => Placement::NotInSubtree,
        },
        None => Placement::NotInSubtree,
    }
}

/// Classify a dotted text column; malformed text is never part of the subtree.
#[must_use]
pub fn classify_text(column: &str, root: &Oid) -> Placement {
    match column.parse::<Oid>() {
        Ok(oid) => classify(&oid, root),
        Err(_) => Placement::NotInSubtree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Oid {
        "1.3.6.1.2.1.2.2.1".parse().unwrap()
    }

    #[test]
    fn cell_row_comes_from_last_arc() {
        let column: Oid = "1.3.6.1.2.1.2.2.1.2.17".parse().unwrap();
        assert_eq!(
            classify(&column, &root()),
            Placement::Cell {
                row: 17,
                column: column.clone()
            }
        );
    }

    #[test]
    fn zero_suffix_is_scalar() {
        assert_eq!(classify_text("1.3.6.1.2.1.2.2.1.0", &root()), Placement::Scalar);
        assert_eq!(classify_text("1.3.6.1.2.1.2.2.1.4.0", &root()), Placement::Scalar);
    }

    #[test]
    fn root_and_outsiders_are_rejected() {
        assert_eq!(classify(&root(), &root()), Placement::NotInSubtree);
        assert_eq!(classify_text("1.3.6.1.2.1.2.2.2.1", &root()), Placement::NotInSubtree);
        assert_eq!(classify_text("1.3.6.1.4.1.9.9.1", &root()), Placement::NotInSubtree);
        assert_eq!(classify_text("1.3.6.1.2.1.2.2", &root()), Placement::NotInSubtree);
    }

    #[test]
    fn malformed_text_is_outside() {
        assert_eq!(classify_text("1.3.6.x", &root()), Placement::NotInSubtree);
        assert_eq!(classify_text("", &root()), Placement::NotInSubtree);
    }
}
