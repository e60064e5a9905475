// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define dotted object identifiers and their subtree relations.
// Author: Lukas Bower

//! Dotted numeric object identifiers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing dotted identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Input contained no arcs.
    #[error("empty object identifier")]
    Empty,
    /// Two separators appeared back to back, or the text ended with one.
    #[error("empty arc at position {0}")]
    EmptyArc(usize),
    /// An arc was not a non-negative 32-bit integer.
    #[error("invalid arc '{arc}' at position {position}")]
    InvalidArc {
        /// Offending arc text.
        arc: String,
        /// Zero-based arc position.
        position: usize,
    },
}

/// Object identifier made of non-negative integer arcs.
///
/// Ordering is lexicographic over arcs, matching the order agents return
/// objects during a walk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// Borrow the raw arcs.
    #[must_use]
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// Number of arcs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true when the identifier has no arcs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final arc, if any.
    #[must_use]
    pub fn last_arc(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// Return a copy of this identifier extended by one arc.
    #[must_use]
    pub fn child(&self, arc: u32) -> Self {
        let mut arcs = self.0.clone();
        arcs.push(arc);
        Self(arcs)
    }

    /// True when `self` lies strictly below `root` (`root.<suffix>`).
    ///
    /// Equality with the root is not descent.
    #[must_use]
    pub fn is_strict_descendant_of(&self, root: &Oid) -> bool {
        self.0.len() > root.0.len() && self.0.starts_with(&root.0)
    }
}

impl FromStr for Oid {
    type Err = PathError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(PathError::Empty);
        }
        let mut arcs = Vec::new();
        for (position, arc) in body.split('.').enumerate() {
            if arc.is_empty() {
                return Err(PathError::EmptyArc(position));
            }
            let value = arc.parse::<u32>().map_err(|_| PathError::InvalidArc {
                arc: arc.to_owned(),
                position,
            })?;
            arcs.push(value);
        }
        Ok(Self(arcs))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.0.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{first}")?;
        }
        for arc in arcs {
            write!(f, ".{arc}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(text: &str) -> Oid {
        text.parse().expect("valid oid")
    }

    #[test]
    fn parses_with_and_without_leading_dot() {
        assert_eq!(oid(".1.3.6.1"), oid("1.3.6.1"));
        assert_eq!(oid("1.3.6.1").arcs(), &[1, 3, 6, 1]);
        assert_eq!(oid(".1.3.6.1").to_string(), "1.3.6.1");
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!("".parse::<Oid>(), Err(PathError::Empty));
        assert_eq!(".".parse::<Oid>(), Err(PathError::Empty));
        assert_eq!("1..2".parse::<Oid>(), Err(PathError::EmptyArc(1)));
        assert_eq!("1.2.".parse::<Oid>(), Err(PathError::EmptyArc(2)));
        assert!(matches!(
            "1.x.3".parse::<Oid>(),
            Err(PathError::InvalidArc { position: 1, .. })
        ));
        assert!("1.-2".parse::<Oid>().is_err());
    }

    #[test]
    fn strict_descent_excludes_root_and_siblings() {
        let root = oid("1.3.6.1.2.1.2.2.1");
        assert!(oid("1.3.6.1.2.1.2.2.1.1.1").is_strict_descendant_of(&root));
        assert!(!root.is_strict_descendant_of(&root));
        assert!(!oid("1.3.6.1.2.1.2.2.2.1").is_strict_descendant_of(&root));
        assert!(!oid("1.3.6.1.2.1.2.2").is_strict_descendant_of(&root));
        // Arc-wise comparison: 1.3.6.1.2.1.2.2.10 is not below ...2.2.1
        assert!(!oid("1.3.6.1.2.1.2.2.10.1").is_strict_descendant_of(&root));
    }

    #[test]
    fn orders_by_arcs_not_text() {
        assert!(oid("1.3.6.1.2") < oid("1.3.6.1.10"));
        assert!(oid("1.3.6") < oid("1.3.6.0"));
    }
}
