use crate::store::Identity;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Materialized path of a node: the identities of its ancestors from the
/// root down to the node itself, rendered as an `ltree` label path
/// (`1.5.42`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<Identity>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathParseError {
    #[error("path is empty")]
    Empty,
    #[error("invalid path segment {0:?}")]
    Segment(String),
}

impl NodePath {
    pub fn root(id: Identity) -> Self {
        Self(vec![id])
    }

    /// The path of a direct child whose own segment is `segment`.
    pub fn child(&self, segment: Identity) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment);
        Self(segments)
    }

    pub fn parent(&self) -> Option<NodePath> {
        match self.0.len() {
            0 | 1 => None,
            n => Some(Self(self.0[..n - 1].to_vec())),
        }
    }

    pub fn segments(&self) -> &[Identity] {
        &self.0
    }

    pub fn last(&self) -> Identity {
        // never empty: constructed through `root`/`child` or a checked parse
        self.0[self.0.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    /// `ltree`'s `@>` operator: true for the path itself and every descendant.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments = self.0.iter();
        if let Some(first) = segments.next() {
            write!(f, "{first}")?;
        }
        for segment in segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PathParseError::Empty);
        }
        s.trim()
            .split('.')
            .map(|label| {
                let digits = !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit());
                digits
                    .then(|| label.parse::<Identity>().ok())
                    .flatten()
                    .ok_or_else(|| PathParseError::Segment(label.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(NodePath)
    }
}
