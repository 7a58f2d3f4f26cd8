use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::Error;

pub type NodeSet = BTreeSet<u32>;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NodeType {
    Paper,
    Author,
    Institution,
    FieldOfStudy,
}
impl NodeType {
    pub const ALL: [NodeType; 4] = [
        NodeType::Paper,
        NodeType::Author,
        NodeType::Institution,
        NodeType::FieldOfStudy,
    ];
}
impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "paper"),
            Self::Author => write!(f, "author"),
            Self::Institution => write!(f, "institution"),
            Self::FieldOfStudy => write!(f, "field_of_study"),
        }
    }
}
impl FromStr for NodeType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paper" => Ok(Self::Paper),
            "author" => Ok(Self::Author),
            "institution" => Ok(Self::Institution),
            "field_of_study" => Ok(Self::FieldOfStudy),
            _ => Err(Error::UnknownNodeType(s.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EdgeType {
    AffiliatedWith,
    Cites,
    HasTopic,
    Writes,
}
impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::AffiliatedWith => write!(f, "affiliated_with"),
            Self::Cites => write!(f, "cites"),
            Self::HasTopic => write!(f, "has_topic"),
            Self::Writes => write!(f, "writes"),
        }
    }
}
impl FromStr for EdgeType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "affiliated_with" => Ok(Self::AffiliatedWith),
            "cites" => Ok(Self::Cites),
            "has_topic" => Ok(Self::HasTopic),
            "writes" => Ok(Self::Writes),
            _ => Err(Error::UnknownEdgeType(s.to_owned())),
        }
    }
}

pub type CanonicalEdgeType = (NodeType, EdgeType, NodeType);

pub const AFFILIATED_WITH: CanonicalEdgeType =
    (NodeType::Author, EdgeType::AffiliatedWith, NodeType::Institution);
pub const CITES: CanonicalEdgeType = (NodeType::Paper, EdgeType::Cites, NodeType::Paper);
pub const HAS_TOPIC: CanonicalEdgeType =
    (NodeType::Paper, EdgeType::HasTopic, NodeType::FieldOfStudy);
pub const WRITES: CanonicalEdgeType = (NodeType::Author, EdgeType::Writes, NodeType::Paper);

/// Which side of a relation the query ids sit on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// ids are sources; returns destinations of their out-edges
    Forward,
    /// ids are destinations; returns sources of their in-edges
    Reverse,
}
