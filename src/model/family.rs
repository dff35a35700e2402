//! Family units: a parent set and the children it produced

use super::person::PersonId;
use serde::{Deserialize, Serialize};

/// One or two parents with their children.
///
/// Parents are kept sorted by id, which makes the parent vector itself the
/// family key. Children have set semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub parents: Vec<PersonId>,
    pub children: Vec<PersonId>,
}

impl Family {
    /// Create an empty family for the given parent set
    pub fn new(mut parents: Vec<PersonId>) -> Self {
        parents.sort();
        parents.dedup();
        Self {
            parents,
            children: Vec::new(),
        }
    }

    /// Sorted parent ids joined with `,`
    pub fn key(&self) -> String {
        self.parents
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Add a child unless already present
    pub fn add_child(&mut self, child: PersonId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// The two parents when this is a couple
    pub fn couple(&self) -> Option<(PersonId, PersonId)> {
        match self.parents.as_slice() {
            [a, b] => Some((*a, *b)),
            _ => None,
        }
    }
}
