//! Edge bookkeeping and the post-processing passes

use crate::model::{Family, LogEntry, Person, PersonId};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Child to parent edges collected while tracing
#[derive(Debug, Clone)]
pub struct EdgeSet {
    parents: Vec<Vec<PersonId>>,
}

impl EdgeSet {
    pub fn new(people: usize) -> Self {
        Self {
            parents: vec![Vec::new(); people],
        }
    }

    /// Record `parent` as a parent of `child`.
    ///
    /// Returns `true` when a new edge was added. Self links and edges that
    /// would close a two-person cycle are refused and logged.
    pub fn link(&mut self, child: PersonId, parent: PersonId, logs: &mut Vec<LogEntry>) -> bool {
        let reason = if child == parent {
            "self link"
        } else if self.parents_of(parent).contains(&child) {
            "would form a two-person cycle"
        } else if self.parents_of(child).contains(&parent) {
            return false;
        } else {
            self.parents[child.index()].push(parent);
            return true;
        };

        debug!(child = %child, parent = %parent, reason, "edge skipped");
        logs.push(LogEntry::EdgeSkipped {
            child,
            parent,
            reason: reason.to_string(),
        });
        false
    }

    pub fn parents_of(&self, child: PersonId) -> &[PersonId] {
        &self.parents[child.index()]
    }

    pub fn into_parents(self) -> Vec<Vec<PersonId>> {
        self.parents
    }
}

/// Keep at most two parents per child.
///
/// Candidates are ranked by indent level descending, then by column distance
/// to the child, then by id; the first two are kept.
pub fn limit_parents(parents: &mut [Vec<PersonId>], people: &[Person], logs: &mut Vec<LogEntry>) {
    for (index, list) in parents.iter_mut().enumerate() {
        if list.len() <= 2 {
            continue;
        }
        let child = &people[index];
        list.sort_by_key(|id| {
            let parent = &people[id.index()];
            (
                Reverse(parent.indent_level),
                parent.column.abs_diff(child.column),
                *id,
            )
        });
        let dropped = list.split_off(2);
        warn!(child = %child.id, kept = ?list, dropped = ?dropped, "pruned surplus parents");
        logs.push(LogEntry::ParentsPruned {
            child: child.id,
            kept: list.clone(),
            dropped,
        });
    }
}

/// Write final parent lists onto people and rebuild children from them
pub fn assign_relations(people: &mut [Person], parents: Vec<Vec<PersonId>>) {
    for (person, mut list) in people.iter_mut().zip(parents) {
        list.sort();
        person.parents = list;
        person.children.clear();
        person.spouse = None;
    }
    for index in 0..people.len() {
        let child = people[index].id;
        for parent in people[index].parents.clone() {
            people[parent.index()].children.push(child);
        }
    }
}

/// Group children by parent set and register spouses.
///
/// Families come out in order of their first child's id. A couple becomes
/// spouses only when neither partner already has one.
pub fn materialize_families(people: &mut [Person], logs: &mut Vec<LogEntry>) -> Vec<Family> {
    let mut families: Vec<Family> = Vec::new();
    let mut by_parents: BTreeMap<Vec<PersonId>, usize> = BTreeMap::new();

    for person in people.iter() {
        if person.parents.is_empty() {
            continue;
        }
        let family = Family::new(person.parents.clone());
        let slot = *by_parents.entry(family.parents.clone()).or_insert_with(|| {
            families.push(family);
            families.len() - 1
        });
        families[slot].add_child(person.id);
    }

    for family in &families {
        let Some((a, b)) = family.couple() else {
            continue;
        };
        let (spouse_a, spouse_b) = (people[a.index()].spouse, people[b.index()].spouse);
        if spouse_a.is_none() && spouse_b.is_none() {
            people[a.index()].spouse = Some(b);
            people[b.index()].spouse = Some(a);
        } else if spouse_a != Some(b) {
            debug!(parents = ?family.parents, "spouse already taken");
            logs.push(LogEntry::SpouseConflict {
                parents: family.parents.clone(),
            });
        }
    }

    families
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sex;

    fn people(specs: &[(usize, usize)]) -> Vec<Person> {
        specs
            .iter()
            .enumerate()
            .map(|(i, &(column, indent))| {
                let mut p = Person::new(PersonId::new(i), format!("P{i}"), Sex::Unknown).at(i, column);
                p.indent_level = indent;
                p
            })
            .collect()
    }

    fn id(i: usize) -> PersonId {
        PersonId::new(i)
    }

    #[test]
    fn link_refuses_self_and_two_cycles() {
        let mut edges = EdgeSet::new(3);
        let mut logs = Vec::new();
        assert!(!edges.link(id(0), id(0), &mut logs));
        assert!(edges.link(id(1), id(0), &mut logs));
        assert!(!edges.link(id(1), id(0), &mut logs));
        assert!(!edges.link(id(0), id(1), &mut logs));
        assert_eq!(edges.parents_of(id(1)), &[id(0)]);
        assert!(edges.parents_of(id(0)).is_empty());
        assert_eq!(logs.len(), 2);
    }

    #[test]
    fn surplus_parents_are_pruned_by_indent_then_distance() {
        // child at col 10; candidates differ in indent and distance
        let folks = people(&[(10, 1), (4, 2), (16, 2), (12, 3), (0, 0)]);
        let mut parents = vec![vec![id(1), id(2), id(3), id(4)], vec![], vec![], vec![], vec![]];
        let mut logs = Vec::new();
        limit_parents(&mut parents, &folks, &mut logs);
        assert_eq!(parents[0], vec![id(3), id(1)]);
        match &logs[0] {
            LogEntry::ParentsPruned { dropped, .. } => assert_eq!(dropped, &vec![id(2), id(4)]),
            other => panic!("unexpected log {other:?}"),
        }
    }

    #[test]
    fn families_group_children_and_pair_spouses() {
        let mut folks = people(&[(0, 0), (8, 0), (4, 1), (5, 1), (20, 0)]);
        let parents = vec![vec![], vec![], vec![id(1), id(0)], vec![id(0), id(1)], vec![]];
        assign_relations(&mut folks, parents);
        let mut logs = Vec::new();
        let families = materialize_families(&mut folks, &mut logs);

        assert_eq!(families.len(), 1);
        assert_eq!(families[0].parents, vec![id(0), id(1)]);
        assert_eq!(families[0].children, vec![id(2), id(3)]);
        assert_eq!(folks[0].spouse, Some(id(1)));
        assert_eq!(folks[1].spouse, Some(id(0)));
        assert_eq!(folks[0].children, vec![id(2), id(3)]);
        assert!(logs.is_empty());
    }

    #[test]
    fn first_family_wins_the_spouse() {
        let mut folks = people(&[(0, 0), (8, 0), (4, 1), (16, 0), (12, 1)]);
        let parents = vec![vec![], vec![], vec![id(0), id(1)], vec![], vec![id(1), id(3)]];
        assign_relations(&mut folks, parents);
        let mut logs = Vec::new();
        let families = materialize_families(&mut folks, &mut logs);

        assert_eq!(families.len(), 2);
        assert_eq!(folks[1].spouse, Some(id(0)));
        assert_eq!(folks[3].spouse, None);
        assert_eq!(logs, vec![LogEntry::SpouseConflict { parents: vec![id(1), id(3)] }]);
    }
}
