//! Descriptor inheritance and merge logic

use crate::model::TypeDescriptor;
use std::collections::HashSet;

/// Tracks `extends` relationships to detect cycles
pub struct InheritanceGraph {
    edges: Vec<(String, String)>, // (child, parent)
}

impl InheritanceGraph {
    #[must_use]
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    pub fn add_edge(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.edges.push((child.into(), parent.into()));
    }

    /// Detect if adding this edge would create a cycle
    #[must_use]
    pub fn would_create_cycle(&self, child: &str, parent: &str) -> bool {
        if child == parent {
            return true;
        }

        // Check if parent depends on child (directly or transitively)
        let mut to_visit = vec![parent.to_string()];
        let mut visited = HashSet::new();

        while let Some(current) = to_visit.pop() {
            if current == child {
                return true;
            }
            if visited.insert(current.clone()) {
                for (c, p) in &self.edges {
                    if c == &current {
                        to_visit.push(p.clone());
                    }
                }
            }
        }

        false
    }
}

impl Default for InheritanceGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge a resolved parent into a child descriptor.
///
/// Parent properties come first in parent order. A child property with the
/// same name as a parent property replaces it in place; the remaining child
/// properties follow in their own order.
#[must_use]
pub fn merge_descriptors(parent: &TypeDescriptor, child: &TypeDescriptor) -> TypeDescriptor {
    let mut properties = Vec::with_capacity(parent.properties.len() + child.properties.len());
    let mut overridden = HashSet::new();

    for inherited in &parent.properties {
        match child.property(&inherited.name) {
            Some(own) => {
                overridden.insert(own.name.clone());
                properties.push(own.clone());
            }
            None => properties.push(inherited.clone()),
        }
    }

    properties.extend(
        child
            .properties
            .iter()
            .filter(|p| !overridden.contains(&p.name))
            .cloned(),
    );

    TypeDescriptor {
        name: child.name.clone(),
        parent: child.parent.clone(),
        properties,
    }
}

/// Apply an inheritance chain ordered from the most basic type to the leaf
#[must_use]
pub fn apply_inheritance_chain(chain: &[&TypeDescriptor]) -> Option<TypeDescriptor> {
    let (first, rest) = chain.split_first()?;
    let mut result = (*first).clone();
    for descriptor in rest {
        result = merge_descriptors(&result, descriptor);
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyDescriptor;

    #[test]
    fn test_cycle_detection() {
        let mut graph = InheritanceGraph::new();
        graph.add_edge("B", "A");
        graph.add_edge("C", "B");

        assert!(graph.would_create_cycle("A", "C"));
        assert!(graph.would_create_cycle("A", "A"));
        assert!(!graph.would_create_cycle("D", "C"));
    }

    #[test]
    fn test_merge_keeps_parent_order_and_overrides_in_place() {
        let parent = TypeDescriptor::new("Base").with_properties(["id", "createdAt"]);
        let child = TypeDescriptor::new("User")
            .extends("Base")
            .with_descriptor(PropertyDescriptor::new("id").typed("uuid"))
            .with_property("email");

        let merged = merge_descriptors(&parent, &child);
        assert_eq!(merged.name, "User");
        assert_eq!(merged.property_names(), vec!["id", "createdAt", "email"]);
        assert_eq!(
            merged.property("id").unwrap().data_type.as_deref(),
            Some("uuid")
        );
    }

    #[test]
    fn test_apply_chain() {
        let a = TypeDescriptor::new("A").with_property("a");
        let b = TypeDescriptor::new("B").extends("A").with_property("b");
        let c = TypeDescriptor::new("C").extends("B").with_property("c");

        let merged = apply_inheritance_chain(&[&a, &b, &c]).unwrap();
        assert_eq!(merged.name, "C");
        assert_eq!(merged.property_names(), vec!["a", "b", "c"]);
        assert!(apply_inheritance_chain(&[]).is_none());
    }
}
