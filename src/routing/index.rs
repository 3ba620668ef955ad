//! Prefix tree over route tokens.
//!
//! # Responsibilities
//! - Insert compiled templates, one terminal node per route
//! - Walk a concrete token sequence to the terminal route
//!
//! # Design Decisions
//! - A node holds a map of literal children and at most one parametric
//!   child; every parameter at the same prefix shares that branch
//! - Literal children always win over the parametric child (checked
//!   explicitly, never dependent on map iteration order)
//! - No backtracking: a literal match that dead-ends is a miss
//! - Nodes store [`RouteId`]s into the registry arena, never route data

use std::collections::HashMap;

use super::template::{PathTemplate, Token};

/// Index of a route record in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(pub(crate) usize);

#[derive(Debug, Default)]
struct IndexNode {
    static_children: HashMap<String, IndexNode>,
    param_child: Option<Box<IndexNode>>,
    route: Option<RouteId>,
}

/// Result of a successful walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMatch<'a> {
    pub route: RouteId,
    /// Values captured by parametric nodes, in path order.
    pub captured: Vec<&'a str>,
}

#[derive(Debug, Default)]
pub struct RouteIndex {
    root: IndexNode,
}

impl RouteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a template terminating at `route`.
    ///
    /// Fails with the id already terminating there when another template
    /// collapses onto the same node.
    pub fn insert(&mut self, template: &PathTemplate, route: RouteId) -> Result<(), RouteId> {
        let mut node = &mut self.root;
        for token in template.tokens() {
            node = match token {
                Token::Static(text) => node.static_children.entry(text.clone()).or_default(),
                Token::Param(_) => &mut **node.param_child.get_or_insert_with(Box::default),
            };
        }

        match node.route {
            Some(existing) => Err(existing),
            None => {
                node.route = Some(route);
                Ok(())
            }
        }
    }

    /// Walk `tokens` from the root.
    pub fn lookup<'a>(&self, tokens: &'a [String]) -> Option<IndexMatch<'a>> {
        let mut node = &self.root;
        let mut captured = Vec::new();

        for token in tokens {
            node = match node.static_children.get(token.as_str()) {
                Some(child) => child,
                None => {
                    let child = node.param_child.as_deref()?;
                    captured.push(token.as_str());
                    child
                }
            };
        }

        node.route.map(|route| IndexMatch { route, captured })
    }
}
