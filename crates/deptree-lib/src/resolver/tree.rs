//! Resolved dependency trees
//!
//! Assembly walks the discovery graph depth-first from the root with an
//! explicit stack. Each `(name, version)` node is built once and shared by
//! `Arc` wherever it appears again, as long as reusing it keeps every
//! root-to-leaf path free of repeated package names.

use petgraph::graph::NodeIndex;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use super::error::ResolveError;
use super::graph::{Child, ResolutionGraph};
use crate::primitives::FailurePolicy;

/// Identity of a resolved node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Packages from the root down to the point of failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPath(Vec<PackageId>);

impl ResolutionPath {
    pub fn packages(&self) -> &[PackageId] {
        &self.0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|id| id.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PackageId>> for ResolutionPath {
    fn from(packages: Vec<PackageId>) -> Self {
        Self(packages)
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

/// A package at a concrete version with its dependencies resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub dependencies: BTreeMap<String, ResolvedDependency>,
}

impl ResolvedPackage {
    pub fn id(&self) -> PackageId {
        PackageId::new(&self.name, &self.version)
    }

    /// Resolved child named `name`
    pub fn dependency(&self, name: &str) -> Option<&Arc<ResolvedPackage>> {
        self.dependencies.get(name).and_then(ResolvedDependency::as_resolved)
    }

    /// Unresolved requirements in this subtree, once per occurrence
    pub fn unresolved(&self) -> Vec<&UnresolvedDependency> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(package) = stack.pop() {
            for dependency in package.dependencies.values() {
                match dependency {
                    ResolvedDependency::Resolved(child) => stack.push(child),
                    ResolvedDependency::Unresolved(unresolved) => found.push(unresolved),
                }
            }
        }
        found
    }

    /// Distinct `(name, version)` pairs in this subtree, root included
    pub fn package_ids(&self) -> BTreeSet<PackageId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(package) = stack.pop() {
            if !seen.insert(package.id()) {
                continue;
            }
            stack.extend(
                package
                    .dependencies
                    .values()
                    .filter_map(ResolvedDependency::as_resolved)
                    .map(Arc::as_ref),
            );
        }
        seen
    }
}

/// One entry of a package's dependency map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedDependency {
    Resolved(Arc<ResolvedPackage>),
    /// Only produced under [`FailurePolicy::Annotate`]
    Unresolved(UnresolvedDependency),
}

impl ResolvedDependency {
    pub fn as_resolved(&self) -> Option<&Arc<ResolvedPackage>> {
        match self {
            ResolvedDependency::Resolved(package) => Some(package),
            ResolvedDependency::Unresolved(_) => None,
        }
    }

    pub fn as_unresolved(&self) -> Option<&UnresolvedDependency> {
        match self {
            ResolvedDependency::Resolved(_) => None,
            ResolvedDependency::Unresolved(unresolved) => Some(unresolved),
        }
    }

    /// Concrete version, if resolved
    pub fn version(&self) -> Option<&str> {
        self.as_resolved().map(|package| package.version.as_str())
    }
}

/// A requirement that could not be satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub name: String,
    pub range: String,
    pub error: ResolveError,
}

impl Serialize for UnresolvedDependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct ErrorBody {
            kind: super::error::ErrorKind,
            message: String,
        }

        let mut state = serializer.serialize_struct("UnresolvedDependency", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("range", &self.range)?;
        state.serialize_field(
            "error",
            &ErrorBody {
                kind: self.error.kind(),
                message: self.error.to_string(),
            },
        )?;
        state.end()
    }
}

/// Subtree built for one graph node, with every name it contains
struct Built {
    package: Arc<ResolvedPackage>,
    names: Arc<BTreeSet<String>>,
}

/// A node whose children are being visited
struct Frame<'g> {
    node: NodeIndex,
    children: Vec<Child<'g>>,
    next: usize,
    dependencies: BTreeMap<String, ResolvedDependency>,
    names: BTreeSet<String>,
}

impl<'g> Frame<'g> {
    fn new(graph: &'g ResolutionGraph, node: NodeIndex) -> Self {
        Self {
            node,
            children: graph.children(node),
            next: 0,
            dependencies: BTreeMap::new(),
            names: BTreeSet::new(),
        }
    }

    fn attach(&mut self, name: &str, built: &Built) {
        self.names.extend(built.names.iter().cloned());
        self.dependencies.insert(
            name.to_string(),
            ResolvedDependency::Resolved(Arc::clone(&built.package)),
        );
    }
}

/// Build the tree rooted at `root` from a finished discovery graph
pub(crate) fn assemble(
    graph: &ResolutionGraph,
    root: NodeIndex,
    policy: FailurePolicy,
) -> Result<ResolvedPackage, ResolveError> {
    let mut built: HashMap<NodeIndex, Built> = HashMap::new();
    let mut on_path: HashSet<&str> = HashSet::new();
    let mut stack = vec![Frame::new(graph, root)];
    on_path.insert(graph.package(root).name.as_str());

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.children.len() {
            let Some(frame) = stack.pop() else { break };
            let id = graph.package(frame.node);
            on_path.remove(id.name.as_str());

            let mut names = frame.names;
            names.insert(id.name.clone());
            let finished = Built {
                package: Arc::new(ResolvedPackage {
                    name: id.name.clone(),
                    version: id.version.clone(),
                    dependencies: frame.dependencies,
                }),
                names: Arc::new(names),
            };

            match stack.last_mut() {
                Some(parent) => {
                    parent.attach(&id.name, &finished);
                    built.insert(frame.node, finished);
                }
                None => {
                    trace!("Assembled {} distinct packages", built.len() + 1);
                    return Ok(Arc::unwrap_or_clone(finished.package));
                }
            }
            continue;
        }

        let child = frame.children[frame.next].clone();
        frame.next += 1;

        match child {
            Child::Unresolved(unresolved) => match policy {
                FailurePolicy::Abort => {
                    return Err(ResolveError::Dependency {
                        path: current_path(graph, &stack, None),
                        name: unresolved.name.clone(),
                        range: unresolved.range.clone(),
                        source: Box::new(unresolved.error.clone()),
                    });
                }
                FailurePolicy::Annotate => {
                    frame.dependencies.insert(
                        unresolved.name.clone(),
                        ResolvedDependency::Unresolved(unresolved.clone()),
                    );
                }
            },
            Child::Resolved { name, node, .. } => {
                if on_path.contains(name) {
                    return Err(ResolveError::CycleDetected {
                        path: current_path(graph, &stack, Some(node)),
                    });
                }

                if let Some(existing) = built.get(&node) {
                    if let Some(repeated) = existing
                        .names
                        .iter()
                        .find(|n| on_path.contains(n.as_str()))
                    {
                        let mut path = current_path(graph, &stack, None).0;
                        path.extend(descend_to(graph, &built, node, repeated));
                        return Err(ResolveError::CycleDetected { path: path.into() });
                    }
                    frame.attach(name, existing);
                } else {
                    on_path.insert(name);
                    stack.push(Frame::new(graph, node));
                }
            }
        }
    }

    // The loop only exits through the root frame's return
    Err(ResolveError::TaskFailed {
        reason: "assembly ended without a root".to_string(),
    })
}

/// Path of the frames on the stack, optionally extended by one node
fn current_path(
    graph: &ResolutionGraph,
    stack: &[Frame<'_>],
    next: Option<NodeIndex>,
) -> ResolutionPath {
    stack
        .iter()
        .map(|frame| frame.node)
        .chain(next)
        .map(|node| graph.package(node).clone())
        .collect::<Vec<_>>()
        .into()
}

/// Walk a built subtree from `start` down to the first package named `target`
fn descend_to(
    graph: &ResolutionGraph,
    built: &HashMap<NodeIndex, Built>,
    start: NodeIndex,
    target: &str,
) -> Vec<PackageId> {
    let mut path = Vec::new();
    let mut current = Some(start);

    while let Some(node) = current {
        let id = graph.package(node);
        path.push(id.clone());
        if id.name == target {
            break;
        }
        current = graph.children(node).into_iter().find_map(|child| match child {
            Child::Resolved { node, .. } => built
                .get(&node)
                .filter(|b| b.names.contains(target))
                .map(|_| node),
            Child::Unresolved(_) => None,
        });
    }
    path
}

#[cfg(test)]
mod tests {
    include!("tree.test.rs");
}
