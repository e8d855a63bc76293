//! Discovery phase
//!
//! Walks requirements outward from the root, fetching each package name at
//! most once, and records every selected `(name, version)` as a node of a
//! `petgraph` graph. Fetches run concurrently as tasks in a `JoinSet`; the
//! coordinator is the only writer of the graph and the fetch table.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, trace};

use super::error::ResolveError;
use super::retry::{RetryPolicy, fetch_with_retry};
use super::select::{VersionRange, select};
use super::tree::{PackageId, UnresolvedDependency};
use crate::registry::{PackageMetadata, RegistryClient};

/// Selected packages and the requirements between them
#[derive(Debug, Default)]
pub(crate) struct ResolutionGraph {
    graph: DiGraph<PackageId, String>,
    nodes: HashMap<PackageId, NodeIndex>,
    unresolved: HashMap<NodeIndex, Vec<UnresolvedDependency>>,
}

/// A requirement of a node as seen by assembly
#[derive(Debug, Clone, Copy)]
pub(crate) enum Child<'g> {
    Resolved { name: &'g str, node: NodeIndex },
    Unresolved(&'g UnresolvedDependency),
}

impl<'g> Child<'g> {
    fn name(&self) -> &'g str {
        match *self {
            Child::Resolved { name, .. } => name,
            Child::Unresolved(unresolved) => &unresolved.name,
        }
    }
}

impl ResolutionGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn package(&self, node: NodeIndex) -> &PackageId {
        &self.graph[node]
    }

    /// Requirements of `node`, ordered by dependency name
    pub fn children(&self, node: NodeIndex) -> Vec<Child<'_>> {
        let mut children: Vec<Child<'_>> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| Child::Resolved {
                name: self.graph[edge.target()].name.as_str(),
                node: edge.target(),
            })
            .chain(
                self.unresolved
                    .get(&node)
                    .into_iter()
                    .flatten()
                    .map(Child::Unresolved),
            )
            .collect();
        children.sort_by(|a, b| a.name().cmp(b.name()));
        children
    }

    /// Node for `id`; the flag is true when the node is new
    fn insert(&mut self, id: PackageId) -> (NodeIndex, bool) {
        if let Some(&node) = self.nodes.get(&id) {
            return (node, false);
        }
        let node = self.graph.add_node(id.clone());
        self.nodes.insert(id, node);
        (node, true)
    }

    fn link(&mut self, from: NodeIndex, to: NodeIndex, range: String) {
        self.graph.add_edge(from, to, range);
    }

    fn mark_unresolved(&mut self, node: NodeIndex, unresolved: UnresolvedDependency) {
        self.unresolved.entry(node).or_default().push(unresolved);
    }
}

/// Pick the version a requirement resolves to
///
/// An exact published version wins, then a dist-tag, then the highest
/// version satisfying the range.
pub(crate) fn select_version(
    metadata: &PackageMetadata,
    requested: &str,
) -> Result<String, ResolveError> {
    let requested_trimmed = requested.trim();
    if metadata.versions.contains_key(requested_trimmed) {
        return Ok(requested_trimmed.to_string());
    }

    if let Some(tagged) = metadata.dist_tags.get(requested_trimmed)
        && metadata.versions.contains_key(tagged)
    {
        return Ok(tagged.clone());
    }

    VersionRange::parse(requested)
        .ok()
        .and_then(|range| select(metadata.version_keys(), &range))
        .ok_or_else(|| ResolveError::VersionNotFound {
            name: metadata.name.clone(),
            requested: requested.to_string(),
        })
}

/// Who asked for a package, and with what range
#[derive(Debug)]
struct Requirement {
    parent: Option<NodeIndex>,
    name: String,
    range: String,
}

/// Per-name fetch state for one run
enum FetchState {
    /// Requirements parked until the fetch lands
    InFlight(Vec<Requirement>),
    Ready(Arc<PackageMetadata>),
    Failed(ResolveError),
}

/// Coordinator of one discovery run
///
/// Dropping it aborts every fetch still in flight.
pub(crate) struct Discovery<R> {
    registry: Arc<R>,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
    fetches: HashMap<String, FetchState>,
    tasks: JoinSet<(String, Result<PackageMetadata, ResolveError>)>,
    queue: VecDeque<Requirement>,
    graph: ResolutionGraph,
    root: Option<Result<NodeIndex, ResolveError>>,
}

impl<R: RegistryClient + 'static> Discovery<R> {
    pub fn new(registry: Arc<R>, permits: Arc<Semaphore>, retry: RetryPolicy) -> Self {
        Self {
            registry,
            permits,
            retry,
            fetches: HashMap::new(),
            tasks: JoinSet::new(),
            queue: VecDeque::new(),
            graph: ResolutionGraph::default(),
            root: None,
        }
    }

    /// Discover everything reachable from `name@version`
    pub async fn run(
        mut self,
        name: &str,
        version: &str,
    ) -> Result<(ResolutionGraph, NodeIndex), ResolveError> {
        self.queue.push_back(Requirement {
            parent: None,
            name: name.to_string(),
            range: version.to_string(),
        });
        self.drain();

        while let Some(joined) = self.tasks.join_next().await {
            let (name, result) = joined?;
            self.complete(name, result);
            self.drain();

            if matches!(self.root, Some(Err(_))) {
                break;
            }
        }

        debug!(
            packages = self.graph.node_count(),
            edges = self.graph.edge_count(),
            fetched = self.fetches.len(),
            "Discovery finished"
        );

        match self.root.take() {
            Some(Ok(root)) => Ok((self.graph, root)),
            Some(Err(error)) => Err(error),
            None => Err(ResolveError::TaskFailed {
                reason: format!("root requirement {}@{} never settled", name, version),
            }),
        }
    }

    fn drain(&mut self) {
        while let Some(requirement) = self.queue.pop_front() {
            self.process(requirement);
        }
    }

    fn process(&mut self, requirement: Requirement) {
        match self.fetches.get_mut(&requirement.name) {
            Some(FetchState::Ready(metadata)) => {
                let metadata = Arc::clone(metadata);
                self.settle(requirement, &metadata);
            }
            Some(FetchState::Failed(error)) => {
                let error = error.clone();
                self.fail(requirement, error);
            }
            Some(FetchState::InFlight(parked)) => parked.push(requirement),
            None => {
                let name = requirement.name.clone();
                self.spawn_fetch(&name);
                self.fetches
                    .insert(name, FetchState::InFlight(vec![requirement]));
            }
        }
    }

    fn spawn_fetch(&mut self, name: &str) {
        trace!("Queueing fetch for {}", name);
        let registry = Arc::clone(&self.registry);
        let permits = Arc::clone(&self.permits);
        let retry = self.retry.clone();
        let name = name.to_string();

        self.tasks.spawn(async move {
            let result = fetch_with_retry(registry.as_ref(), &permits, &retry, &name).await;
            (name, result)
        });
    }

    fn complete(&mut self, name: String, result: Result<PackageMetadata, ResolveError>) {
        let state = match result {
            Ok(metadata) => FetchState::Ready(Arc::new(metadata)),
            Err(error) => FetchState::Failed(error),
        };
        let parked = match self.fetches.insert(name, state) {
            Some(FetchState::InFlight(parked)) => parked,
            _ => Vec::new(),
        };
        // Settle through the queue so the ready state is visible to all of them
        self.queue.extend(parked);
    }

    fn settle(&mut self, requirement: Requirement, metadata: &PackageMetadata) {
        let version = match select_version(metadata, &requirement.range) {
            Ok(version) => version,
            Err(error) => {
                self.fail(requirement, error);
                return;
            }
        };

        let (node, is_new) = self
            .graph
            .insert(PackageId::new(&requirement.name, &version));
        match requirement.parent {
            Some(parent) => self.graph.link(parent, node, requirement.range),
            None => self.root = Some(Ok(node)),
        }

        if !is_new {
            return;
        }

        trace!("Selected {}@{}", requirement.name, version);
        if let Some(dependencies) = metadata.dependencies_of(&version) {
            self.queue
                .extend(dependencies.iter().map(|(name, range)| Requirement {
                    parent: Some(node),
                    name: name.clone(),
                    range: range.clone(),
                }));
        }
    }

    fn fail(&mut self, requirement: Requirement, error: ResolveError) {
        match requirement.parent {
            Some(parent) => self.graph.mark_unresolved(
                parent,
                UnresolvedDependency {
                    name: requirement.name,
                    range: requirement.range,
                    error,
                },
            ),
            None => self.root = Some(Err(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    include!("graph.test.rs");
}
