//! In-memory registry
//!
//! Serves packuments from a map and records how it was used: fetches per
//! name, in-flight fetches, and the peak number of concurrent fetches.
//! Latency, transient failures, and never-answering names can be scripted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{PackageMetadata, RegistryClient, RegistryError};

/// Registry backed by in-memory packuments
#[derive(Debug, Default)]
pub struct MockRegistryClient {
    packages: HashMap<String, PackageMetadata>,
    latency: Option<Duration>,
    hanging: HashSet<String>,
    transient_failures: Mutex<HashMap<String, u32>>,
    fetch_counts: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a packument under its own name
    pub fn with_package(mut self, metadata: PackageMetadata) -> Self {
        self.packages.insert(metadata.name.clone(), metadata);
        self
    }

    /// Delay every fetch
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the first `times` fetches of `name` with a transient error
    pub fn with_transient_failures(self, name: &str, times: u32) -> Self {
        if let Ok(mut failures) = self.transient_failures.lock() {
            failures.insert(name.to_string(), times);
        }
        self
    }

    /// Never answer fetches of `name`
    pub fn with_hanging(mut self, name: &str) -> Self {
        self.hanging.insert(name.to_string());
        self
    }

    /// Number of fetches issued for `name`
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetch_counts
            .lock()
            .map(|counts| counts.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of fetches issued across all names
    pub fn total_fetches(&self) -> usize {
        self.fetch_counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Fetches currently waiting on a response
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous fetches observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record_fetch(&self, name: &str) {
        if let Ok(mut counts) = self.fetch_counts.lock() {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }

    fn take_transient_failure(&self, name: &str) -> bool {
        let Ok(mut failures) = self.transient_failures.lock() else {
            return false;
        };
        match failures.get_mut(name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Keeps the in-flight gauge honest when a fetch is cancelled mid-await
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, max_in_flight: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RegistryClient for MockRegistryClient {
    async fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        self.record_fetch(name);
        let _guard = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);

        if self.hanging.contains(name) {
            std::future::pending::<()>().await;
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.take_transient_failure(name) {
            return Err(RegistryError::Transient {
                name: name.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }
}
