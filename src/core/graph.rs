//! core::graph
//!
//! Dependency graph over the assets of one or more analyzed files.
//!
//! # Architecture
//!
//! The graph is a DAG where:
//! - Nodes are assets (`AssetId`), including assets referenced in other files
//! - Edges point from an asset to the assets it depends on
//! - Edges may cross file boundaries (e.g. an object linked from a library)
//!
//! # Invariants
//!
//! Checked by [`AssetGraph::validate`]:
//! - `(subname, mimetype)` is unique within a file
//! - A dependency naming the same file must name an asset of that file
//! - The graph is acyclic
//!
//! References into files that were not added to the graph are accepted;
//! they are resolved later, when that file is loaded.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::metadata::schema::FileReference;
use super::types::{AssetId, FileId};

/// Violations of the asset graph invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("duplicate asset {asset} in {file}")]
    DuplicateAsset { file: FileId, asset: AssetId },

    #[error("{asset} depends on {dependency}, which is not part of {file}")]
    DanglingDependency {
        file: FileId,
        asset: AssetId,
        dependency: AssetId,
    },

    #[error("dependency cycle: {}", format_cycle(.0))]
    Cycle(Vec<AssetId>),
}

fn format_cycle(path: &[AssetId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The dependency graph derived from analyzed files.
///
/// This is an in-memory index; it is rebuilt from `FileReference`s and never
/// persisted.
#[derive(Debug, Default)]
pub struct AssetGraph {
    /// Outgoing edges, in declaration order.
    dependencies: BTreeMap<AssetId, Vec<AssetId>>,
    /// Assets declared by each loaded file.
    files: BTreeMap<FileId, BTreeSet<AssetId>>,
    /// Duplicate declarations seen while loading.
    duplicates: Vec<(FileId, AssetId)>,
}

impl AssetGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a single file.
    pub fn from_file(file: &FileReference) -> Self {
        let mut graph = Self::new();
        graph.add_file(file);
        graph
    }

    /// Add every asset and dependency edge of `file`.
    pub fn add_file(&mut self, file: &FileReference) {
        let declared = self.files.entry(file.file.clone()).or_default();
        for asset in &file.assets {
            if !declared.insert(asset.asset.clone()) {
                self.duplicates
                    .push((file.file.clone(), asset.asset.clone()));
            }
        }

        for asset in &file.assets {
            self.dependencies
                .entry(asset.asset.clone())
                .or_default()
                .extend(asset.dependencies.iter().cloned());
        }
    }

    /// Direct dependencies of an asset.
    pub fn dependencies(&self, asset: &AssetId) -> &[AssetId] {
        self.dependencies
            .get(asset)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check the graph invariants.
    pub fn validate(&self) -> Result<(), GraphError> {
        if let Some((file, asset)) = self.duplicates.first() {
            return Err(GraphError::DuplicateAsset {
                file: file.clone(),
                asset: asset.clone(),
            });
        }

        for (file, declared) in &self.files {
            for asset in declared {
                for dep in self.dependencies(asset) {
                    if &dep.file == file && !declared.contains(dep) {
                        return Err(GraphError::DanglingDependency {
                            file: file.clone(),
                            asset: asset.clone(),
                            dependency: dep.clone(),
                        });
                    }
                }
            }
        }

        match self.find_cycle() {
            Some(path) => Err(GraphError::Cycle(path)),
            None => Ok(()),
        }
    }

    /// Find a dependency cycle.
    ///
    /// Returns the cycle as a path whose first and last element are the same
    /// asset.
    pub fn find_cycle(&self) -> Option<Vec<AssetId>> {
        let mut visited = BTreeSet::new();
        let mut path = Vec::new();

        for asset in self.dependencies.keys() {
            if let Some(cycle) = self.cycle_from(asset, &mut visited, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn cycle_from<'a>(
        &'a self,
        asset: &'a AssetId,
        visited: &mut BTreeSet<&'a AssetId>,
        path: &mut Vec<&'a AssetId>,
    ) -> Option<Vec<AssetId>> {
        if let Some(start) = path.iter().position(|a| *a == asset) {
            let mut cycle: Vec<AssetId> = path[start..].iter().map(|a| (*a).clone()).collect();
            cycle.push(asset.clone());
            return Some(cycle);
        }
        if !visited.insert(asset) {
            return None;
        }

        path.push(asset);
        for dep in self.dependencies(asset) {
            if let Some(cycle) = self.cycle_from(dep, visited, path) {
                return Some(cycle);
            }
        }
        path.pop();
        None
    }
}
