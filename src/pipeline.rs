//! Ordered, immutable chains of passes.
//!
//! A [`PipelineBuilder`] collects `(priority, pass)` entries; [`PipelineBuilder::build`]
//! sorts them once (stable, lowest priority first) into a [`Pipeline`]. To change
//! a built pipeline, derive a builder from it with [`Pipeline::to_builder`] and
//! build again; the original is never touched, so a pipeline can be shared
//! between threads that process separate queries.
//!
//! ```
//! use lucene_query::{Pipeline, visitors::{CleanupQueryVisitor, ValidationVisitor}};
//!
//! let pipeline = Pipeline::builder()
//!     .add(ValidationVisitor::new(), 30)
//!     .add_before::<ValidationVisitor, _>(CleanupQueryVisitor::new())
//!     .unwrap()
//!     .build();
//! assert_eq!(pipeline.len(), 2);
//! ```

use std::{
    any::{TypeId, type_name},
    sync::Arc,
};

use tracing::{debug, debug_span};

use crate::{
    ast::{NodeId, QueryAst},
    context::QueryContext,
    error::{QueryError, Result},
    visitor::ChainableVisitor,
};

#[derive(Clone)]
struct Entry {
    priority: i32,
    type_id: TypeId,
    pass: Arc<dyn ChainableVisitor>,
}

/// Mutable staging area for a [`Pipeline`].
#[derive(Clone, Default)]
pub struct PipelineBuilder {
    entries: Vec<Entry>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<P: ChainableVisitor + 'static>(mut self, pass: P, priority: i32) -> Self {
        self.entries.push(Entry {
            priority,
            type_id: TypeId::of::<P>(),
            pass: Arc::new(pass),
        });
        self
    }

    /// Removes every pass of type `T`.
    pub fn remove<T: 'static>(mut self) -> Self {
        let target = TypeId::of::<T>();
        self.entries.retain(|entry| entry.type_id != target);
        self
    }

    /// Swaps the first pass of type `T` for `pass`.
    ///
    /// Without an explicit priority the new pass runs just before where `T` ran.
    pub fn replace<T: 'static, P: ChainableVisitor + 'static>(
        mut self,
        pass: P,
        priority: Option<i32>,
    ) -> Result<Self> {
        let index = self.position::<T>()?;
        let existing = self.entries.remove(index);
        let priority = priority.unwrap_or(existing.priority - 1);
        Ok(self.add(pass, priority))
    }

    pub fn add_before<T: 'static, P: ChainableVisitor + 'static>(self, pass: P) -> Result<Self> {
        let priority = self.priority_of::<T>()?;
        Ok(self.add(pass, priority - 1))
    }

    pub fn add_after<T: 'static, P: ChainableVisitor + 'static>(self, pass: P) -> Result<Self> {
        let priority = self.priority_of::<T>()?;
        Ok(self.add(pass, priority + 1))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.position::<T>().is_ok()
    }

    fn position<T: 'static>(&self) -> Result<usize> {
        let target = TypeId::of::<T>();
        self.entries
            .iter()
            .position(|entry| entry.type_id == target)
            .ok_or(QueryError::PassNotFound(type_name::<T>()))
    }

    fn priority_of<T: 'static>(&self) -> Result<i32> {
        let index = self.position::<T>()?;
        Ok(self.entries[index].priority)
    }

    pub fn build(mut self) -> Pipeline {
        self.entries.sort_by_key(|entry| entry.priority);
        Pipeline {
            entries: self.entries.into(),
        }
    }
}

/// A sorted, read-only sequence of passes.
#[derive(Clone, Default)]
pub struct Pipeline {
    entries: Arc<[Entry]>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// A builder pre-filled with this pipeline's passes.
    pub fn to_builder(&self) -> PipelineBuilder {
        PipelineBuilder {
            entries: self.entries.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pass names in execution order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.pass.name()).collect()
    }

    /// Runs every pass over the tree's root and returns the final root.
    pub fn run(&self, ast: &mut QueryAst, ctx: &mut QueryContext) -> Result<NodeId> {
        let root = ast.root();
        self.accept(ast, root, ctx)
    }
}

impl ChainableVisitor for Pipeline {
    fn name(&self) -> &'static str {
        "Pipeline"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        let mut current = node;
        for entry in self.entries.iter() {
            let name = entry.pass.name();
            let _span = debug_span!("pass", pass = name, priority = entry.priority).entered();
            current = entry.pass.accept(ast, current, ctx)?;
            debug!(node = current.index(), "pass finished");
        }
        Ok(current)
    }
}
