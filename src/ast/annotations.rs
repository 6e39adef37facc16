use std::{any::Any, collections::HashMap, fmt, marker::PhantomData};

use crate::ast::NodeId;

/// Typed handle for one annotation slot.
///
/// Passes publish their keys as constants; readers check for presence instead
/// of assuming another pass ran.
///
/// ```
/// use lucene_query::ast::{AnnotationKey, QueryAst};
///
/// const SCORE: AnnotationKey<f64> = AnnotationKey::new("@score");
///
/// let mut ast = QueryAst::new();
/// let root = ast.root();
/// ast.annotations_mut().set(&SCORE, root, 1.5);
/// assert_eq!(ast.annotations().get(&SCORE, root), Some(&1.5));
/// ```
pub struct AnnotationKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AnnotationKey<T> {
    pub const fn new(name: &'static str) -> Self {
        AnnotationKey {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Field name before a resolver renamed it.
pub const ORIGINAL_FIELD: AnnotationKey<String> = AnnotationKey::new("@OriginalField");

/// Aggregation/sort operation assigned to a node (`terms`, `min`, ...).
pub const OPERATION_TYPE: AnnotationKey<String> = AnnotationKey::new("@OperationType");

/// Set when no field resolver could map the node's field.
pub const UNRESOLVED_FIELD: AnnotationKey<bool> = AnnotationKey::new("@IsFieldUnresolved");

/// Name of the include a spliced group was expanded from.
pub const INCLUDE_NAME: AnnotationKey<String> = AnnotationKey::new("@IncludeName");

type Slot = HashMap<NodeId, Box<dyn Any + Send + Sync>>;

/// Per-node side tables, one per annotation key.
#[derive(Default)]
pub struct Annotations {
    slots: HashMap<&'static str, Slot>,
}

impl Annotations {
    pub fn get<T: 'static>(&self, key: &AnnotationKey<T>, node: NodeId) -> Option<&T> {
        self.slots
            .get(key.name)
            .and_then(|slot| slot.get(&node))
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self, key: &AnnotationKey<T>, node: NodeId) -> Option<&mut T> {
        self.slots
            .get_mut(key.name)
            .and_then(|slot| slot.get_mut(&node))
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn set<T: Any + Send + Sync>(&mut self, key: &AnnotationKey<T>, node: NodeId, value: T) {
        self.slots
            .entry(key.name)
            .or_default()
            .insert(node, Box::new(value));
    }

    /// Sets the value only when the slot is empty. Returns whether it was set.
    pub fn set_if_absent<T: Any + Send + Sync>(
        &mut self,
        key: &AnnotationKey<T>,
        node: NodeId,
        value: T,
    ) -> bool {
        let slot = self.slots.entry(key.name).or_default();
        if slot.contains_key(&node) {
            return false;
        }
        slot.insert(node, Box::new(value));
        true
    }

    pub fn remove<T: 'static>(&mut self, key: &AnnotationKey<T>, node: NodeId) -> Option<T> {
        let value = self.slots.get_mut(key.name)?.remove(&node)?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn contains<T: 'static>(&self, key: &AnnotationKey<T>, node: NodeId) -> bool {
        self.get(key, node).is_some()
    }

    /// Nodes carrying a value for `key`, in id order.
    pub fn nodes_with<T: 'static>(&self, key: &AnnotationKey<T>) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .slots
            .get(key.name)
            .map(|slot| slot.keys().copied().collect())
            .unwrap_or_default();
        nodes.sort();
        nodes
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, slot) in &self.slots {
            map.entry(name, &slot.len());
        }
        map.finish()
    }
}
