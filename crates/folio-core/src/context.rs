//! Explicit context tree built by the composition root.
//!
//! A `Scope` is an immutable node: providing a value yields a child scope, and
//! lookups walk towards the root until the nearest provider of that type.

use std::any::{Any, TypeId};
use std::sync::Arc;

struct Provided {
    type_id: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

struct ScopeNode {
    parent: Option<Scope>,
    provided: Option<Provided>,
}

/// Node in the context tree.
#[derive(Clone)]
pub struct Scope {
    node: Arc<ScopeNode>,
}

impl Scope {
    /// Empty root scope.
    #[must_use]
    pub fn root() -> Self {
        Self {
            node: Arc::new(ScopeNode {
                parent: None,
                provided: None,
            }),
        }
    }

    /// Child scope that provides `value` to everything below it.
    #[must_use]
    pub fn provide<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            node: Arc::new(ScopeNode {
                parent: Some(self.clone()),
                provided: Some(Provided {
                    type_id: TypeId::of::<T>(),
                    value: Arc::new(value),
                }),
            }),
        }
    }

    /// Nearest provided value of type `T`.
    #[must_use]
    pub fn get<T>(&self) -> Option<T>
    where
        T: Any + Send + Sync + Clone,
    {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(provided) = &scope.node.provided {
                if provided.type_id == TypeId::of::<T>() {
                    return provided.value.downcast_ref::<T>().cloned();
                }
            }
            current = scope.node.parent.as_ref();
        }
        None
    }

    /// Whether a value of type `T` is provided at or above this scope.
    #[must_use]
    pub fn contains<T>(&self) -> bool
    where
        T: Any + Send + Sync + Clone,
    {
        self.get::<T>().is_some()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::root()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut depth = 0_usize;
        let mut current = self.node.parent.as_ref();
        while let Some(scope) = current {
            depth += 1;
            current = scope.node.parent.as_ref();
        }
        formatter.debug_struct("Scope").field("depth", &depth).finish()
    }
}
