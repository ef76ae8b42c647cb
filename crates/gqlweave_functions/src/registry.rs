//! Name-keyed function registry.

use crate::function::Function;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of functions addressable by name.
///
/// Registration is last-write-wins: a later registration under an
/// existing name silently replaces the earlier one.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Mutex<FxHashMap<String, Arc<dyn Function>>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function under its own name.
    pub fn register(&self, function: Arc<dyn Function>) {
        let name = function.name().to_string();
        self.lock().insert(name, function);
    }

    /// Looks up a function by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.lock().get(name).cloned()
    }

    /// Returns the registered names.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Returns the number of registered functions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<String, Arc<dyn Function>>> {
        match self.functions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("len", &self.len())
            .finish()
    }
}
