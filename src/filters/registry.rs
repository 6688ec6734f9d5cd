//! Explicit name → filter mapping.
//!
//! Built-in names always resolve to a [`ColorMethod`]. Custom filters are
//! registered per registry instance; there is no process-wide table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::method::ColorMethod;
use super::Filter;
use crate::color::Rgba;
use crate::error::{FilterError, FilterResult};

type SharedFilter = Arc<dyn Filter + Send>;

/// A filter found by name.
#[derive(Clone)]
pub enum ResolvedFilter {
    Builtin(ColorMethod),
    Custom(SharedFilter),
}

impl Filter for ResolvedFilter {
    fn apply(&self, index: usize, color: Rgba) -> Rgba {
        match self {
            ResolvedFilter::Builtin(method) => method.apply(index, color),
            ResolvedFilter::Custom(filter) => filter.apply(index, color),
        }
    }
}

impl fmt::Debug for ResolvedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedFilter::Builtin(method) => f.debug_tuple("Builtin").field(method).finish(),
            ResolvedFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Registry of custom filters layered over the built-in color methods.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    custom: HashMap<String, SharedFilter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom filter under `name`.
    ///
    /// Built-in names cannot be shadowed. Re-registering a custom name
    /// replaces the previous filter.
    pub fn register<F>(&mut self, name: &str, filter: F) -> FilterResult<()>
    where
        F: Filter + Send + 'static,
    {
        if ColorMethod::is_known(name) {
            return Err(FilterError::InvalidParameter(format!(
                "'{name}' is a built-in filter"
            )));
        }
        self.custom.insert(name.to_string(), Arc::new(filter));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        ColorMethod::is_known(name) || self.custom.contains_key(name)
    }

    /// Names of the registered custom filters, sorted.
    pub fn custom_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up `name`. Arguments only apply to built-ins; custom filters
    /// carry their own parameters.
    pub fn resolve(&self, name: &str, args: &[f32]) -> FilterResult<ResolvedFilter> {
        if ColorMethod::is_known(name) {
            return ColorMethod::from_name(name, args).map(ResolvedFilter::Builtin);
        }
        self.custom
            .get(name)
            .cloned()
            .map(ResolvedFilter::Custom)
            .ok_or_else(|| FilterError::UnknownFilterMethod(name.to_string()))
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("custom", &self.custom_names())
            .finish()
    }
}
