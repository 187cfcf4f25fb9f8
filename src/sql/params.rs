//! Positional parameter accumulation
//!
//! A [`ParamAllocator`] pairs every `$n` placeholder with the value bound to
//! it. Composers create one per call and hand its values back to the caller;
//! it is never stored or shared between compositions.

use serde_json::Value;

/// Ordered list of bound values, handing out 1-based placeholder indices.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParamAllocator {
    values: Vec<Value>,
}

impl ParamAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` and return the placeholder index it binds to.
    pub fn push(&mut self, value: impl Into<Value>) -> usize {
        self.values.push(value.into());
        self.values.len()
    }

    /// Index the next pushed value would receive.
    pub fn next_index(&self) -> usize {
        self.values.len() + 1
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
