//! Named per-loop color layers and per-vertex weight groups.

use std::collections::HashMap;

use crate::error::{InkError, Result};

/// Loop-indexed RGBA colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLayer {
    pub name: String,
    pub data: Vec<[f32; 4]>,
}

impl ColorLayer {
    pub fn new(name: &str, loop_count: usize, fill: [f32; 4]) -> Self {
        Self { name: name.to_string(), data: vec![fill; loop_count] }
    }
}

/// Sparse vertex-index to weight mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexGroup {
    pub name: String,
    weights: HashMap<u32, f32>,
}

impl VertexGroup {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), weights: HashMap::new() }
    }

    pub fn from_weights(name: &str, weights: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let mut group = Self::new(name);
        for (v, w) in weights {
            group.assign(v, w);
        }
        group
    }

    /// Set a vertex weight, clamped to [0, 1].
    pub fn assign(&mut self, vertex: u32, weight: f32) {
        self.weights.insert(vertex, weight.clamp(0.0, 1.0));
    }

    pub fn remove(&mut self, vertex: u32) -> Option<f32> {
        self.weights.remove(&vertex)
    }

    /// Weight of `vertex`; fails when the vertex is not a member of the group.
    pub fn weight(&self, vertex: u32) -> Result<f32> {
        self.weights
            .get(&vertex)
            .copied()
            .ok_or_else(|| InkError::WeightNotFound { group: self.name.clone(), vertex })
    }

    pub fn len(&self) -> usize { self.weights.len() }
    pub fn is_empty(&self) -> bool { self.weights.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_vertex_is_an_error() {
        let g = VertexGroup::from_weights("Group", [(0, 0.25)]);
        assert_eq!(g.weight(0).unwrap(), 0.25);
        assert!(matches!(g.weight(3), Err(InkError::WeightNotFound { vertex: 3, .. })));
    }

    #[test]
    fn weights_are_clamped() {
        let mut g = VertexGroup::new("Group");
        g.assign(1, 1.5);
        g.assign(2, -0.5);
        assert_eq!(g.weight(1).unwrap(), 1.0);
        assert_eq!(g.weight(2).unwrap(), 0.0);
    }
}
