use std::cmp::Ordering;

use serde::Serialize;

use crate::pipeline::RetrievalTuning;

/// Sparse vector stored as `(term index, weight)` pairs sorted by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    /// Builds a vector from unsorted entries; zero weights are dropped.
    pub fn from_entries(mut entries: Vec<(usize, f32)>) -> Self {
        entries.retain(|(_, w)| *w != 0.0 && w.is_finite());
        entries.sort_by_key(|(idx, _)| *idx);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.entries
            .binary_search_by_key(&index, |(idx, _)| *idx)
            .ok()
            .and_then(|pos| self.entries.get(pos))
            .map(|(_, w)| *w)
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Scales the vector to unit length; the zero vector is left untouched.
    pub fn l2_normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in &mut self.entries {
                *w /= norm;
            }
        }
        self
    }

    pub fn dot(&self, other: &Self) -> f32 {
        let mut left = self.entries.iter().peekable();
        let mut right = other.entries.iter().peekable();
        let mut sum = 0.0f32;

        while let (Some((li, lw)), Some((ri, rw))) = (left.peek(), right.peek()) {
            match li.cmp(ri) {
                Ordering::Less => {
                    left.next();
                }
                Ordering::Greater => {
                    right.next();
                }
                Ordering::Equal => {
                    sum = lw.mul_add(*rw, sum);
                    left.next();
                    right.next();
                }
            }
        }

        sum
    }
}

/// A corpus row paired with its similarity to the current query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub row: usize,
    pub similarity: f32,
}

pub const fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Cosine of the angle between two sparse vectors, clamped to `[0, 1]`.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let denom = a.norm() * b.norm();
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let value = a.dot(b) / denom;
    if value.is_finite() {
        clamp_unit(value)
    } else {
        0.0
    }
}

/// Orders candidates by descending similarity; equal scores keep the lower row first.
pub fn sort_by_similarity_desc(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.row.cmp(&b.row))
    });
}

/// Threshold applied to candidates given the best similarity observed.
pub fn adaptive_threshold(max_similarity: f32, tuning: &RetrievalTuning) -> f32 {
    if max_similarity < tuning.base_threshold {
        tuning
            .adaptive_floor
            .max(max_similarity * tuning.adaptive_ratio)
    } else {
        tuning.base_threshold
    }
}
