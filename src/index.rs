//! Flat exact inner-product index.
//!
//! Stores embedding vectors as a row-major matrix and answers top-K queries
//! by exhaustively scoring every row. There is no approximation and no
//! sentinel slots: a query against N rows returns at most N results.
//!
//! Row `i` is segment `i`'s embedding; the index doubles as the embedding
//! matrix, which is what keeps segment ids, matrix rows, and index rows in
//! lockstep. Rows are append-only at build time and read-only afterwards.

use anyhow::{bail, Result};

/// Exhaustive inner-product index over unit-normalized vectors.
///
/// Because every stored and query vector is unit-normalized, the inner
/// product it ranks by is exactly cosine similarity.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dims: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of `dims` dimensions.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            data: Vec::new(),
        }
    }

    /// Append one vector; its row index is the value `len()` had before the
    /// call.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector's dimensionality does not match.
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dims {
            bail!(
                "Vector dimension mismatch: expected {}, got {}",
                self.dims,
                vector.len()
            );
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The stored row for `row`, or `None` past the end.
    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        if row >= self.len() {
            return None;
        }
        let start = row * self.dims;
        Some(&self.data[start..start + self.dims])
    }

    /// Top-`k` rows by inner product with `query`, in non-increasing score
    /// order. Returns fewer than `k` results when fewer rows exist, and an
    /// empty vector for an empty index.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.is_empty() || k == 0 || query.len() != self.dims {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|row| {
                let start = row * self.dims;
                let stored = &self.data[start..start + self.dims];
                let dot = stored.iter().zip(query.iter()).map(|(a, b)| a * b).sum();
                (row, dot)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}
