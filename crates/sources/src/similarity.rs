//! Dense cosine similarity matrices.
//!
//! Both the item-item (genre) and the user-user (rating) matrices are built
//! here from sparse feature rows. Entries a row does not carry count as zero
//! in the dot product; callers decide what "not carried" means for them.

use rayon::prelude::*;
use std::cmp::Ordering;

/// Sparse feature vector: `(feature index, value)` pairs sorted by index,
/// each index at most once.
pub type SparseRow = Vec<(usize, f32)>;

/// Symmetric, dense `n x n` matrix of cosine similarities.
///
/// Values lie in `[-1, 1]`. The diagonal is exactly `1.0` for every row with
/// a nonzero norm. A zero-norm row has no defined direction, so its whole
/// row and column (diagonal included) hold `0.0`.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute pairwise cosine similarity of `rows`.
    ///
    /// Rows are filled in parallel, one Rayon task per row, straight into
    /// the final buffer. The matrix is returned only after every row is
    /// written.
    pub fn cosine(rows: &[SparseRow]) -> Self {
        let n = rows.len();
        if n == 0 {
            return Self { n, values: Vec::new() };
        }

        let norms: Vec<f64> = rows.par_iter().map(|row| dot(row, row).sqrt()).collect();
        let mut values = vec![0.0f32; n * n];

        values
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, out)| {
                if norms[i] == 0.0 {
                    return;
                }
                for (j, cell) in out.iter_mut().enumerate() {
                    if i == j {
                        *cell = 1.0;
                    } else if norms[j] != 0.0 {
                        let sim = dot(&rows[i], &rows[j]) / (norms[i] * norms[j]);
                        *cell = sim.clamp(-1.0, 1.0) as f32;
                    }
                }
            });

        Self { n, values }
    }

    /// Number of rows (and columns)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// Every other row ordered by descending similarity to `i`.
    ///
    /// The sort is stable, so equal similarities keep row order. Row `i`
    /// itself is removed explicitly rather than assumed to rank first.
    pub fn neighbours(&self, i: usize) -> Vec<usize> {
        let row = self.row(i);
        let mut order: Vec<usize> = (0..self.n).filter(|&j| j != i).collect();
        order.sort_by(|&a, &b| row[b].partial_cmp(&row[a]).unwrap_or(Ordering::Equal));
        order
    }
}

/// Dot product of two sorted sparse rows (merge join)
fn dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0f64;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a[i].1 as f64 * b[j].1 as f64;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<SparseRow> {
        vec![
            vec![(0, 1.0), (1, 1.0)],
            vec![(0, 1.0)],
            vec![(1, 1.0)],
            vec![],
            vec![(0, 4.0), (2, 2.5), (5, 1.0)],
        ]
    }

    #[test]
    fn test_known_values() {
        let m = SimilarityMatrix::cosine(&sample_rows());

        assert!((m.get(0, 1) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(m.get(1, 2), 0.0);
        assert_eq!(m.get(0, 0), 1.0);
    }

    #[test]
    fn test_symmetric() {
        let m = SimilarityMatrix::cosine(&sample_rows());
        for i in 0..m.len() {
            for j in 0..m.len() {
                assert_eq!(m.get(i, j), m.get(j, i), "({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_self_similarity_is_maximal() {
        let m = SimilarityMatrix::cosine(&sample_rows());
        for i in [0, 1, 2, 4] {
            for j in 0..m.len() {
                assert!(m.get(i, i) >= m.get(i, j));
            }
        }
    }

    #[test]
    fn test_zero_norm_row() {
        let m = SimilarityMatrix::cosine(&sample_rows());
        assert!(m.row(3).iter().all(|&v| v == 0.0));
        assert!((0..m.len()).all(|i| m.get(i, 3) == 0.0));
    }

    #[test]
    fn test_neighbours_excludes_self_and_is_stable() {
        let m = SimilarityMatrix::cosine(&sample_rows());

        let order = m.neighbours(0);
        assert!(!order.contains(&0));
        assert_eq!(order.len(), 4);
        // rows 1 and 2 tie with row 0; row order decides
        assert_eq!(&order[..2], &[1, 2]);
    }

    #[test]
    fn test_empty() {
        let m = SimilarityMatrix::cosine(&[]);
        assert!(m.is_empty());
    }
}
