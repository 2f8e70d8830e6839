//! Owned dense matrix type for spectral data.
//!
//! [`SpectralMatrix`] provides safe, dimension-tracked access to a flat
//! column-major buffer. Rows are samples and columns are spectral points, so
//! a column slice (all samples at one wavelength) is contiguous, which is the
//! access pattern centering and covariance computations want.
//!
//! The matrix operations live as free functions ([`transpose`], [`matmul`],
//! [`matvec`], [`tr_matvec`], [`solve`]) and every one of them returns a
//! newly owned value. There are no views and no aliasing.

use nalgebra::DMatrix;

/// Column-major dense matrix of spectral intensities.
///
/// Stores data in a flat `Vec<f64>` with column-major (Fortran) layout:
/// element `(row, col)` is at index `row + col * nrows`.
///
/// # Conventions
///
/// Rows represent samples and columns represent spectral points. A dataset of
/// N samples with M-point spectra is an N x M matrix.
///
/// # Examples
///
/// ```
/// use chemcal_core::matrix::SpectralMatrix;
///
/// // 2 samples, 3 spectral points
/// let mat = SpectralMatrix::from_rows(&[
///     vec![1.0, 2.0, 3.0],
///     vec![4.0, 5.0, 6.0],
/// ]).unwrap();
///
/// assert_eq!(mat[(0, 1)], 2.0);
/// assert_eq!(mat.column(2), &[3.0, 6.0]);
/// assert_eq!(mat.row(1), vec![4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralMatrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl SpectralMatrix {
    /// Create from flat column-major data with dimension validation.
    ///
    /// Returns `None` if `data.len() != nrows * ncols`.
    pub fn from_column_major(data: Vec<f64>, nrows: usize, ncols: usize) -> Option<Self> {
        if data.len() != nrows * ncols {
            return None;
        }
        Some(Self { data, nrows, ncols })
    }

    /// Create from a slice of row vectors (one spectrum per row).
    ///
    /// Returns `None` if the rows do not all share the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != ncols) {
            return None;
        }
        let mut data = vec![0.0; nrows * ncols];
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                data[i + j * nrows] = value;
            }
        }
        Some(Self { data, nrows, ncols })
    }

    /// Create a zero-filled matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Number of rows (samples).
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns (spectral points).
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Dimensions as `(nrows, ncols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Whether the matrix has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a contiguous column slice (zero-copy).
    ///
    /// # Panics
    /// Panics if `col >= ncols`.
    #[inline]
    pub fn column(&self, col: usize) -> &[f64] {
        let start = col * self.nrows;
        &self.data[start..start + self.nrows]
    }

    /// Extract a single row as a new `Vec<f64>`.
    ///
    /// O(ncols), rows are not contiguous in column-major layout.
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.ncols)
            .map(|j| self.data[row + j * self.nrows])
            .collect()
    }

    /// Extract all rows as `Vec<Vec<f64>>`.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.nrows).map(|i| self.row(i)).collect()
    }

    /// New matrix containing only the selected rows, in the given order.
    ///
    /// Out-of-range indices are skipped; the leave-one-out folds use this to
    /// assemble each training subset.
    pub fn select_rows(&self, indices: &[usize]) -> SpectralMatrix {
        let kept: Vec<usize> = indices.iter().copied().filter(|&i| i < self.nrows).collect();
        let mut out = SpectralMatrix::zeros(kept.len(), self.ncols);
        for (new_i, &old_i) in kept.iter().enumerate() {
            for j in 0..self.ncols {
                out[(new_i, j)] = self.data[old_i + j * self.nrows];
            }
        }
        out
    }

    /// Per-column means, length `ncols`.
    ///
    /// Returns an all-zero vector when the matrix has no rows.
    pub fn column_means(&self) -> Vec<f64> {
        if self.nrows == 0 {
            return vec![0.0; self.ncols];
        }
        (0..self.ncols)
            .map(|j| self.column(j).iter().sum::<f64>() / self.nrows as f64)
            .collect()
    }

    /// Flat slice of the underlying column-major data (zero-copy).
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Convert to a nalgebra `DMatrix<f64>`.
    ///
    /// Both use column-major layout, so this is a straight copy.
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.nrows, self.ncols, &self.data)
    }

    /// Create from a nalgebra `DMatrix<f64>`.
    pub fn from_dmatrix(mat: &DMatrix<f64>) -> Self {
        let (nrows, ncols) = mat.shape();
        Self {
            data: mat.as_slice().to_vec(),
            nrows,
            ncols,
        }
    }
}

impl std::ops::Index<(usize, usize)> for SpectralMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        debug_assert!(
            row < self.nrows && col < self.ncols,
            "SpectralMatrix index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &self.data[row + col * self.nrows]
    }
}

impl std::ops::IndexMut<(usize, usize)> for SpectralMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        debug_assert!(
            row < self.nrows && col < self.ncols,
            "SpectralMatrix index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &mut self.data[row + col * self.nrows]
    }
}

impl std::fmt::Display for SpectralMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpectralMatrix({}x{})", self.nrows, self.ncols)
    }
}

/// Transpose, returning a newly owned matrix.
pub fn transpose(a: &SpectralMatrix) -> SpectralMatrix {
    let (n, m) = a.shape();
    let mut out = SpectralMatrix::zeros(m, n);
    for j in 0..m {
        for i in 0..n {
            out[(j, i)] = a[(i, j)];
        }
    }
    out
}

/// Matrix product `a * b`, or `None` on a dimension mismatch.
pub fn matmul(a: &SpectralMatrix, b: &SpectralMatrix) -> Option<SpectralMatrix> {
    let (n, k) = a.shape();
    let (k2, m) = b.shape();
    if k != k2 {
        return None;
    }
    let mut out = SpectralMatrix::zeros(n, m);
    for j in 0..m {
        let b_col = b.column(j);
        for i in 0..n {
            let mut sum = 0.0;
            for (l, &b_lj) in b_col.iter().enumerate() {
                sum += a[(i, l)] * b_lj;
            }
            out[(i, j)] = sum;
        }
    }
    Some(out)
}

/// Matrix-vector product `a * v`, length `nrows`.
///
/// Extra elements of `v` beyond `ncols` are ignored.
pub fn matvec(a: &SpectralMatrix, v: &[f64]) -> Vec<f64> {
    let (n, m) = a.shape();
    let cols = m.min(v.len());
    let mut out = vec![0.0; n];
    for (j, &vj) in v.iter().take(cols).enumerate() {
        let col = a.column(j);
        for i in 0..n {
            out[i] += col[i] * vj;
        }
    }
    out
}

/// Transposed matrix-vector product `a' * v`, length `ncols`.
///
/// Column slices are contiguous, so this never materializes the transpose.
pub fn tr_matvec(a: &SpectralMatrix, v: &[f64]) -> Vec<f64> {
    let (n, m) = a.shape();
    let rows = n.min(v.len());
    (0..m)
        .map(|j| {
            let col = a.column(j);
            (0..rows).map(|i| col[i] * v[i]).sum()
        })
        .collect()
}

/// Solve the linear system `a * x = b` for `x` via LU decomposition.
///
/// Returns `None` when `a` is not square, dimensions mismatch, or the system
/// is singular.
pub fn solve(a: &SpectralMatrix, b: &SpectralMatrix) -> Option<SpectralMatrix> {
    let (n, m) = a.shape();
    if n != m || b.nrows() != n {
        return None;
    }
    let lu = a.to_dmatrix().lu();
    lu.solve(&b.to_dmatrix()).map(|x| SpectralMatrix::from_dmatrix(&x))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_3x4() -> SpectralMatrix {
        SpectralMatrix::from_rows(&[
            vec![1.0, 4.0, 7.0, 10.0],
            vec![2.0, 5.0, 8.0, 11.0],
            vec![3.0, 6.0, 9.0, 12.0],
        ])
        .unwrap()
    }

    // ============== Construction tests ==============

    #[test]
    fn test_from_column_major_valid() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mat = SpectralMatrix::from_column_major(data, 2, 3).unwrap();
        assert_eq!(mat.shape(), (2, 3));
        assert_eq!(mat[(0, 0)], 1.0);
        assert_eq!(mat[(1, 0)], 2.0);
        assert_eq!(mat[(0, 1)], 3.0);
    }

    #[test]
    fn test_from_column_major_invalid() {
        assert!(SpectralMatrix::from_column_major(vec![1.0, 2.0], 3, 4).is_none());
    }

    #[test]
    fn test_from_rows_valid() {
        let mat = sample_3x4();
        assert_eq!(mat.shape(), (3, 4));
        assert_eq!(mat.row(0), vec![1.0, 4.0, 7.0, 10.0]);
        assert_eq!(mat.row(2), vec![3.0, 6.0, 9.0, 12.0]);
        assert_eq!(mat.column(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_rows_ragged() {
        assert!(SpectralMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_none());
    }

    #[test]
    fn test_from_rows_empty() {
        let mat = SpectralMatrix::from_rows(&[]).unwrap();
        assert!(mat.is_empty());
        assert_eq!(mat.shape(), (0, 0));
    }

    #[test]
    fn test_zeros() {
        let mat = SpectralMatrix::zeros(2, 3);
        for j in 0..3 {
            for i in 0..2 {
                assert_eq!(mat[(i, j)], 0.0);
            }
        }
    }

    // ============== Accessor tests ==============

    #[test]
    fn test_index_mut() {
        let mut mat = sample_3x4();
        mat[(1, 2)] = 99.0;
        assert_eq!(mat[(1, 2)], 99.0);
    }

    #[test]
    fn test_rows_round_trip() {
        let mat = sample_3x4();
        let back = SpectralMatrix::from_rows(&mat.rows()).unwrap();
        assert_eq!(mat, back);
    }

    #[test]
    fn test_select_rows() {
        let mat = sample_3x4();
        let sub = mat.select_rows(&[2, 0]);
        assert_eq!(sub.shape(), (2, 4));
        assert_eq!(sub.row(0), vec![3.0, 6.0, 9.0, 12.0]);
        assert_eq!(sub.row(1), vec![1.0, 4.0, 7.0, 10.0]);
    }

    #[test]
    fn test_select_rows_skips_out_of_range() {
        let mat = sample_3x4();
        let sub = mat.select_rows(&[0, 7]);
        assert_eq!(sub.shape(), (1, 4));
    }

    #[test]
    fn test_column_means() {
        let mat = sample_3x4();
        let means = mat.column_means();
        assert_eq!(means, vec![2.0, 5.0, 8.0, 11.0]);
    }

    #[test]
    fn test_column_major_layout_matches_manual() {
        // SpectralMatrix[(i, j)] == data[i + j * n] for all i, j
        let n = 5;
        let m = 7;
        let data: Vec<f64> = (0..n * m).map(|x| x as f64).collect();
        let mat = SpectralMatrix::from_column_major(data.clone(), n, m).unwrap();
        for j in 0..m {
            for i in 0..n {
                assert_eq!(mat[(i, j)], data[i + j * n]);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", sample_3x4()), "SpectralMatrix(3x4)");
    }

    // ============== Free-function op tests ==============

    #[test]
    fn test_transpose() {
        let mat = sample_3x4();
        let t = transpose(&mat);
        assert_eq!(t.shape(), (4, 3));
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(t[(j, i)], mat[(i, j)]);
            }
        }
    }

    #[test]
    fn test_transpose_leaves_input_intact() {
        let mat = sample_3x4();
        let copy = mat.clone();
        let _ = transpose(&mat);
        assert_eq!(mat, copy);
    }

    #[test]
    fn test_matmul_identity() {
        let mat = sample_3x4();
        let mut eye = SpectralMatrix::zeros(4, 4);
        for i in 0..4 {
            eye[(i, i)] = 1.0;
        }
        let prod = matmul(&mat, &eye).unwrap();
        assert_eq!(prod, mat);
    }

    #[test]
    fn test_matmul_known_product() {
        let a = SpectralMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = SpectralMatrix::from_rows(&[vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
        let c = matmul(&a, &b).unwrap();
        assert_eq!(c.row(0), vec![19.0, 22.0]);
        assert_eq!(c.row(1), vec![43.0, 50.0]);
    }

    #[test]
    fn test_matmul_dimension_mismatch() {
        let a = SpectralMatrix::zeros(2, 3);
        let b = SpectralMatrix::zeros(2, 3);
        assert!(matmul(&a, &b).is_none());
    }

    #[test]
    fn test_matvec() {
        let mat = sample_3x4();
        let v = vec![1.0, 0.0, 0.0, 1.0];
        assert_eq!(matvec(&mat, &v), vec![11.0, 13.0, 15.0]);
    }

    #[test]
    fn test_tr_matvec_matches_explicit_transpose() {
        let mat = sample_3x4();
        let v = vec![1.0, -1.0, 2.0];
        let direct = tr_matvec(&mat, &v);
        let via_transpose = matvec(&transpose(&mat), &v);
        for (a, b) in direct.iter().zip(via_transpose.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_solve_identity() {
        let mut eye = SpectralMatrix::zeros(3, 3);
        for i in 0..3 {
            eye[(i, i)] = 1.0;
        }
        let b = SpectralMatrix::from_rows(&[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let x = solve(&eye, &b).unwrap();
        assert_eq!(x.column(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_solve_known_system() {
        // 2x + y = 5, x + 3y = 10 -> x = 1, y = 3
        let a = SpectralMatrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        let b = SpectralMatrix::from_rows(&[vec![5.0], vec![10.0]]).unwrap();
        let x = solve(&a, &b).unwrap();
        assert!((x[(0, 0)] - 1.0).abs() < 1e-10);
        assert!((x[(1, 0)] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_solve_singular_returns_none() {
        let a = SpectralMatrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        let b = SpectralMatrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        assert!(solve(&a, &b).is_none());
    }

    #[test]
    fn test_solve_non_square_returns_none() {
        let a = SpectralMatrix::zeros(2, 3);
        let b = SpectralMatrix::zeros(2, 1);
        assert!(solve(&a, &b).is_none());
    }

    #[test]
    fn test_nalgebra_round_trip() {
        let mat = sample_3x4();
        let back = SpectralMatrix::from_dmatrix(&mat.to_dmatrix());
        assert_eq!(mat, back);
    }
}
