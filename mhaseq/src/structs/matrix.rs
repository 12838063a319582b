//! 4x4 homogeneous matrices for tracker and display transforms.
//!
//! Sequence files store the upper three rows of each affine transform in
//! row-major order; the bottom row is always `0 0 0 1`.

use nalgebra::Matrix4;

/// Number of stored coefficients per transform (rows 0..3 of a 4x4 matrix).
pub const AFFINE_COEFFICIENTS: usize = 12;

/// Row-major 4x4 rows, the layout used by configuration files.
pub type Rows4 = [[f64; 4]; 4];

/// Builds a 4x4 matrix from the 12 row-major coefficients of its top three
/// rows.
pub fn affine_from_coefficients(coefficients: &[f64; AFFINE_COEFFICIENTS]) -> Matrix4<f64> {
    let mut matrix = Matrix4::identity();
    for (i, &value) in coefficients.iter().enumerate() {
        matrix[(i / 4, i % 4)] = value;
    }
    matrix
}

/// The 12 row-major coefficients of the top three rows.
pub fn coefficients_of(matrix: &Matrix4<f64>) -> [f64; AFFINE_COEFFICIENTS] {
    std::array::from_fn(|i| matrix[(i / 4, i % 4)])
}

pub fn from_rows(rows: &Rows4) -> Matrix4<f64> {
    Matrix4::from_fn(|r, c| rows[r][c])
}

pub fn to_rows(matrix: &Matrix4<f64>) -> Rows4 {
    std::array::from_fn(|r| std::array::from_fn(|c| matrix[(r, c)]))
}

/// True when the bottom row is exactly `0 0 0 1`.
pub fn is_affine(matrix: &Matrix4<f64>) -> bool {
    matrix[(3, 0)] == 0.0 && matrix[(3, 1)] == 0.0 && matrix[(3, 2)] == 0.0 && matrix[(3, 3)] == 1.0
}

/// One line per row, space separated, as written in sequence headers.
pub fn format_rows(matrix: &Matrix4<f64>) -> Vec<String> {
    (0..4)
        .map(|r| {
            (0..4)
                .map(|c| format!("{:>12.6}", matrix[(r, c)]))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_fill_rows() {
        let coefficients = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0,
        ];
        let matrix = affine_from_coefficients(&coefficients);

        assert_eq!(matrix[(0, 3)], 4.0);
        assert_eq!(matrix[(1, 0)], 5.0);
        assert_eq!(matrix[(2, 3)], 12.0);
        assert!(is_affine(&matrix));
        assert_eq!(coefficients_of(&matrix), coefficients);
    }

    #[test]
    fn rows_layout_is_row_major() {
        let rows = [
            [1.0, 0.0, 0.0, 10.0],
            [0.0, 2.0, 0.0, 20.0],
            [0.0, 0.0, 3.0, 30.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let matrix = from_rows(&rows);
        assert_eq!(matrix[(1, 3)], 20.0);
        assert_eq!(to_rows(&matrix), rows);
    }
}
