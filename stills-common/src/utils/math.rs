// https://www.johndcook.com/blog/standard_deviation/
pub struct Average {
    avg: f64,
    k: f64,
}

impl Average {
    pub fn new() -> Self {
        Self { avg: 0.0, k: 0.0 }
    }

    pub fn add(&mut self, value: impl Into<f64>) {
        let value = value.into();
        self.k += 1.0;
        self.avg += (value - self.avg) / self.k;
    }

    pub fn average(&self) -> f64 {
        self.avg
    }
}

impl Default for Average {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Into<f64>> Extend<A> for Average {
    fn extend<T: IntoIterator<Item = A>>(&mut self, iter: T) {
        iter.into_iter().for_each(|a| self.add(a))
    }
}

impl<A: Into<f64>> FromIterator<A> for Average {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let mut avg = Self::new();
        avg.extend(iter);
        avg
    }
}

/// Solves `matrix * x = rhs` with gaussian elimination and partial pivoting. `matrix` is
/// given as rows and must be square with as many rows as `rhs`. Returns None if the
/// system is singular, or close enough to it.
pub fn solve_linear(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    assert_eq!(n, matrix.len());
    assert!(matrix.iter().all(|row| row.len() == n));

    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| {
            matrix[a][col].abs().total_cmp(&matrix[b][col].abs())
        })?;
        if matrix[pivot][col].abs() < 1e-12 {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let known: f64 = ((row + 1)..n).map(|k| matrix[row][k] * x[k]).sum();
        x[row] = (rhs[row] - known) / matrix[row][row];
    }
    Some(x)
}
