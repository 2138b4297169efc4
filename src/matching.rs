//! Square assignment problems, used to pair boxes with goals.

pub trait Matrix<T> {
    fn get(&self, row: usize, col: usize) -> T;
    fn shape(&self) -> (usize, usize);
}

/// Row-major matrix built on the fly from a predicate.
pub struct CostMatrix {
    data: Vec<u32>,
    rows: usize,
    cols: usize,
}

impl CostMatrix {
    /// Cost 0 where `compatible(row, col)` holds, 1 elsewhere.
    pub fn from_compatibility(
        rows: usize,
        cols: usize,
        compatible: impl Fn(usize, usize) -> bool,
    ) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(if compatible(row, col) { 0 } else { 1 });
            }
        }
        CostMatrix { data, rows, cols }
    }
}

impl Matrix<u32> for CostMatrix {
    fn get(&self, row: usize, col: usize) -> u32 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

/// Minimum cost assignment of rows to columns.
///
/// Returns the total cost and, for each row, the column assigned to it.
/// Non-square matrices have no assignment.
// Reference: Andrey Lopatin (https://cp-algorithms.com/graph/hungarian-algorithm.html).
pub fn hungarian_algorithm(costs: &impl Matrix<u32>) -> Option<(u64, Vec<usize>)> {
    let (size, cols) = costs.shape();
    if size != cols {
        return None;
    }
    if size == 0 {
        return Some((0, Vec::new()));
    }

    const UNBOUNDED: i64 = i64::MAX / 4;

    // Column 0 is a sentinel; real rows and columns are 1-based.
    let mut row_potential = vec![0i64; size + 1];
    let mut col_potential = vec![0i64; size + 1];
    let mut owner = vec![0usize; size + 1];
    let mut came_from = vec![0usize; size + 1];

    for row in 1..=size {
        owner[0] = row;
        let mut current = 0;
        let mut slack = vec![UNBOUNDED; size + 1];
        let mut visited = vec![false; size + 1];

        // Grow the alternating tree until it reaches a free column.
        while owner[current] != 0 {
            visited[current] = true;
            let current_row = owner[current];
            let mut step = UNBOUNDED;
            let mut next = 0;

            for col in (1..=size).filter(|&col| !visited[col]) {
                let reduced = costs.get(current_row - 1, col - 1) as i64
                    - row_potential[current_row]
                    - col_potential[col];
                if reduced < slack[col] {
                    slack[col] = reduced;
                    came_from[col] = current;
                }
                if slack[col] < step {
                    step = slack[col];
                    next = col;
                }
            }

            for col in 0..=size {
                if visited[col] {
                    row_potential[owner[col]] += step;
                    col_potential[col] -= step;
                } else {
                    slack[col] -= step;
                }
            }
            current = next;
        }

        // Flip the augmenting path back to the sentinel.
        while current != 0 {
            let previous = came_from[current];
            owner[current] = owner[previous];
            current = previous;
        }
    }

    let mut assignment = vec![0usize; size];
    for (col, &row) in owner.iter().enumerate().skip(1) {
        assignment[row - 1] = col - 1;
    }
    let total = (1..=size).map(|row| costs.get(row - 1, assignment[row - 1]) as u64).sum();

    Some((total, assignment))
}

/// Pairs every row with a distinct compatible column, if that is possible.
pub fn perfect_matching(
    rows: usize,
    cols: usize,
    compatible: impl Fn(usize, usize) -> bool,
) -> Option<Vec<usize>> {
    let costs = CostMatrix::from_compatibility(rows, cols, compatible);
    match hungarian_algorithm(&costs) {
        Some((0, assignment)) => Some(assignment),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl<T: Copy, const N: usize, const M: usize> Matrix<T> for [[T; M]; N] {
        fn get(&self, row: usize, col: usize) -> T {
            self[row][col]
        }

        fn shape(&self) -> (usize, usize) {
            (N, M)
        }
    }

    #[test]
    fn test_hungarian_algorithm() {
        let a = [[8u32, 4, 7], [5, 2, 3], [9, 4, 8]];
        let (cost, assignment) = hungarian_algorithm(&a).unwrap();
        assert_eq!(cost, 15);
        assert_eq!(assignment, vec![0, 2, 1]);
    }

    #[test]
    fn test_non_square_has_no_assignment() {
        let a = [[1u32, 2, 3], [4, 5, 6]];
        assert!(hungarian_algorithm(&a).is_none());
    }

    #[test]
    fn test_perfect_matching() {
        // row 0 fits anything, row 1 only column 0
        let matching = perfect_matching(2, 2, |row, col| row == 0 || col == 0).unwrap();
        assert_eq!(matching, vec![1, 0]);

        assert!(perfect_matching(2, 2, |_, col| col == 0).is_none());
        assert_eq!(perfect_matching(0, 0, |_, _| false), Some(vec![]));
    }
}
