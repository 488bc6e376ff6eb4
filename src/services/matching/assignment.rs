//! Globally optimal one-to-one assignment over a score matrix
//! (Kuhn–Munkres / Hungarian algorithm).
//!
//! Greedy top-score-first matching double-claims a column whenever two rows
//! share a best match; the Hungarian algorithm maximizes total score over all
//! valid assignments instead.

use crate::types::{RollbookError, RollbookResult};

/// Solve the assignment problem for a rectangular score matrix
/// (rows = candidates, columns = roster entries, cells in `[0, 1]`).
///
/// Returns one entry per row: the assigned column, or `None` when the row is
/// left unassigned (more rows than columns). Assigned columns are unique.
///
/// Ragged or non-finite input is a caller bug and fails fast with a
/// validation error. Ties are broken by fixed traversal order; a tied input
/// has more than one optimal solution and any of them is acceptable.
pub fn solve(scores: &[Vec<f64>]) -> RollbookResult<Vec<Option<usize>>> {
    let n_rows = scores.len();
    if n_rows == 0 {
        return Ok(Vec::new());
    }
    let n_cols = scores[0].len();
    for (row_idx, row) in scores.iter().enumerate() {
        if row.len() != n_cols {
            return Err(RollbookError::Validation(format!(
                "ragged score matrix: row {row_idx} has {} cells, expected {n_cols}",
                row.len()
            )));
        }
        for (col_idx, &cell) in row.iter().enumerate() {
            if !cell.is_finite() || !(0.0..=1.0).contains(&cell) {
                return Err(RollbookError::Validation(format!(
                    "score matrix cell [{row_idx}][{col_idx}] out of range: {cell}"
                )));
            }
        }
    }
    if n_cols == 0 {
        return Ok(vec![None; n_rows]);
    }

    // Maximize score == minimize (max_score - score). Padding cells carry a
    // cost no real cell can reach, so dummy rows/columns soak up the excess.
    let size = n_rows.max(n_cols);
    let max_score = scores
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, &cell| acc.max(cell));
    let dummy_cost = (size as f64 + 1.0) * (max_score + 1.0);
    let cost = |row: usize, col: usize| -> f64 {
        if row < n_rows && col < n_cols {
            max_score - scores[row][col]
        } else {
            dummy_cost
        }
    };

    // Primal-dual shortest augmenting path formulation, 1-indexed with a
    // virtual zero row/column. O(size³).
    let mut u = vec![0.0_f64; size + 1];
    let mut v = vec![0.0_f64; size + 1];
    let mut matched_row = vec![0_usize; size + 1]; // column -> row
    let mut way = vec![0_usize; size + 1];

    for row in 1..=size {
        matched_row[0] = row;
        let mut j0 = 0_usize;
        let mut min_slack = vec![f64::INFINITY; size + 1];
        let mut visited = vec![false; size + 1];

        loop {
            visited[j0] = true;
            let i0 = matched_row[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0_usize;

            for j in 1..=size {
                if visited[j] {
                    continue;
                }
                let slack = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }

            for j in 0..=size {
                if visited[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }

            j0 = j1;
            if matched_row[j0] == 0 {
                break;
            }
        }

        // Walk the augmenting path backwards, flipping matches.
        loop {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    // Strip padding: dummy rows vanish, dummy columns read as unassigned.
    let mut assignment = vec![None; n_rows];
    for col in 1..=size {
        let row = matched_row[col];
        if (1..=n_rows).contains(&row) && col <= n_cols {
            assignment[row - 1] = Some(col - 1);
        }
    }
    Ok(assignment)
}

#[cfg(test)]
#[path = "tests/assignment_tests.rs"]
mod tests;
