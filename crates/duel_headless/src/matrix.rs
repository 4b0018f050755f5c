//! Pairwise win-rate matrix.

use serde::{Deserialize, Serialize};

/// Square matrix of win rates indexed by roster position.
///
/// `get(i, j)` is the share of battles `i` won against `j`. Only one
/// direction of each pair is ever measured; the mirror cell is stored as
/// `1 - m[i][j]`, so `m[i][j] + m[j][i] == 1` holds exactly. The diagonal
/// and pairs that were never evaluated are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRateMatrix {
    ids: Vec<String>,
    cells: Vec<Option<f64>>,
}

impl WinRateMatrix {
    /// Empty matrix over `ids`.
    #[must_use]
    pub fn new(ids: Vec<String>) -> Self {
        let n = ids.len();
        Self {
            ids,
            cells: vec![None; n * n],
        }
    }

    /// Side length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the matrix covers no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Character ids in row order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Row index of `id`.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }

    /// Store the measured rate of `i` against `j` and its mirror.
    ///
    /// Ignored for `i == j` or out-of-range indices.
    pub fn set_pair(&mut self, i: usize, j: usize, rate_i: f64) {
        let n = self.len();
        if i == j || i >= n || j >= n {
            return;
        }
        self.cells[i * n + j] = Some(rate_i);
        self.cells[j * n + i] = Some(1.0 - rate_i);
    }

    /// Win rate of `i` against `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.len();
        if i >= n || j >= n {
            return None;
        }
        self.cells[i * n + j]
    }

    /// Win rate of `a` against `b` by id.
    #[must_use]
    pub fn get_by_id(&self, a: &str, b: &str) -> Option<f64> {
        self.get(self.index_of(a)?, self.index_of(b)?)
    }

    /// Mean win rate of `i` over the evaluated opponents accepted by `filter`.
    ///
    /// `None` when no such opponent exists.
    pub fn row_mean<F>(&self, i: usize, filter: F) -> Option<f64>
    where
        F: Fn(usize) -> bool,
    {
        let (sum, count) = (0..self.len())
            .filter(|&j| j != i && filter(j))
            .filter_map(|j| self.get(i, j))
            .fold((0.0, 0_usize), |(s, c), r| (s + r, c + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Number of evaluated cells in row `i`.
    #[must_use]
    pub fn opponents(&self, i: usize) -> usize {
        (0..self.len()).filter(|&j| self.get(i, j).is_some()).count()
    }

    /// Render as a markdown table with percentages.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("| |");
        for id in &self.ids {
            md.push_str(&format!(" {id} |"));
        }
        md.push_str("\n|---|");
        md.push_str(&"---|".repeat(self.len()));
        md.push('\n');
        for (i, id) in self.ids.iter().enumerate() {
            md.push_str(&format!("| **{id}** |"));
            for j in 0..self.len() {
                match self.get(i, j) {
                    Some(rate) => md.push_str(&format!(" {:.1} |", rate * 100.0)),
                    None => md.push_str(" - |"),
                }
            }
            md.push('\n');
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}")).collect()
    }

    #[test]
    fn test_mirror_sums_to_one() {
        let mut m = WinRateMatrix::new(ids(3));
        m.set_pair(0, 1, 0.7);
        m.set_pair(2, 0, 0.123);
        assert_eq!(m.get(0, 1).unwrap() + m.get(1, 0).unwrap(), 1.0);
        assert_eq!(m.get(2, 0).unwrap() + m.get(0, 2).unwrap(), 1.0);
    }

    #[test]
    fn test_diagonal_and_unset_are_none() {
        let mut m = WinRateMatrix::new(ids(3));
        m.set_pair(1, 1, 0.9);
        assert_eq!(m.get(1, 1), None);
        assert_eq!(m.get(0, 2), None);
        assert_eq!(m.get(5, 0), None);
    }

    #[test]
    fn test_row_mean_filters() {
        let mut m = WinRateMatrix::new(ids(3));
        m.set_pair(0, 1, 0.8);
        m.set_pair(0, 2, 0.4);
        assert!((m.row_mean(0, |_| true).unwrap() - 0.6).abs() < 1e-12);
        assert!((m.row_mean(0, |j| j == 2).unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(m.row_mean(0, |_| false), None);
        assert_eq!(m.opponents(1), 1);
    }

    #[test]
    fn test_single_character_has_no_opponents() {
        let m = WinRateMatrix::new(ids(1));
        assert_eq!(m.row_mean(0, |_| true), None);
    }

    #[test]
    fn test_get_by_id() {
        let mut m = WinRateMatrix::new(ids(2));
        m.set_pair(0, 1, 0.25);
        assert_eq!(m.get_by_id("c1", "c0"), Some(0.75));
        assert_eq!(m.get_by_id("c1", "zz"), None);
    }

    #[test]
    fn test_markdown_marks_missing_cells() {
        let mut m = WinRateMatrix::new(ids(2));
        m.set_pair(0, 1, 0.5);
        let md = m.to_markdown();
        assert!(md.contains("| **c0** | - | 50.0 |"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_cells_stay_complementary(
                n in 2_usize..8,
                writes in prop::collection::vec((0_usize..8, 0_usize..8, 0.0_f64..=1.0), 0..40),
            ) {
                let mut m = WinRateMatrix::new(ids(n));
                for (i, j, rate) in writes {
                    m.set_pair(i, j, rate);
                }
                for i in 0..n {
                    prop_assert_eq!(m.get(i, i), None);
                    for j in 0..n {
                        if let (Some(x), Some(y)) = (m.get(i, j), m.get(j, i)) {
                            prop_assert!((x + y - 1.0).abs() < 1e-12);
                        } else {
                            prop_assert_eq!(m.get(i, j), m.get(j, i));
                        }
                    }
                }
            }

            #[test]
            fn test_full_matrix_means_average_half(
                rates in prop::collection::vec(0.0_f64..=1.0, 15),
            ) {
                let n = 6;
                let mut m = WinRateMatrix::new(ids(n));
                let mut k = 0;
                for i in 0..n {
                    for j in (i + 1)..n {
                        m.set_pair(i, j, rates[k]);
                        k += 1;
                    }
                }
                let mean = (0..n)
                    .map(|i| m.row_mean(i, |_| true).unwrap_or_default())
                    .sum::<f64>()
                    / n as f64;
                prop_assert!((mean - 0.5).abs() < 1e-9);
            }
        }
    }
}
