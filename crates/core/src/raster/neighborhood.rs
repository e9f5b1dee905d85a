//! Pixel adjacency for mask operations

use serde::{Deserialize, Serialize};

/// Which neighbors count as adjacent to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Edge-sharing neighbors only (N, E, S, W)
    Four,
    /// Edge- and corner-sharing neighbors
    #[default]
    Eight,
}

const FOUR: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const EIGHT: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

impl Connectivity {
    /// Relative `(row, col)` offsets of the neighbors, center excluded.
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }

    /// In-bounds neighbors of `(row, col)` in a `rows` x `cols` grid.
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        self.offsets().iter().filter_map(move |&(dr, dc)| {
            let r = row as isize + dr;
            let c = col as isize + dc;
            if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                None
            } else {
                Some((r as usize, c as usize))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(Connectivity::Four.offsets().len(), 4);
        assert_eq!(Connectivity::Eight.offsets().len(), 8);
        assert!(!Connectivity::Four.offsets().contains(&(1, 1)));
    }

    #[test]
    fn test_neighbors_clip_at_edges() {
        let corner: Vec<_> = Connectivity::Eight.neighbors(0, 0, 5, 5).collect();
        assert_eq!(corner.len(), 3);

        let center: Vec<_> = Connectivity::Four.neighbors(2, 2, 5, 5).collect();
        assert_eq!(center, vec![(1, 2), (2, 1), (2, 3), (3, 2)]);
    }
}
