//! Sibling alignment: an LCS-style dynamic program over two sibling lists.
//!
//! Index-by-index comparison breaks as soon as a provision is inserted or
//! removed, because later siblings are renumbered. The alignment instead
//! pairs siblings by content, maximizing the summed similarity of matched
//! pairs. Only pairs at or above the threshold may match. Ties go to the
//! alignment with the smallest total position distance, which keeps the
//! result near the diagonal.

/// Scores within this distance are considered equal.
const SCORE_EPSILON: f64 = 1e-9;

/// One step of an alignment, in document order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignStep {
    Matched { from: usize, to: usize, similarity: f64 },
    Removed(usize),
    Added(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Diagonal,
    Up,
    Left,
}

#[derive(Debug, Clone, Copy)]
struct Score {
    similarity: f64,
    distance: usize,
}

impl Score {
    const ZERO: Score = Score {
        similarity: 0.0,
        distance: 0,
    };

    fn better_than(self, other: Score) -> bool {
        if self.similarity > other.similarity + SCORE_EPSILON {
            return true;
        }
        if self.similarity + SCORE_EPSILON < other.similarity {
            return false;
        }
        self.distance < other.distance
    }
}

/// Align `n` "from" siblings with `m` "to" siblings.
///
/// `similarity(i, j)` scores from-sibling `i` against to-sibling `j`.
///
/// # Examples
/// ```
/// use lexhistory_core::diff::{align, AlignStep};
///
/// let from = ["X", "Possession", "Y"];
/// let to = ["X", "Manufacture", "Possession", "Y"];
/// let steps = align(3, 4, 0.6, |i, j| if from[i] == to[j] { 1.0 } else { 0.0 });
///
/// assert_eq!(steps[1], AlignStep::Added(1));
/// assert_eq!(steps[2], AlignStep::Matched { from: 1, to: 2, similarity: 1.0 });
/// ```
pub fn align<F>(n: usize, m: usize, threshold: f64, mut similarity: F) -> Vec<AlignStep>
where
    F: FnMut(usize, usize) -> f64,
{
    let sims: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..m).map(|j| similarity(i, j)).collect())
        .collect();

    // score[i][j]: best alignment of the first i "from" and first j "to" siblings.
    let mut score = vec![vec![Score::ZERO; m + 1]; n + 1];
    let mut moves = vec![vec![Move::Diagonal; m + 1]; n + 1];

    for i in 0..=n {
        for j in 0..=m {
            if i == 0 && j == 0 {
                continue;
            }

            let mut best: Option<(Score, Move)> = None;

            if i > 0 && j > 0 && sims[i - 1][j - 1] >= threshold {
                let prev = score[i - 1][j - 1];
                let candidate = Score {
                    similarity: prev.similarity + sims[i - 1][j - 1],
                    distance: prev.distance + (i - 1).abs_diff(j - 1),
                };
                best = Some((candidate, Move::Diagonal));
            }
            if i > 0 {
                let candidate = score[i - 1][j];
                if best.is_none_or(|(b, _)| candidate.better_than(b)) {
                    best = Some((candidate, Move::Up));
                }
            }
            if j > 0 {
                let candidate = score[i][j - 1];
                if best.is_none_or(|(b, _)| candidate.better_than(b)) {
                    best = Some((candidate, Move::Left));
                }
            }

            if let Some((s, mv)) = best {
                score[i][j] = s;
                moves[i][j] = mv;
            }
        }
    }

    let mut steps = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        let mv = if i == 0 {
            Move::Left
        } else if j == 0 {
            Move::Up
        } else {
            moves[i][j]
        };
        match mv {
            Move::Diagonal => {
                steps.push(AlignStep::Matched {
                    from: i - 1,
                    to: j - 1,
                    similarity: sims[i - 1][j - 1],
                });
                i -= 1;
                j -= 1;
            }
            Move::Up => {
                steps.push(AlignStep::Removed(i - 1));
                i -= 1;
            }
            Move::Left => {
                steps.push(AlignStep::Added(j - 1));
                j -= 1;
            }
        }
    }
    steps.reverse();
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(from: &[&str], to: &[&str]) -> Vec<AlignStep> {
        align(from.len(), to.len(), 0.6, |i, j| {
            if from[i] == to[j] {
                1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn test_insertion_shifts_are_matched_by_content() {
        let steps = exact(&["x", "p", "y"], &["x", "m", "p", "y"]);
        assert_eq!(
            steps,
            vec![
                AlignStep::Matched { from: 0, to: 0, similarity: 1.0 },
                AlignStep::Added(1),
                AlignStep::Matched { from: 1, to: 2, similarity: 1.0 },
                AlignStep::Matched { from: 2, to: 3, similarity: 1.0 },
            ]
        );
    }

    #[test]
    fn test_removal() {
        let steps = exact(&["x", "p", "y"], &["x", "y"]);
        assert_eq!(steps[1], AlignStep::Removed(1));
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_empty_sides() {
        assert!(exact(&[], &[]).is_empty());
        assert_eq!(exact(&[], &["a"]), vec![AlignStep::Added(0)]);
        assert_eq!(exact(&["a"], &[]), vec![AlignStep::Removed(0)]);
    }

    #[test]
    fn test_below_threshold_never_matches() {
        let steps = align(1, 1, 0.6, |_, _| 0.59);
        assert_eq!(steps, vec![AlignStep::Removed(0), AlignStep::Added(0)]);
    }

    #[test]
    fn test_ties_prefer_the_diagonal() {
        // Three identical siblings on both sides: every pairing scores the
        // same, only position distance separates them.
        let steps = exact(&["a", "a", "a"], &["a", "a", "a"]);
        let matched: Vec<_> = steps
            .iter()
            .map(|s| match s {
                AlignStep::Matched { from, to, .. } => (*from, *to),
                _ => (usize::MAX, usize::MAX),
            })
            .collect();
        assert_eq!(matched, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_best_similarity_wins_over_position() {
        let sims = [[0.7, 0.95]];
        let steps = align(1, 2, 0.6, |i, j| sims[i][j]);
        assert_eq!(
            steps,
            vec![
                AlignStep::Added(0),
                AlignStep::Matched { from: 0, to: 1, similarity: 0.95 },
            ]
        );
    }
}
