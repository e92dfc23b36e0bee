//! A* search over the implicit 8-connected grid graph.

use crate::adjacency::neighbors;
use crate::error::SearchError;
use crate::grid::{Cell, ElevationGrid};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// Knobs for a single search.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions<'a> {
    /// Slope penalty `k` of the edge cost.
    pub slope_factor: f64,
    /// Checked once per frontier pop.
    pub cancel: Option<&'a AtomicBool>,
    /// Maximum number of expanded nodes before giving up.
    pub max_expansions: Option<usize>,
}

impl<'a> SearchOptions<'a> {
    pub fn new(slope_factor: f64) -> Self {
        Self {
            slope_factor,
            cancel: None,
            max_expansions: None,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_max_expansions(mut self, limit: usize) -> Self {
        self.max_expansions = Some(limit);
        self
    }
}

/// Successful search outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Grid-adjacent cells from start to goal inclusive.
    pub path: Vec<Cell>,
    /// Total penalised cost in metres.
    pub cost: f64,
    pub nodes_visited: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f_score: FloatOrd,
    seq: u64,
    g_score: f64,
    cell: Cell,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.seq == other.seq
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // seq is unique per push, so equal f pops in insertion order
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Straight-line distance in metres; never more than the cheapest path cost.
fn heuristic(grid: &ElevationGrid, from: Cell, goal: Cell) -> f64 {
    from.distance(goal) * grid.scale()
}

/// Find a minimum-cost path from `start` to `goal`.
///
/// Edge costs come from [`neighbors`] with the configured slope factor.
/// The returned path is cost-optimal, not merely geometrically shortest.
pub fn find_path(
    grid: &ElevationGrid,
    start: Cell,
    goal: Cell,
    options: &SearchOptions<'_>,
) -> Result<SearchResult, SearchError> {
    if !grid.is_valid_cell(start) {
        return Err(SearchError::InvalidStart(start));
    }
    if !grid.is_valid_cell(goal) {
        return Err(SearchError::InvalidGoal(goal));
    }

    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    let mut g_score: HashMap<Cell, f64> = HashMap::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut closed_set: HashSet<Cell> = HashSet::new();
    let mut seq = 0u64;

    g_score.insert(start, 0.0);
    open_set.push(Reverse(OpenNode {
        f_score: FloatOrd(heuristic(grid, start, goal)),
        seq,
        g_score: 0.0,
        cell: start,
    }));

    let mut nodes_visited = 0usize;

    while let Some(Reverse(current)) = open_set.pop() {
        if options
            .cancel
            .is_some_and(|flag| flag.load(AtomicOrdering::Relaxed))
        {
            tracing::debug!(nodes_visited, "A* search cancelled");
            return Err(SearchError::Cancelled { nodes_visited });
        }

        if closed_set.contains(&current.cell) {
            continue;
        }
        let best_g = g_score.get(&current.cell).copied().unwrap_or(f64::INFINITY);
        if current.g_score > best_g + 1e-9 {
            continue;
        }

        if current.cell == goal {
            let path = reconstruct_path(&came_from, goal);
            tracing::debug!(
                nodes_visited,
                path_len = path.len(),
                cost = best_g,
                "A* search reached goal"
            );
            return Ok(SearchResult {
                path,
                cost: best_g,
                nodes_visited,
            });
        }

        if let Some(limit) = options.max_expansions {
            if nodes_visited >= limit {
                tracing::debug!(limit, "A* search hit expansion limit");
                return Err(SearchError::ExpansionLimit { limit });
            }
        }
        nodes_visited += 1;
        closed_set.insert(current.cell);

        for edge in neighbors(grid, current.cell, options.slope_factor) {
            if closed_set.contains(&edge.to) {
                continue;
            }
            let tentative_g = best_g + edge.cost;
            if tentative_g < g_score.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                came_from.insert(edge.to, current.cell);
                g_score.insert(edge.to, tentative_g);
                seq += 1;
                open_set.push(Reverse(OpenNode {
                    f_score: FloatOrd(tentative_g + heuristic(grid, edge.to, goal)),
                    seq,
                    g_score: tentative_g,
                    cell: edge.to,
                }));
            }
        }
    }

    tracing::debug!(nodes_visited, "A* frontier exhausted");
    Err(SearchError::NoPath { nodes_visited })
}

fn reconstruct_path(came_from: &HashMap<Cell, Cell>, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
