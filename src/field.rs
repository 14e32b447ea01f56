use crate::actor::ActorId;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// A position on the field, identified by row and column.
///
/// Locations are plain values: they are compared, hashed, and used as
/// snapshot keys, but never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// The occupancy class an actor claims in its cell.
///
/// Animals occupy their cell exclusively; plants share theirs with at
/// most one exclusive occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Exclusive,
    Shared,
}

/// Rectangular grid tracking which actor occupies each cell.
///
/// Each cell holds at most one exclusive occupant and at most one shared
/// occupant. The field records actor ids only; it owns no actors, and an
/// actor's stored location is kept in sync by the simulation.
pub struct Field {
    depth: usize,
    width: usize,
    exclusive: Vec<Option<ActorId>>,
    shared: Vec<Option<ActorId>>,
}

impl Field {
    /// Create an empty field with the given dimensions.
    pub fn new(depth: usize, width: usize) -> Self {
        Self {
            depth,
            width,
            exclusive: vec![None; depth * width],
            shared: vec![None; depth * width],
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn index(&self, loc: Location) -> usize {
        loc.row * self.width + loc.col
    }

    /// Empty every cell.
    pub fn clear_all(&mut self) {
        self.exclusive.fill(None);
        self.shared.fill(None);
    }

    /// Record `id` at `loc`, replacing any existing occupant of the same class.
    pub fn place(&mut self, id: ActorId, occupancy: Occupancy, loc: Location) {
        let idx = self.index(loc);
        match occupancy {
            Occupancy::Exclusive => self.exclusive[idx] = Some(id),
            Occupancy::Shared => self.shared[idx] = Some(id),
        }
    }

    /// Remove whichever actors are recorded at `loc`, in both layers.
    pub fn clear(&mut self, loc: Location) {
        let idx = self.index(loc);
        self.exclusive[idx] = None;
        self.shared[idx] = None;
    }

    /// Remove the occupant of a single layer at `loc`.
    pub fn vacate(&mut self, loc: Location, occupancy: Occupancy) {
        let idx = self.index(loc);
        match occupancy {
            Occupancy::Exclusive => self.exclusive[idx] = None,
            Occupancy::Shared => self.shared[idx] = None,
        }
    }

    /// The actor visible at `loc`: the exclusive occupant if present,
    /// otherwise the shared one.
    pub fn occupant_at(&self, loc: Location) -> Option<ActorId> {
        let idx = self.index(loc);
        self.exclusive[idx].or(self.shared[idx])
    }

    pub fn exclusive_at(&self, loc: Location) -> Option<ActorId> {
        self.exclusive[self.index(loc)]
    }

    pub fn shared_at(&self, loc: Location) -> Option<ActorId> {
        self.shared[self.index(loc)]
    }

    /// All locations of the field in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.depth).flat_map(move |row| (0..self.width).map(move |col| Location::new(row, col)))
    }

    /// The up to 8 in-bounds neighbours of `loc`, in a freshly randomized
    /// order to avoid directional bias in search, movement, and breeding.
    pub fn adjacent_locations<R: Rng>(&self, loc: Location, rng: &mut R) -> Vec<Location> {
        let mut adjacent = Vec::with_capacity(8);
        for row_offset in -1isize..=1 {
            for col_offset in -1isize..=1 {
                if row_offset == 0 && col_offset == 0 {
                    continue;
                }
                let row = loc.row as isize + row_offset;
                let col = loc.col as isize + col_offset;
                if row >= 0 && row < self.depth as isize && col >= 0 && col < self.width as isize {
                    adjacent.push(Location::new(row as usize, col as usize));
                }
            }
        }
        adjacent.shuffle(rng);
        adjacent
    }

    /// Neighbouring locations with no exclusive occupant, randomized.
    pub fn free_adjacent_locations<R: Rng>(&self, loc: Location, rng: &mut R) -> Vec<Location> {
        self.adjacent_locations(loc, rng)
            .into_iter()
            .filter(|&l| self.exclusive_at(l).is_none())
            .collect()
    }

    /// The first free neighbouring location, if any.
    pub fn free_adjacent_location<R: Rng>(&self, loc: Location, rng: &mut R) -> Option<Location> {
        self.free_adjacent_locations(loc, rng).into_iter().next()
    }
}
