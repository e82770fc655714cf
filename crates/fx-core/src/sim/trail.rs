use glam::Vec3;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub position: Vec3,
    /// Milliseconds since the point was inserted.
    pub age: f32,
}

/// Fixed-capacity, age-ordered point sequence.
///
/// Points age together and are dropped once older than `max_age`. Inserting
/// into a full trail evicts the oldest point (largest age), so the trail never
/// holds more than `capacity` points.
#[derive(Clone, Debug, PartialEq)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    capacity: usize,
    max_age: f32,
}

impl Trail {
    pub fn new(capacity: usize, max_age: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            max_age,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn max_age(&self) -> f32 {
        self.max_age
    }

    pub fn set_max_age(&mut self, max_age: f32) {
        self.max_age = max_age;
        self.expire();
    }

    /// Insert a new point, returning the evicted one when the trail was full.
    pub fn push(&mut self, position: Vec3) -> Option<TrailPoint> {
        let evicted = if self.points.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };
        self.points.push_back(TrailPoint { position, age: 0.0 });
        evicted
    }

    /// Age every point by `dt_ms` and drop the expired ones.
    pub fn age_by(&mut self, dt_ms: f32) {
        if dt_ms > 0.0 {
            for p in self.points.iter_mut() {
                p.age += dt_ms;
            }
        }
        self.expire();
    }

    /// Newest first.
    pub fn iter_newest(&self) -> impl Iterator<Item = &TrailPoint> + '_ {
        self.points.iter().rev()
    }

    pub fn newest(&self) -> Option<&TrailPoint> {
        self.points.back()
    }

    pub fn oldest(&self) -> Option<&TrailPoint> {
        self.oldest_index().and_then(|i| self.points.get(i))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    fn expire(&mut self) {
        let max_age = self.max_age;
        self.points.retain(|p| p.age <= max_age);
    }

    fn evict_oldest(&mut self) -> Option<TrailPoint> {
        let idx = self.oldest_index()?;
        self.points.remove(idx)
    }

    // Largest age wins; ties go to the earlier insertion.
    fn oldest_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, p) in self.points.iter().enumerate() {
            match best {
                Some((_, age)) if p.age <= age => {}
                _ => best = Some((i, p.age)),
            }
        }
        best.map(|(i, _)| i)
    }
}
