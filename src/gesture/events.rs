use std::time::Instant;

pub type PointerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform took the touch sequence away
    Cancel,
}

/// One pointer changing state. Multi-pointer moves arrive as one event per pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub phase: PointerPhase,
    pub position: Point,
    pub time: Instant,
}

impl PointerEvent {
    pub fn new(id: PointerId, phase: PointerPhase, x: f32, y: f32, time: Instant) -> Self {
        Self {
            id,
            phase,
            position: Point::new(x, y),
            time,
        }
    }

    pub fn down(id: PointerId, x: f32, y: f32, time: Instant) -> Self {
        Self::new(id, PointerPhase::Down, x, y, time)
    }

    pub fn moved(id: PointerId, x: f32, y: f32, time: Instant) -> Self {
        Self::new(id, PointerPhase::Move, x, y, time)
    }

    pub fn up(id: PointerId, x: f32, y: f32, time: Instant) -> Self {
        Self::new(id, PointerPhase::Up, x, y, time)
    }

    pub fn cancel(id: PointerId, time: Instant) -> Self {
        Self::new(id, PointerPhase::Cancel, 0.0, 0.0, time)
    }
}
