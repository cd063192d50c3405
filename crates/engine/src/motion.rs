use crate::math::Vec2;

const MIN_SEGMENT_LENGTH: f32 = f32::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub const fn sign(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// What a single [`PathFollower::advance`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// No usable path; nothing changed.
    Idle,
    Moved,
    /// Crossed into the next interior segment.
    SegmentCompleted,
    /// Reached an endpoint, snapped to it and reversed.
    TurnedAround,
    /// The current segment has zero length; nothing changed.
    DegenerateSegment,
}

/// Ping-pong traversal of a polyline at constant speed.
///
/// Progress along a segment is normalized by the segment length, so an entity moves the same
/// world distance per second on short and long segments alike. Direction only changes at the
/// two ends of the path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFollower {
    position: Vec2,
    path: Vec<Vec2>,
    current_segment: usize,
    direction: Direction,
    segment_progress: f32,
    speed: f32,
}

impl PathFollower {
    /// `velocity` only contributes its magnitude.
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            path: Vec::new(),
            current_segment: 0,
            direction: Direction::Forward,
            segment_progress: 0.0,
            speed: velocity.length(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    pub fn current_segment(&self) -> usize {
        self.current_segment
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn segment_progress(&self) -> f32 {
        self.segment_progress
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn has_path(&self) -> bool {
        self.path.len() >= 2
    }

    /// Replaces the path and restarts from its first point. Paths with fewer than two points
    /// are ignored and leave the current state untouched.
    pub fn set_path(&mut self, path: &[Vec2]) {
        if path.len() < 2 {
            return;
        }

        self.path = path.to_vec();
        self.current_segment = 0;
        self.segment_progress = 0.0;
        self.direction = Direction::Forward;
        self.position = self.path[0];
    }

    pub fn advance(&mut self, dt_seconds: f32) -> AdvanceOutcome {
        if !self.has_path() {
            return AdvanceOutcome::Idle;
        }
        let Some(next_index) = self.segment_end_index() else {
            return AdvanceOutcome::Idle;
        };

        let start = self.path[self.current_segment];
        let end = self.path[next_index];
        let segment_length = start.distance(end);
        if segment_length <= MIN_SEGMENT_LENGTH {
            return AdvanceOutcome::DegenerateSegment;
        }

        self.segment_progress += self.speed * dt_seconds / segment_length;

        let mut outcome = AdvanceOutcome::Moved;
        if self.segment_progress >= 1.0 {
            self.segment_progress -= 1.0;
            self.current_segment = next_index;

            let last = self.path.len() - 1;
            if self.current_segment == 0 || self.current_segment == last {
                self.position = self.path[self.current_segment];
                self.direction = self.direction.flipped();
                return AdvanceOutcome::TurnedAround;
            }
            outcome = AdvanceOutcome::SegmentCompleted;
        }

        let Some(next_index) = self.segment_end_index() else {
            return AdvanceOutcome::Idle;
        };
        self.position =
            self.path[self.current_segment].lerp(self.path[next_index], self.segment_progress);
        outcome
    }

    /// Unit vector along the segment currently being travelled.
    pub fn heading(&self) -> Option<Vec2> {
        let next_index = self.segment_end_index()?;
        let delta = self.path[next_index] - self.path[self.current_segment];
        let length = delta.length();
        (length > MIN_SEGMENT_LENGTH).then(|| delta * length.recip())
    }

    fn segment_end_index(&self) -> Option<usize> {
        let next = self
            .current_segment
            .checked_add_signed(self.direction.sign())?;
        (next < self.path.len()).then_some(next)
    }
}
