//! Run score and process-lifetime high score.

/// Running score plus the best score banked so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    score: u64,
    high_score: u64,
}

impl Scoreboard {
    /// Creates a zeroed scoreboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds kill points and returns the new total.
    pub fn add(&mut self, points: u32) -> u64 {
        self.score = self.score.saturating_add(u64::from(points));
        self.score
    }

    /// Current run score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Best banked score.
    #[must_use]
    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    /// Ends a run: keeps the score if it beats the high score, then zeroes
    /// it. Returns true on a new high score.
    pub fn bank(&mut self) -> bool {
        let record = self.score > self.high_score;
        if record {
            self.high_score = self.score;
        }
        self.score = 0;
        record
    }
}
