//! Light sequences: ordered board writes and holds, built first and played later.
//!
//! Displays and patterns only *describe* what the board should do; [`play`]
//! is the single place where a sequence touches hardware and sleeps. Tests
//! inspect a [`Sequence`] directly instead of watching LEDs.

use std::time::Duration;

use crate::board::{self, BoardOp, GlowBoard};

use super::Color;

/// One element of a light sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Issue a board write.
    Write(BoardOp),
    /// Keep the current state for a while.
    Hold(Duration),
}

/// Ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, op: BoardOp) -> &mut Self {
        self.steps.push(Step::Write(op));
        self
    }

    pub fn all(&mut self, intensity: u8) -> &mut Self {
        self.write(BoardOp::All { intensity })
    }

    pub fn color(&mut self, color: Color, intensity: u8) -> &mut Self {
        self.write(BoardOp::Color { color, intensity })
    }

    pub fn arm(&mut self, arm: u8, intensity: u8) -> &mut Self {
        self.write(BoardOp::Arm { arm, intensity })
    }

    pub fn hold(&mut self, duration: Duration) -> &mut Self {
        self.steps.push(Step::Hold(duration));
        self
    }

    /// Append another sequence.
    pub fn extend(&mut self, other: Sequence) -> &mut Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Board writes only, holds stripped.
    pub fn ops(&self) -> Vec<BoardOp> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Write(op) => Some(*op),
                Step::Hold(_) => None,
            })
            .collect()
    }

    /// Total play time (sum of all holds).
    pub fn duration(&self) -> Duration {
        self.steps
            .iter()
            .map(|s| match s {
                Step::Hold(d) => *d,
                Step::Write(_) => Duration::ZERO,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Sleeps between steps.
pub trait Pacer {
    fn pause(&self, duration: Duration);
}

/// Real-time pacer backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Play a sequence on a board, stopping at the first failed write.
pub fn play(seq: &Sequence, board: &impl GlowBoard, pacer: &impl Pacer) -> board::Result<()> {
    for step in seq.steps() {
        match step {
            Step::Write(op) => op.apply(board)?,
            Step::Hold(d) => pacer.pause(*d),
        }
    }
    Ok(())
}

/// Recording pacer for tests.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;

    /// Records requested pauses instead of sleeping.
    #[derive(Default)]
    pub struct RecordingPacer {
        pub pauses: RefCell<Vec<Duration>>,
    }

    impl RecordingPacer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn total(&self) -> Duration {
            self.pauses.borrow().iter().sum()
        }
    }

    impl Pacer for RecordingPacer {
        fn pause(&self, duration: Duration) {
            self.pauses.borrow_mut().push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingPacer;
    use super::*;
    use crate::board::mock::RecordingBoard;

    fn sample() -> Sequence {
        let mut seq = Sequence::new();
        seq.color(Color::Red, 50)
            .hold(Duration::from_millis(200))
            .color(Color::Red, 0)
            .arm(1, 30);
        seq
    }

    #[test]
    fn ops_strip_holds() {
        assert_eq!(
            sample().ops(),
            vec![
                BoardOp::Color {
                    color: Color::Red,
                    intensity: 50
                },
                BoardOp::Color {
                    color: Color::Red,
                    intensity: 0
                },
                BoardOp::Arm {
                    arm: 1,
                    intensity: 30
                },
            ]
        );
    }

    #[test]
    fn duration_sums_holds() {
        let mut seq = sample();
        seq.hold(Duration::from_millis(300));
        assert_eq!(seq.duration(), Duration::from_millis(500));
    }

    #[test]
    fn play_writes_in_order_and_pauses() {
        let board = RecordingBoard::new();
        let pacer = RecordingPacer::new();
        play(&sample(), &board, &pacer).unwrap();
        assert_eq!(board.take_ops(), sample().ops());
        assert_eq!(*pacer.pauses.borrow(), vec![Duration::from_millis(200)]);
    }

    #[test]
    fn play_stops_at_first_failure() {
        let board = RecordingBoard::new();
        let pacer = RecordingPacer::new();
        let mut seq = Sequence::new();
        seq.arm(7, 10).hold(Duration::from_millis(100)).all(50);
        assert!(play(&seq, &board, &pacer).is_err());
        assert!(board.ops.borrow().is_empty());
        assert!(pacer.pauses.borrow().is_empty());
    }

    #[test]
    fn extend_appends() {
        let mut a = Sequence::new();
        a.all(10);
        let mut b = Sequence::new();
        b.all(0);
        a.extend(b);
        assert_eq!(a.steps().len(), 2);
        assert!(!a.is_empty());
        assert!(Sequence::new().is_empty());
    }
}
