//! Rolling history of the paths a unit flew.

use std::collections::VecDeque;

use aerial_tactics_core::Path;

/// Number of segments seeded before the first turn.
const SEEDED_SEGMENTS: usize = 3;

/// Flown paths with the bank angle at every segment boundary.
///
/// `tilts` always holds one more entry than `paths`.
#[derive(Clone, Debug, Default)]
pub(crate) struct TrailHistory {
    paths: VecDeque<Path>,
    tilts: VecDeque<f32>,
}

impl TrailHistory {
    /// History that pretends the unit flew `path` for the last few turns.
    pub(crate) fn seeded(path: Path, tilt: f32) -> Self {
        Self {
            paths: std::iter::repeat(path).take(SEEDED_SEGMENTS).collect(),
            tilts: std::iter::repeat(tilt).take(SEEDED_SEGMENTS + 1).collect(),
        }
    }

    /// Appends the newest segment ending at `tilt`.
    pub(crate) fn push(&mut self, path: Path, tilt: f32) {
        self.paths.push_back(path);
        self.tilts.push_back(tilt);
    }

    /// Forgets the oldest segment.
    pub(crate) fn drop_oldest(&mut self) {
        if self.paths.len() > 1 {
            let _ = self.paths.pop_front();
            let _ = self.tilts.pop_front();
        }
    }

    /// Forgets the newest segment.
    pub(crate) fn drop_newest(&mut self) {
        if self.paths.len() > 1 {
            let _ = self.paths.pop_back();
            let _ = self.tilts.pop_back();
        }
    }

    /// Number of segments held.
    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }

    /// Up to `count` segments starting at `skip`, with their boundary tilts.
    pub(crate) fn window(&self, skip: usize, count: usize) -> (Vec<Path>, Vec<f32>) {
        let paths: Vec<Path> = self.paths.iter().skip(skip).take(count).copied().collect();
        let tilts = self
            .tilts
            .iter()
            .skip(skip)
            .take(paths.len() + 1)
            .copied()
            .collect();
        (paths, tilts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerial_tactics_core::TurnPath;

    #[test]
    fn commit_then_attack_keeps_three_segments() {
        let mut trail = TrailHistory::seeded(Path::Blank, 0.0);
        trail.push(Path::Turn(TurnPath::new(10.0, 5.0, 0.0)), 12.0);
        assert_eq!(trail.len(), 4);
        trail.drop_oldest();
        assert_eq!(trail.len(), 3);

        let (paths, tilts) = trail.window(0, 3);
        assert_eq!(paths.last(), Some(&Path::Turn(TurnPath::new(10.0, 5.0, 0.0))));
        assert_eq!(tilts, vec![0.0, 0.0, 0.0, 12.0]);
    }

    #[test]
    fn undo_restores_previous_newest() {
        let mut trail = TrailHistory::seeded(Path::Blank, 3.0);
        trail.push(Path::Turn(TurnPath::new(10.0, 0.0, 0.0)), 9.0);
        trail.drop_newest();
        let (paths, tilts) = trail.window(0, 10);
        assert_eq!(paths, vec![Path::Blank; 3]);
        assert_eq!(tilts, vec![3.0; 4]);
    }

    #[test]
    fn never_empties() {
        let mut trail = TrailHistory::seeded(Path::Blank, 0.0);
        for _ in 0..5 {
            trail.drop_oldest();
        }
        assert_eq!(trail.len(), 1);
    }
}
