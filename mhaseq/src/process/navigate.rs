use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::trace;
use rand::Rng;

use crate::utils::errors::NavigateError;

/// Direction of automatic playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    #[default]
    Forward,
    Backward,
    Random,
}

impl Display for PlayMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PlayMode::Forward => "forward",
            PlayMode::Backward => "backward",
            PlayMode::Random => "random",
        })
    }
}

impl FromStr for PlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(PlayMode::Forward),
            "backward" => Ok(PlayMode::Backward),
            "random" => Ok(PlayMode::Random),
            _ => Err(format!("unknown play mode {s:?}")),
        }
    }
}

/// Current frame of a sequence and the rules for moving it.
///
/// The index always stays in `[0, frame_count)`: stepping past either end
/// wraps to the other. Every operation fails with
/// [`NavigateError::EmptySequence`] on a sequence without frames and leaves
/// the state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNavigator {
    current: usize,
    frame_count: usize,
    play_mode: PlayMode,
}

impl FrameNavigator {
    pub fn new(frame_count: usize) -> Self {
        Self {
            current: 0,
            frame_count,
            play_mode: PlayMode::default(),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    fn ensure_frames(&self) -> Result<usize, NavigateError> {
        match self.frame_count {
            0 => Err(NavigateError::EmptySequence),
            count => Ok(count),
        }
    }

    /// Jumps to `frame`; below zero goes to the last frame, past the end
    /// goes to the first.
    pub fn go_to(&mut self, frame: i64) -> Result<usize, NavigateError> {
        let count = self.ensure_frames()?;

        self.current = if frame < 0 {
            count - 1
        } else if frame as u64 >= count as u64 {
            0
        } else {
            frame as usize
        };

        trace!("go_to({frame}) -> {}", self.current);
        Ok(self.current)
    }

    pub fn advance(&mut self, step: i64) -> Result<usize, NavigateError> {
        self.go_to((self.current as i64).saturating_add(step))
    }

    pub fn next(&mut self) -> Result<usize, NavigateError> {
        self.advance(1)
    }

    pub fn previous(&mut self) -> Result<usize, NavigateError> {
        self.advance(-1)
    }

    pub fn next_valid(&mut self, validity: &[bool]) -> Result<usize, NavigateError> {
        self.seek_status(validity, true, true)
    }

    pub fn previous_valid(&mut self, validity: &[bool]) -> Result<usize, NavigateError> {
        self.seek_status(validity, true, false)
    }

    pub fn next_invalid(&mut self, validity: &[bool]) -> Result<usize, NavigateError> {
        self.seek_status(validity, false, true)
    }

    pub fn previous_invalid(&mut self, validity: &[bool]) -> Result<usize, NavigateError> {
        self.seek_status(validity, false, false)
    }

    /// Probes the frames after (or before) the current one, wrapping around,
    /// for the first whose recorded flag equals `wanted`. Exactly
    /// `frame_count` probes are made; without a match the last probed index
    /// (the current frame) is kept.
    fn seek_status(
        &mut self,
        validity: &[bool],
        wanted: bool,
        forward: bool,
    ) -> Result<usize, NavigateError> {
        let count = self.ensure_frames()?;

        let mut frame = self.current;
        for step in 1..=count {
            frame = if forward {
                (self.current + step) % count
            } else {
                (self.current + count - step) % count
            };

            if validity.get(frame) == Some(&wanted) {
                break;
            }
        }

        trace!(
            "{} {} from {} -> {frame}",
            if forward { "next" } else { "previous" },
            if wanted { "valid" } else { "invalid" },
            self.current
        );

        self.current = frame;
        Ok(frame)
    }

    pub fn random(&mut self) -> Result<usize, NavigateError> {
        self.random_with(&mut rand::rng())
    }

    pub fn random_with<R: Rng>(&mut self, rng: &mut R) -> Result<usize, NavigateError> {
        let count = self.ensure_frames()?;
        self.current = rng.random_range(0..count);
        Ok(self.current)
    }

    /// One playback step in the current [`PlayMode`].
    pub fn play_next(&mut self) -> Result<usize, NavigateError> {
        self.play_next_with(&mut rand::rng())
    }

    pub fn play_next_with<R: Rng>(&mut self, rng: &mut R) -> Result<usize, NavigateError> {
        match self.play_mode {
            PlayMode::Forward => self.next(),
            PlayMode::Backward => self.previous(),
            PlayMode::Random => self.random_with(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn go_to_wraps() {
        let mut nav = FrameNavigator::new(5);
        assert_eq!(nav.go_to(-1).unwrap(), 4);
        assert_eq!(nav.go_to(5).unwrap(), 0);
        assert_eq!(nav.go_to(3).unwrap(), 3);
        assert_eq!(nav.go_to(-100).unwrap(), 4);
        assert_eq!(nav.go_to(i64::MAX).unwrap(), 0);

        for frame in -20..20 {
            let current = nav.go_to(frame).unwrap();
            assert!(current < nav.frame_count());
        }
    }

    #[test]
    fn advance_wraps() {
        let mut nav = FrameNavigator::new(3);
        assert_eq!(nav.previous().unwrap(), 2);
        assert_eq!(nav.next().unwrap(), 0);
        assert_eq!(nav.next().unwrap(), 1);
        assert_eq!(nav.advance(5).unwrap(), 0);
    }

    #[test]
    fn next_valid_cycles_through_valid_frames() {
        let validity = [false, true, false, true];
        let mut nav = FrameNavigator::new(4);

        assert_eq!(nav.next_valid(&validity).unwrap(), 1);
        assert_eq!(nav.next_valid(&validity).unwrap(), 3);
        assert_eq!(nav.next_valid(&validity).unwrap(), 1);

        for _ in 0..nav.frame_count() {
            let frame = nav.next_valid(&validity).unwrap();
            assert!(validity[frame]);
        }
    }

    #[test]
    fn previous_and_invalid_variants() {
        let validity = [false, true, false, true];
        let mut nav = FrameNavigator::new(4);

        assert_eq!(nav.previous_valid(&validity).unwrap(), 3);
        assert_eq!(nav.previous_valid(&validity).unwrap(), 1);
        assert_eq!(nav.next_invalid(&validity).unwrap(), 2);
        assert_eq!(nav.next_invalid(&validity).unwrap(), 0);
        assert_eq!(nav.previous_invalid(&validity).unwrap(), 2);
    }

    #[test]
    fn missing_flags_never_match() {
        let validity = [true];
        let mut nav = FrameNavigator::new(3);

        nav.go_to(1).unwrap();
        assert_eq!(nav.next_valid(&validity).unwrap(), 0);
        assert_eq!(nav.next_invalid(&validity).unwrap(), 0);
    }

    #[test]
    fn no_match_keeps_last_probe() {
        let mut nav = FrameNavigator::new(4);
        nav.go_to(2).unwrap();

        assert_eq!(nav.next_valid(&[false; 4]).unwrap(), 2);
        assert_eq!(nav.previous_invalid(&[true; 4]).unwrap(), 2);
        assert_eq!(nav.next_valid(&[]).unwrap(), 2);
    }

    #[test]
    fn empty_sequence() {
        let mut nav = FrameNavigator::new(0);
        assert!(matches!(nav.go_to(0), Err(NavigateError::EmptySequence)));
        assert!(matches!(nav.next(), Err(NavigateError::EmptySequence)));
        assert!(matches!(nav.next_valid(&[]), Err(NavigateError::EmptySequence)));
        assert!(matches!(nav.random(), Err(NavigateError::EmptySequence)));
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn random_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut nav = FrameNavigator::new(6);
        let mut seen = [false; 6];

        for _ in 0..200 {
            let frame = nav.random_with(&mut rng).unwrap();
            seen[frame] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn play_next_follows_mode() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut nav = FrameNavigator::new(3);

        assert_eq!(nav.play_next_with(&mut rng).unwrap(), 1);

        nav.set_play_mode(PlayMode::Backward);
        assert_eq!(nav.play_next_with(&mut rng).unwrap(), 0);
        assert_eq!(nav.play_next_with(&mut rng).unwrap(), 2);

        nav.set_play_mode(PlayMode::Random);
        assert!(nav.play_next_with(&mut rng).unwrap() < 3);
    }

    #[test]
    fn play_mode_names() {
        assert_eq!("Backward".parse::<PlayMode>().unwrap(), PlayMode::Backward);
        assert_eq!(PlayMode::Random.to_string(), "random");
        assert!("sideways".parse::<PlayMode>().is_err());
    }
}
