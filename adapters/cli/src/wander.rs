use delve_system_control::PlayerInput;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MIN_LEG_FRAMES: u32 = 10;
const MAX_LEG_FRAMES: u32 = 40;
const FIRE_CHANCE: f64 = 0.05;

/// Scripted stand-in for a keyboard: holds a random heading for a random
/// number of frames and taps fire now and then.
#[derive(Debug)]
pub(crate) struct Wanderer {
    rng: ChaCha8Rng,
    held: PlayerInput,
    frames_left: u32,
}

impl Wanderer {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            held: PlayerInput::default(),
            frames_left: 0,
        }
    }

    /// Key states for the next frame.
    pub(crate) fn next_input(&mut self) -> PlayerInput {
        if self.frames_left == 0 {
            let horizontal = self.rng.gen_range(-1_i8..=1);
            let vertical = self.rng.gen_range(-1_i8..=1);
            self.held = PlayerInput {
                up: vertical < 0,
                down: vertical > 0,
                left: horizontal < 0,
                right: horizontal > 0,
                fire: false,
            };
            self.frames_left = self.rng.gen_range(MIN_LEG_FRAMES..=MAX_LEG_FRAMES);
        }
        self.frames_left -= 1;

        PlayerInput {
            fire: self.rng.gen_bool(FIRE_CHANCE),
            ..self.held
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_seeds_script_identical_input() {
        let mut first = Wanderer::new(17);
        let mut second = Wanderer::new(17);

        for _ in 0..500 {
            assert_eq!(first.next_input(), second.next_input());
        }
    }

    #[test]
    fn heading_is_held_for_at_least_a_full_leg() {
        let mut wanderer = Wanderer::new(3);
        let heading = |input: PlayerInput| input.direction();

        let opening = heading(wanderer.next_input());
        for _ in 1..MIN_LEG_FRAMES {
            assert_eq!(heading(wanderer.next_input()), opening);
        }
    }

    #[test]
    fn never_holds_opposing_keys() {
        let mut wanderer = Wanderer::new(8);
        for _ in 0..1_000 {
            let input = wanderer.next_input();
            assert!(!(input.up && input.down));
            assert!(!(input.left && input.right));
        }
    }
}
