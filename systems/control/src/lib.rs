#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure control system that turns adapter key states into player commands.

use delve_core::{AgentId, Command, Event, Role, Vec2};

/// Key states sampled by an adapter for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInput {
    /// Whether the up key is held.
    pub up: bool,
    /// Whether the down key is held.
    pub down: bool,
    /// Whether the left key is held.
    pub left: bool,
    /// Whether the right key is held.
    pub right: bool,
    /// Whether the fire key is held.
    pub fire: bool,
}

impl PlayerInput {
    /// Raw direction described by the held arrow keys; opposing keys cancel out.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.right {
            direction.x += 1.0;
        }
        if self.left {
            direction.x -= 1.0;
        }
        if self.up {
            direction.y -= 1.0;
        }
        if self.down {
            direction.y += 1.0;
        }
        direction
    }
}

/// Control system tracking the player agent and the previous frame's input.
#[derive(Debug, Default)]
pub struct Control {
    player: Option<AgentId>,
    held_direction: Vec2,
    fire_held: bool,
}

impl Control {
    /// Creates a control system that is not yet bound to a player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Agent currently receiving the input.
    #[must_use]
    pub fn player(&self) -> Option<AgentId> {
        self.player
    }

    /// Consumes world events and the frame's input to emit player commands.
    ///
    /// The first player spawn binds the system; removing that agent unbinds
    /// it. A steer command is emitted only when the held direction changes and
    /// a fire command only on the frame the fire key goes down.
    pub fn handle(&mut self, events: &[Event], input: PlayerInput, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::AgentSpawned {
                    agent,
                    role: Role::Player,
                    ..
                } if self.player.is_none() => {
                    self.player = Some(*agent);
                    self.held_direction = Vec2::ZERO;
                }
                Event::AgentRemoved { agent } if self.player == Some(*agent) => {
                    self.player = None;
                }
                _ => {}
            }
        }

        let fire_pressed = input.fire && !self.fire_held;
        self.fire_held = input.fire;

        let Some(agent) = self.player else {
            return;
        };

        let direction = input.direction();
        if direction != self.held_direction {
            self.held_direction = direction;
            out.push(Command::Steer { agent, direction });
        }

        if fire_pressed {
            out.push(Command::Fire { agent });
        }
    }
}
