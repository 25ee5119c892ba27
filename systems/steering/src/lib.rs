#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Velocity integration shared by every steered agent.
//!
//! Input-driven and path-following agents differ only in where their desired
//! direction comes from. Both feed that direction through a
//! [`SteeringController`], which applies friction, acceleration and the speed
//! cap, and tracks the facing and animation state that presentation layers
//! read back.

use delve_core::{Clip, FrictionPolicy, SteeringTuning, Vec2};

/// Speed along an axis above which the animation clip reacts to that axis.
const CLIP_AXIS_THRESHOLD: f32 = 0.3;

/// Presentation state derived from the most recent integration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Unit vector of the last non-zero velocity.
    pub facing: Vec2,
    /// Clip selected from the velocity's dominant axes.
    pub clip: Clip,
    /// Whether sprites should be mirrored horizontally.
    pub mirrored: bool,
    /// Whether the body is moving at all.
    pub moving: bool,
}

/// Integrates desired directions into velocities using fixed tuning.
#[derive(Clone, Debug)]
pub struct SteeringController {
    tuning: SteeringTuning,
    pose: Pose,
}

impl SteeringController {
    /// Creates a controller facing down the screen.
    #[must_use]
    pub fn new(tuning: SteeringTuning) -> Self {
        Self {
            tuning,
            pose: Pose {
                facing: Vec2::new(0.0, 1.0),
                clip: Clip::Down,
                mirrored: false,
                moving: false,
            },
        }
    }

    /// Tuning applied by the controller.
    #[must_use]
    pub fn tuning(&self) -> SteeringTuning {
        self.tuning
    }

    /// Presentation state captured by the last call to [`Self::integrate`].
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Unit vector of the last non-zero velocity.
    #[must_use]
    pub fn facing(&self) -> Vec2 {
        self.pose.facing
    }

    /// Produces the next velocity from the current one and a desired direction.
    ///
    /// Friction is applied first, then acceleration along the normalised
    /// `desired` direction (skipped for zero or non-finite vectors), then the
    /// speed cap. The returned vector is the velocity the body should carry.
    pub fn integrate(&mut self, velocity: Vec2, desired: Vec2) -> Vec2 {
        let mut next = apply_friction(velocity, self.tuning.friction, self.tuning.friction_policy);

        if let Some(direction) = desired.try_normalize() {
            next += direction * self.tuning.acceleration;
        }

        next = clamp_speed(next, self.tuning.max_speed);
        self.observe(next);
        next
    }

    fn observe(&mut self, velocity: Vec2) {
        if let Some(facing) = velocity.try_normalize() {
            self.pose.facing = facing;
        }

        if self.pose.facing.x < 0.0 {
            self.pose.mirrored = true;
        } else if self.pose.facing.x > 0.0 {
            self.pose.mirrored = false;
        }

        if let Some(clip) = clip_for(velocity) {
            self.pose.clip = clip;
        }
        self.pose.moving = velocity != Vec2::ZERO;
    }
}

/// Removes `friction` worth of speed from `velocity` according to `policy`.
///
/// Speeds that friction would overshoot snap to exactly zero.
#[must_use]
pub fn apply_friction(velocity: Vec2, friction: f32, policy: FrictionPolicy) -> Vec2 {
    match policy {
        FrictionPolicy::PerAxis => Vec2::new(
            decay_axis(velocity.x, friction),
            decay_axis(velocity.y, friction),
        ),
        FrictionPolicy::Magnitude => {
            let speed = velocity.length();
            if speed <= friction {
                Vec2::ZERO
            } else {
                velocity * ((speed - friction) / speed)
            }
        }
    }
}

/// Rescales `velocity` so its magnitude does not exceed `max_speed`.
#[must_use]
pub fn clamp_speed(velocity: Vec2, max_speed: f32) -> Vec2 {
    if velocity.length() > max_speed {
        velocity.normalize_or_zero() * max_speed
    } else {
        velocity
    }
}

fn decay_axis(value: f32, friction: f32) -> f32 {
    if value > friction {
        value - friction
    } else if value < -friction {
        value + friction
    } else {
        0.0
    }
}

fn clip_for(velocity: Vec2) -> Option<Clip> {
    let horizontal = velocity.x.abs() > CLIP_AXIS_THRESHOLD;
    let vertical = if velocity.y < -CLIP_AXIS_THRESHOLD {
        -1
    } else if velocity.y > CLIP_AXIS_THRESHOLD {
        1
    } else {
        0
    };

    match (vertical, horizontal) {
        (-1, true) => Some(Clip::UpRight),
        (-1, false) => Some(Clip::Up),
        (0, true) => Some(Clip::Right),
        (1, true) => Some(Clip::DownRight),
        (1, false) => Some(Clip::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn speed_below_friction_snaps_to_zero() {
        let slow = Vec2::new(0.1, -0.15);
        assert_eq!(
            apply_friction(slow, 0.25, FrictionPolicy::Magnitude),
            Vec2::ZERO
        );
        assert_eq!(
            apply_friction(slow, 0.25, FrictionPolicy::PerAxis),
            Vec2::ZERO
        );

        let mut controller = SteeringController::new(SteeringTuning::player());
        assert_eq!(controller.integrate(slow, Vec2::ZERO), Vec2::ZERO);
        assert!(!controller.pose().moving);
    }

    #[test]
    fn per_axis_friction_treats_axes_independently() {
        let decayed = apply_friction(Vec2::new(1.0, 0.2), 0.25, FrictionPolicy::PerAxis);
        assert_eq!(decayed, Vec2::new(0.75, 0.0));

        let decayed = apply_friction(Vec2::new(-1.0, -0.5), 0.25, FrictionPolicy::PerAxis);
        assert_eq!(decayed, Vec2::new(-0.75, -0.25));
    }

    #[test]
    fn magnitude_friction_preserves_direction() {
        let decayed = apply_friction(Vec2::new(3.0, 4.0), 0.5, FrictionPolicy::Magnitude);
        assert!((decayed.length() - 4.5).abs() < EPSILON);
        assert!((decayed.normalize() - Vec2::new(0.6, 0.8)).length() < EPSILON);
    }

    #[test]
    fn acceleration_uses_normalised_direction() {
        let mut controller = SteeringController::new(SteeringTuning::hunter());
        let velocity = controller.integrate(Vec2::ZERO, Vec2::new(30.0, 40.0));
        assert!((velocity - Vec2::new(0.3, 0.4)).length() < EPSILON);
    }

    #[test]
    fn zero_or_invalid_direction_adds_no_acceleration() {
        let mut controller = SteeringController::new(SteeringTuning::hunter());
        assert_eq!(controller.integrate(Vec2::ZERO, Vec2::ZERO), Vec2::ZERO);
        assert_eq!(
            controller.integrate(Vec2::ZERO, Vec2::new(f32::NAN, 1.0)),
            Vec2::ZERO
        );
    }

    #[test]
    fn clamp_assigns_rescaled_velocity() {
        let clamped = clamp_speed(Vec2::new(6.0, 8.0), 2.0);
        assert!((clamped - Vec2::new(1.2, 1.6)).length() < EPSILON);
        assert_eq!(clamp_speed(Vec2::new(1.0, 0.0), 2.0), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn integrate_never_exceeds_max_speed() {
        for policy in [FrictionPolicy::PerAxis, FrictionPolicy::Magnitude] {
            let tuning = SteeringTuning {
                friction: 0.25,
                acceleration: 0.9,
                max_speed: 2.0,
                friction_policy: policy,
            };
            let mut controller = SteeringController::new(tuning);
            let mut velocity = Vec2::ZERO;

            for step in 0..400 {
                let angle = step as f32 * 0.37;
                let desired = Vec2::new(angle.cos(), angle.sin()) * (1 + step % 5) as f32;
                velocity = controller.integrate(velocity, desired);
                assert!(
                    velocity.length() <= tuning.max_speed + EPSILON,
                    "speed {} exceeded cap at step {step}",
                    velocity.length()
                );
            }
        }
    }

    #[test]
    fn sustained_input_converges_on_max_speed() {
        let mut controller = SteeringController::new(SteeringTuning::player());
        let mut velocity = Vec2::ZERO;
        for _ in 0..32 {
            velocity = controller.integrate(velocity, Vec2::X);
        }
        assert!((velocity.length() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn facing_holds_when_velocity_reaches_zero() {
        let mut controller = SteeringController::new(SteeringTuning::player());
        let velocity = controller.integrate(Vec2::ZERO, Vec2::new(-1.0, 0.0));
        assert_eq!(controller.facing(), Vec2::new(-1.0, 0.0));
        assert!(controller.pose().mirrored);

        let stopped = controller.integrate(velocity * 0.5, Vec2::ZERO);
        assert_eq!(stopped, Vec2::ZERO);
        assert_eq!(controller.facing(), Vec2::new(-1.0, 0.0));
        assert!(controller.pose().mirrored);
        assert!(!controller.pose().moving);
    }

    #[test]
    fn clip_follows_axes_above_threshold() {
        assert_eq!(clip_for(Vec2::new(0.5, -0.5)), Some(Clip::UpRight));
        assert_eq!(clip_for(Vec2::new(-0.5, -0.5)), Some(Clip::UpRight));
        assert_eq!(clip_for(Vec2::new(0.2, -0.5)), Some(Clip::Up));
        assert_eq!(clip_for(Vec2::new(-1.0, 0.1)), Some(Clip::Right));
        assert_eq!(clip_for(Vec2::new(0.4, 0.4)), Some(Clip::DownRight));
        assert_eq!(clip_for(Vec2::new(0.0, 2.0)), Some(Clip::Down));
        assert_eq!(clip_for(Vec2::new(0.29, -0.29)), None);
    }

    #[test]
    fn slow_motion_keeps_previous_clip_but_reports_moving() {
        let mut controller = SteeringController::new(SteeringTuning::player());
        let mut velocity = Vec2::ZERO;
        for _ in 0..4 {
            velocity = controller.integrate(velocity, Vec2::new(0.0, -1.0));
        }
        assert_eq!(controller.pose().clip, Clip::Up);

        let tuning = SteeringTuning {
            friction: 0.0,
            acceleration: 0.1,
            max_speed: 0.2,
            friction_policy: FrictionPolicy::PerAxis,
        };
        let mut gentle = SteeringController::new(tuning);
        let _ = gentle.integrate(Vec2::ZERO, Vec2::X);
        assert_eq!(gentle.pose().clip, Clip::Down);
        assert!(gentle.pose().moving);
    }
}
