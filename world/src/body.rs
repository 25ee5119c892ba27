//! Physical footprint and velocity of an agent, resolved one axis at a time.

use delve_core::{Aabb, Axis, CollisionTuning, Tag, Vec2};

use crate::collision::{along, other, SpatialIndex};

/// Axis-aligned footprint carrying the velocity applied every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionBody {
    bounds: Aabb,
    velocity: Vec2,
}

/// Movement committed by a single [`MotionBody::resolve_step`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    /// Displacement actually applied to the body, slides included.
    pub applied: Vec2,
    /// Axes on which a solid region blocked the step, in resolution order.
    pub bumps: Vec<Axis>,
}

impl StepOutcome {
    /// Reports whether either axis collided.
    #[must_use]
    pub fn bumped(&self) -> bool {
        !self.bumps.is_empty()
    }
}

impl MotionBody {
    /// Creates a resting body whose top-left corner sits at `position`.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            bounds: Aabb::new(position, size),
            velocity: Vec2::ZERO,
        }
    }

    /// Rectangle currently covered by the body.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Top-left corner of the body.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.bounds.position()
    }

    /// Center of the body.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Velocity applied on the next step.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Replaces the body's velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Moves the body by its velocity, horizontal axis first.
    ///
    /// A blocked axis moves the body flush against the blocker. When the index
    /// offers a slide below the configured threshold the body shifts along the
    /// other axis and keeps its velocity; otherwise the blocked velocity
    /// component is zeroed. The body never moves past the reported contact.
    pub fn resolve_step(&mut self, index: &SpatialIndex, tuning: &CollisionTuning) -> StepOutcome {
        let start = self.bounds.position();
        let mut bumps = Vec::new();

        for axis in [Axis::Horizontal, Axis::Vertical] {
            let distance = component(self.velocity, axis);
            if distance == 0.0 {
                continue;
            }

            let Some(collision) = index.query_move(&self.bounds, axis, distance, Tag::Solid) else {
                self.bounds = self.bounds.translated(along(axis, distance));
                continue;
            };

            bumps.push(axis);
            self.bounds = self.bounds.translated(along(axis, collision.contact));

            let slide = collision
                .slide
                .filter(|shift| tuning.allow_slide && shift.abs() < tuning.slide_threshold);
            match slide {
                Some(shift) => {
                    self.bounds = self.bounds.translated(along(other(axis), shift));
                }
                None => match axis {
                    Axis::Horizontal => self.velocity.x = 0.0,
                    Axis::Vertical => self.velocity.y = 0.0,
                },
            }
        }

        StepOutcome {
            applied: self.bounds.position() - start,
            bumps,
        }
    }
}

fn component(velocity: Vec2, axis: Axis) -> f32 {
    match axis {
        Axis::Horizontal => velocity.x,
        Axis::Vertical => velocity.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::GridMetrics;

    fn index_with(regions: &[Aabb]) -> SpatialIndex {
        let mut index = SpatialIndex::new(GridMetrics::new(8, 8, 16.0));
        for region in regions {
            index.insert(*region, Tag::Solid);
        }
        index
    }

    fn body_at(x: f32, y: f32, velocity: Vec2) -> MotionBody {
        let mut body = MotionBody::new(Vec2::new(x, y), Vec2::splat(8.0));
        body.set_velocity(velocity);
        body
    }

    #[test]
    fn flush_wall_keeps_body_at_contact_boundary() {
        let index = index_with(&[Aabb::from_xywh(8.0, 0.0, 16.0, 16.0)]);
        let mut body = body_at(0.0, 0.0, Vec2::new(2.0, 0.0));

        let outcome = body.resolve_step(&index, &CollisionTuning::default());

        assert_eq!(body.position(), Vec2::ZERO);
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(outcome.applied, Vec2::ZERO);
        assert_eq!(outcome.bumps, vec![Axis::Horizontal]);
    }

    #[test]
    fn free_motion_applies_full_velocity() {
        let index = index_with(&[Aabb::from_xywh(96.0, 96.0, 16.0, 16.0)]);
        let mut body = body_at(20.0, 20.0, Vec2::new(1.5, -2.0));

        let outcome = body.resolve_step(&index, &CollisionTuning::default());

        assert_eq!(body.position(), Vec2::new(21.5, 18.0));
        assert!(!outcome.bumped());
        assert_eq!(body.velocity(), Vec2::new(1.5, -2.0));
    }

    #[test]
    fn blocked_axis_does_not_stop_the_other() {
        let index = index_with(&[Aabb::from_xywh(16.0, 0.0, 16.0, 64.0)]);
        let mut body = body_at(7.0, 20.0, Vec2::new(2.0, 2.0));

        let outcome = body.resolve_step(&index, &CollisionTuning::default());

        assert_eq!(body.position(), Vec2::new(8.0, 22.0));
        assert_eq!(body.velocity(), Vec2::new(0.0, 2.0));
        assert_eq!(outcome.bumps, vec![Axis::Horizontal]);
    }

    #[test]
    fn grazing_corner_slides_and_keeps_speed() {
        let index = index_with(&[Aabb::from_xywh(16.0, 16.0, 16.0, 16.0)]);
        let mut body = body_at(6.0, 10.0, Vec2::new(4.0, 0.0));

        let outcome = body.resolve_step(&index, &CollisionTuning::default());

        assert_eq!(body.position(), Vec2::new(8.0, 8.0));
        assert_eq!(body.velocity(), Vec2::new(4.0, 0.0));
        assert_eq!(outcome.bumps, vec![Axis::Horizontal]);

        let _ = body.resolve_step(&index, &CollisionTuning::default());
        assert_eq!(body.position(), Vec2::new(12.0, 8.0));
    }

    #[test]
    fn sliding_can_be_disabled() {
        let index = index_with(&[Aabb::from_xywh(16.0, 16.0, 16.0, 16.0)]);
        let mut body = body_at(6.0, 10.0, Vec2::new(4.0, 0.0));
        let tuning = CollisionTuning {
            allow_slide: false,
            ..CollisionTuning::default()
        };

        let _ = body.resolve_step(&index, &tuning);

        assert_eq!(body.position(), Vec2::new(8.0, 10.0));
        assert_eq!(body.velocity(), Vec2::ZERO);
    }

    #[test]
    fn resolving_from_identical_state_is_deterministic() {
        let index = index_with(&[
            Aabb::from_xywh(32.0, 16.0, 16.0, 16.0),
            Aabb::from_xywh(16.0, 48.0, 16.0, 16.0),
        ]);
        let template = body_at(21.0, 35.0, Vec2::new(1.75, 1.25));

        let mut first = template.clone();
        let mut second = template;
        for _ in 0..12 {
            let left = first.resolve_step(&index, &CollisionTuning::default());
            let right = second.resolve_step(&index, &CollisionTuning::default());
            assert_eq!(left, right);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn body_wedged_in_wall_cannot_walk_through_it() {
        let index = index_with(&[Aabb::from_xywh(16.0, 0.0, 16.0, 64.0)]);
        let mut body = body_at(10.0, 20.0, Vec2::new(2.0, 0.0));

        for _ in 0..6 {
            body.set_velocity(Vec2::new(2.0, 0.0));
            let outcome = body.resolve_step(&index, &CollisionTuning::default());
            assert_eq!(outcome.bumps, vec![Axis::Horizontal]);
            assert_eq!(body.position(), Vec2::new(10.0, 20.0));
            assert_eq!(body.velocity(), Vec2::ZERO);
        }

        body.set_velocity(Vec2::new(-2.0, 0.0));
        let outcome = body.resolve_step(&index, &CollisionTuning::default());
        assert!(!outcome.bumped());
        assert_eq!(body.position(), Vec2::new(8.0, 20.0));
    }

    #[test]
    fn fast_bodies_never_tunnel_through_walls() {
        let wall = Aabb::from_xywh(48.0, 0.0, 16.0, 128.0);
        let index = index_with(&[wall]);

        for tenth in 1..160 {
            let speed = tenth as f32 * 0.1;
            let mut body = body_at(10.0, 40.0, Vec2::new(speed, 0.0));
            for _ in 0..64 {
                let _ = body.resolve_step(&index, &CollisionTuning::default());
                assert!(body.bounds().right() <= wall.left() + 1e-4);
            }
        }
    }
}
