//! Grid-bucketed store of static solid regions and the sweep queries run against it.

use delve_core::{Aabb, Axis, CellCoord, GridMetrics, Tag, TagLookup, Vec2};

/// Tolerance used when grouping regions that share a contact boundary.
const CONTACT_EPSILON: f32 = 1e-4;

/// Static rectangle carrying a tag, immutable once inserted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidRegion {
    bounds: Aabb,
    tag: Tag,
}

impl SolidRegion {
    /// Rectangle covered by the region.
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Tag attached to the region.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        self.tag
    }
}

/// Outcome of a blocked sweep along a single axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    /// Axis that was swept.
    pub axis: Axis,
    /// Signed displacement that brings the body flush with the nearest blocker.
    pub contact: f32,
    /// Perpendicular shift that would clear the blockers, when that shift is unobstructed.
    pub slide: Option<f32>,
}

/// Spatial index over static regions, bucketed by the tiles each region covers.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    metrics: GridMetrics,
    regions: Vec<SolidRegion>,
    buckets: Vec<Vec<usize>>,
    outside: Vec<usize>,
}

impl SpatialIndex {
    /// Creates an empty index covering the provided grid.
    #[must_use]
    pub fn new(metrics: GridMetrics) -> Self {
        let cell_count = usize::try_from(metrics.columns())
            .ok()
            .and_then(|columns| {
                usize::try_from(metrics.rows())
                    .ok()
                    .and_then(|rows| columns.checked_mul(rows))
            })
            .unwrap_or(0);

        Self {
            metrics,
            regions: Vec::new(),
            buckets: vec![Vec::new(); cell_count],
            outside: Vec::new(),
        }
    }

    /// Adds a region to the index.
    pub fn insert(&mut self, bounds: Aabb, tag: Tag) {
        let slot = self.regions.len();
        self.regions.push(SolidRegion { bounds, tag });

        let Some((first, last)) = self.metrics.cell_span(&bounds) else {
            self.outside.push(slot);
            return;
        };

        for row in first.row()..=last.row() {
            for column in first.column()..=last.column() {
                if let Some(bucket) = self
                    .bucket_index(CellCoord::new(column, row))
                    .and_then(|index| self.buckets.get_mut(index))
                {
                    bucket.push(slot);
                }
            }
        }
    }

    /// Grid geometry used to bucket regions.
    #[must_use]
    pub fn metrics(&self) -> GridMetrics {
        self.metrics
    }

    /// Every region in insertion order.
    #[must_use]
    pub fn regions(&self) -> &[SolidRegion] {
        &self.regions
    }

    /// Reports whether any region tagged with `tag` shares area with `rect`.
    #[must_use]
    pub fn overlaps_tag(&self, rect: &Aabb, tag: Tag) -> bool {
        self.candidates(rect)
            .into_iter()
            .any(|region| region.tag == tag && region.bounds.overlaps(rect))
    }

    /// Reports whether any region tagged with `tag` contains `point`.
    #[must_use]
    pub fn point_has_tag(&self, point: Vec2, tag: Tag) -> bool {
        let sample = Aabb::new(point - Vec2::splat(0.5), Vec2::ONE);
        self.candidates(&sample)
            .into_iter()
            .any(|region| region.tag == tag && region.bounds.contains_point(point))
    }

    /// Sweeps `body` by `distance` along `axis` against regions tagged with `tag`.
    ///
    /// A region already overlapping the body at the start of the sweep is
    /// ignored while the body moves away from its center, so a wedged body can
    /// always back out; moving deeper is blocked with a zero contact. Returns
    /// `None` when the sweep is clear. Otherwise the [`Collision`] reports the displacement that
    /// stops the body at the nearest blocker and, when the perpendicular shift
    /// needed to clear every blocker at that boundary is itself unobstructed,
    /// that shift as a slide.
    #[must_use]
    pub fn query_move(
        &self,
        body: &Aabb,
        axis: Axis,
        distance: f32,
        tag: Tag,
    ) -> Option<Collision> {
        if distance == 0.0 || !distance.is_finite() {
            return None;
        }

        let swept = sweep(body, along(axis, distance));
        let blockers: Vec<&SolidRegion> = self
            .candidates(&swept)
            .into_iter()
            .filter(|region| {
                region.tag == tag
                    && region.bounds.overlaps(&swept)
                    && !escapes(body, &region.bounds, axis, distance)
            })
            .collect();

        let gaps: Vec<f32> = blockers
            .iter()
            .map(|region| {
                if region.bounds.overlaps(body) {
                    0.0
                } else {
                    gap(body, &region.bounds, axis, distance)
                }
            })
            .collect();
        let contact = if distance > 0.0 {
            gaps.iter().copied().reduce(f32::min)?
        } else {
            gaps.iter().copied().reduce(f32::max)?
        };

        let mut low = f32::INFINITY;
        let mut high = f32::NEG_INFINITY;
        for (region, gap) in blockers.iter().zip(&gaps) {
            if (gap - contact).abs() > CONTACT_EPSILON {
                continue;
            }
            let (start, end) = perpendicular_extent(&region.bounds, axis);
            low = low.min(start);
            high = high.max(end);
        }

        let (body_start, body_end) = perpendicular_extent(body, axis);
        let backward = low - body_end;
        let forward = high - body_start;
        let shift = if backward.abs() <= forward.abs() {
            backward
        } else {
            forward
        };

        let at_contact = body.translated(along(axis, contact));
        let slid = at_contact.translated(along(other(axis), shift));
        let slide = (!self.overlaps_tag(&sweep(&at_contact, along(other(axis), shift)), tag)
            && !self.overlaps_tag(&sweep(&slid, along(axis, distance - contact)), tag))
        .then_some(shift);

        Some(Collision {
            axis,
            contact,
            slide,
        })
    }

    fn candidates(&self, rect: &Aabb) -> Vec<&SolidRegion> {
        let mut slots: Vec<usize> = self.outside.clone();

        if let Some((first, last)) = self.metrics.cell_span(rect) {
            for row in first.row()..=last.row() {
                for column in first.column()..=last.column() {
                    if let Some(bucket) = self
                        .bucket_index(CellCoord::new(column, row))
                        .and_then(|index| self.buckets.get(index))
                    {
                        slots.extend_from_slice(bucket);
                    }
                }
            }
        }

        slots.sort_unstable();
        slots.dedup();
        slots
            .into_iter()
            .filter_map(|slot| self.regions.get(slot))
            .collect()
    }

    fn bucket_index(&self, cell: CellCoord) -> Option<usize> {
        if !self.metrics.contains(cell) {
            return None;
        }
        let columns = usize::try_from(self.metrics.columns()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(columns)?.checked_add(column)
    }
}

impl TagLookup for SpatialIndex {
    fn cell_has_tag(&self, cell: CellCoord, tag: Tag) -> bool {
        if !self.metrics.contains(cell) {
            return false;
        }
        self.overlaps_tag(&self.metrics.cell_bounds(cell), tag)
    }
}

pub(crate) fn along(axis: Axis, distance: f32) -> Vec2 {
    match axis {
        Axis::Horizontal => Vec2::new(distance, 0.0),
        Axis::Vertical => Vec2::new(0.0, distance),
    }
}

pub(crate) fn other(axis: Axis) -> Axis {
    match axis {
        Axis::Horizontal => Axis::Vertical,
        Axis::Vertical => Axis::Horizontal,
    }
}

fn sweep(rect: &Aabb, offset: Vec2) -> Aabb {
    let moved = rect.translated(offset);
    let min = rect.position().min(moved.position());
    let max = Vec2::new(rect.right().max(moved.right()), rect.bottom().max(moved.bottom()));
    Aabb::new(min, max - min)
}

fn gap(body: &Aabb, blocker: &Aabb, axis: Axis, distance: f32) -> f32 {
    match (axis, distance > 0.0) {
        (Axis::Horizontal, true) => blocker.left() - body.right(),
        (Axis::Horizontal, false) => blocker.right() - body.left(),
        (Axis::Vertical, true) => blocker.top() - body.bottom(),
        (Axis::Vertical, false) => blocker.bottom() - body.top(),
    }
}

/// Whether `body` already overlaps `blocker` and the sweep carries it away
/// from the blocker's center.
fn escapes(body: &Aabb, blocker: &Aabb, axis: Axis, distance: f32) -> bool {
    if !blocker.overlaps(body) {
        return false;
    }
    let offset = blocker.center() - body.center();
    let ahead = match axis {
        Axis::Horizontal => offset.x,
        Axis::Vertical => offset.y,
    };
    ahead * distance < 0.0
}

fn perpendicular_extent(rect: &Aabb, axis: Axis) -> (f32, f32) {
    match axis {
        Axis::Horizontal => (rect.top(), rect.bottom()),
        Axis::Vertical => (rect.left(), rect.right()),
    }
}
