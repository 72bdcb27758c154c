//! Side-view geometry.
//!
//! The 3×3 bar matrix sits at the center of the world rectangle. Vetoes form
//! two concentric rings around it, plus a crystal column squeezed between
//! the matrix and the internal downstream strips. Every veto is placed
//! relative to a neighbor's edge, so the whole layout is a linear function
//! of the world rectangle.

use crate::domain::model::{
    ElementCounts, ElementKind, ElementTag, Region, WorldPoint, WorldRect, EXTERNAL_VETOES,
    INTERNAL_VETOES,
};
use crate::utils::error::{BedError, Result};

const INTERNAL_STRIPS_PER_SIDE: usize = 4;
const EXTERNAL_VERTICAL_STRIPS: usize = 2;
const EXTERNAL_HORIZONTAL_STRIPS: usize = 3;

/// Immutable region table for one detector configuration.
#[derive(Debug, Clone)]
pub struct DetectorLayout {
    bounds: WorldRect,
    counts: ElementCounts,
    bars: Vec<Region>,
    vetoes: Vec<Region>,
}

impl DetectorLayout {
    pub fn compute(bounds: WorldRect, counts: ElementCounts) -> Result<Self> {
        if bounds.is_degenerate() {
            return Err(BedError::DegenerateBounds {
                width: bounds.width,
                height: bounds.height,
            });
        }

        let spacing = Spacing::for_bounds(&bounds);
        let center = bounds.center();
        let grid = WorldRect::new(
            center.x - 1.5 * spacing.box_width,
            center.y - 1.5 * spacing.box_height,
            3.0 * spacing.box_width,
            3.0 * spacing.box_height,
        );

        let bars = place_bars(&grid, &spacing)
            .into_iter()
            .enumerate()
            .map(|(index, rect)| Region {
                kind: ElementKind::Bar,
                index,
                rect,
            })
            .collect::<Vec<_>>();

        let vetoes = place_vetoes(&grid, &spacing, counts.crystal_vetoes())
            .into_iter()
            .enumerate()
            .map(|(index, rect)| Region {
                kind: ElementKind::Veto,
                index,
                rect,
            })
            .collect::<Vec<_>>();

        debug_assert_eq!(bars.len(), counts.bars());
        debug_assert_eq!(vetoes.len(), counts.total_vetoes());

        tracing::debug!(
            bars = bars.len(),
            vetoes = vetoes.len(),
            width = bounds.width,
            height = bounds.height,
            "computed side view layout"
        );

        Ok(Self {
            bounds,
            counts,
            bars,
            vetoes,
        })
    }

    pub fn bounds(&self) -> WorldRect {
        self.bounds
    }

    pub fn counts(&self) -> ElementCounts {
        self.counts
    }

    pub fn bars(&self) -> &[Region] {
        &self.bars
    }

    pub fn vetoes(&self) -> &[Region] {
        &self.vetoes
    }

    /// Bars in index order, then vetoes in index order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.bars.iter().chain(self.vetoes.iter())
    }

    pub fn region(&self, tag: &ElementTag) -> Option<&Region> {
        match tag.kind() {
            ElementKind::Bar => self.bars.get(tag.index()),
            ElementKind::Veto => self.vetoes.get(tag.index()),
        }
    }

    /// First region containing `point`, bars before vetoes.
    pub fn locate(&self, point: WorldPoint) -> Option<ElementTag> {
        self.regions().find(|region| region.contains(point)).map(Region::tag)
    }
}

/// Base spacing derived from the world size. Horizontal quantities scale
/// with the width and vertical ones with the height.
#[derive(Debug, Clone, Copy)]
struct Spacing {
    gap_x: f64,
    gap_y: f64,
    box_width: f64,
    box_height: f64,
}

impl Spacing {
    fn for_bounds(bounds: &WorldRect) -> Self {
        let gap_x = bounds.width / 48.0;
        let gap_y = bounds.height / 48.0;
        Self {
            gap_x,
            gap_y,
            box_width: bounds.width / 12.0 - 2.0 * gap_x,
            box_height: bounds.height / 12.0 - 2.0 * gap_y,
        }
    }

    /// Caps are as wide as the bar matrix plus one gap.
    fn cap_width(&self) -> f64 {
        3.0 * self.box_width + self.gap_x
    }
}

/// Row-major, top row first, left to right.
fn place_bars(grid: &WorldRect, spacing: &Spacing) -> Vec<WorldRect> {
    let mut bars = Vec::with_capacity(9);
    let mut row_bottom = grid.max_y() - spacing.box_height;
    for _ in 0..3 {
        let mut next_left = grid.min_x();
        for _ in 0..3 {
            let bar = WorldRect::new(next_left, row_bottom, spacing.box_width, spacing.box_height);
            next_left = bar.max_x();
            bars.push(bar);
        }
        row_bottom -= spacing.box_height;
    }
    bars
}

fn place_vetoes(grid: &WorldRect, spacing: &Spacing, crystals: usize) -> Vec<WorldRect> {
    let gx = spacing.gap_x;
    let gy = spacing.gap_y;

    // Crystal column between the matrix and the internal downstream strips.
    let crystal_left = grid.max_x() + gx - spacing.box_width / 2.75;
    let crystal_column = WorldRect::from_edges(
        crystal_left,
        grid.min_y() + gy / 2.0,
        crystal_left + gx / 2.0,
        grid.max_y(),
    );

    // Internal ring: one gap outside the matrix on every side.
    let internal_upstream = WorldRect::from_edges(
        grid.min_x() - 2.0 * gx,
        grid.min_y(),
        grid.min_x() - gx,
        grid.max_y(),
    );
    let internal_downstream = WorldRect::from_edges(
        grid.max_x() + gx,
        grid.min_y(),
        grid.max_x() + 2.0 * gx,
        grid.max_y(),
    );
    let internal_top = WorldRect::from_edges(
        grid.min_x(),
        grid.max_y() + gy,
        grid.max_x(),
        grid.max_y() + 2.0 * gy,
    );
    let internal_bottom = WorldRect::from_edges(
        grid.min_x(),
        grid.min_y() - 2.0 * gy,
        grid.max_x(),
        grid.min_y() - gy,
    );

    // External ring: one gap outside the internal ring. Vertical strips run
    // from the internal bottom strip to the internal top strip, horizontal
    // strips from the internal upstream strip to the internal downstream strip.
    let external_upstream = WorldRect::from_edges(
        internal_upstream.min_x() - 2.0 * gx,
        internal_bottom.min_y(),
        internal_upstream.min_x() - gx,
        internal_top.max_y(),
    );
    let external_downstream = WorldRect::from_edges(
        internal_downstream.max_x() + gx,
        internal_bottom.min_y(),
        internal_downstream.max_x() + 2.0 * gx,
        internal_top.max_y(),
    );
    let external_top = WorldRect::from_edges(
        internal_upstream.min_x(),
        internal_top.max_y() + gy,
        internal_downstream.max_x(),
        internal_top.max_y() + 2.0 * gy,
    );
    let external_bottom = WorldRect::from_edges(
        internal_upstream.min_x(),
        internal_bottom.min_y() - 2.0 * gy,
        internal_downstream.max_x(),
        internal_bottom.min_y() - gy,
    );

    // Caps: internal caps one gap outside the external vertical strips,
    // external caps one gap outside the internal caps.
    let cap_width = spacing.cap_width();
    let internal_left_cap = WorldRect::from_edges(
        external_upstream.min_x() - gx - cap_width,
        internal_upstream.min_y(),
        external_upstream.min_x() - gx,
        internal_upstream.max_y(),
    );
    let internal_right_cap = WorldRect::from_edges(
        external_downstream.max_x() + gx,
        internal_downstream.min_y(),
        external_downstream.max_x() + gx + cap_width,
        internal_downstream.max_y(),
    );
    let external_left_cap = WorldRect::from_edges(
        internal_left_cap.min_x() - gx - cap_width,
        external_upstream.min_y(),
        internal_left_cap.min_x() - gx,
        external_upstream.max_y(),
    );
    let external_right_cap = WorldRect::from_edges(
        internal_right_cap.max_x() + gx,
        external_downstream.min_y(),
        internal_right_cap.max_x() + gx + cap_width,
        external_downstream.max_y(),
    );

    let mut vetoes = Vec::with_capacity(crystals + INTERNAL_VETOES + EXTERNAL_VETOES);

    vetoes.extend(split_up(&crystal_column, crystals, gy / 2.0));

    vetoes.extend(split_up(&internal_upstream, INTERNAL_STRIPS_PER_SIDE, 0.0));
    vetoes.extend(split_across(&internal_top, INTERNAL_STRIPS_PER_SIDE));
    vetoes.extend(split_up(&internal_downstream, INTERNAL_STRIPS_PER_SIDE, 0.0).into_iter().rev());
    vetoes.extend(split_across(&internal_bottom, INTERNAL_STRIPS_PER_SIDE).into_iter().rev());
    vetoes.push(internal_left_cap);
    vetoes.push(internal_right_cap);

    vetoes.extend(split_up(&external_upstream, EXTERNAL_VERTICAL_STRIPS, 0.0));
    vetoes.extend(split_across(&external_top, EXTERNAL_HORIZONTAL_STRIPS));
    vetoes.extend(split_up(&external_downstream, EXTERNAL_VERTICAL_STRIPS, 0.0).into_iter().rev());
    vetoes.extend(split_across(&external_bottom, EXTERNAL_HORIZONTAL_STRIPS).into_iter().rev());
    vetoes.push(external_left_cap);
    vetoes.push(external_right_cap);

    vetoes
}

/// Splits a column into `cells` equal cells, bottom to top, `spacing` apart.
fn split_up(column: &WorldRect, cells: usize, spacing: f64) -> Vec<WorldRect> {
    let cell_height = (column.height - spacing * (cells - 1) as f64) / cells as f64;
    let mut next_bottom = column.min_y();
    (0..cells)
        .map(|_| {
            let cell = WorldRect::new(column.x, next_bottom, column.width, cell_height);
            next_bottom = cell.max_y() + spacing;
            cell
        })
        .collect()
}

/// Splits a row into `cells` equal, edge-sharing cells, left to right.
fn split_across(row: &WorldRect, cells: usize) -> Vec<WorldRect> {
    let cell_width = row.width / cells as f64;
    let mut next_left = row.min_x();
    (0..cells)
        .map(|_| {
            let cell = WorldRect::new(next_left, row.y, cell_width, row.height);
            next_left = cell.max_x();
            cell
        })
        .collect()
}
