use glam::Vec2;

/// Grid geometry: NX x NY interior cells wrapped in a one-cell boundary ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
}

impl Grid {
    pub const fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    /// Row stride including both ring columns.
    #[inline(always)]
    pub const fn stride(&self) -> usize {
        self.nx + 2
    }

    /// Total stored cells, ring included: (NX+2)(NY+2).
    pub const fn num_cells(&self) -> usize {
        (self.nx + 2) * (self.ny + 2)
    }

    /// Fast index for cells where 0 <= i <= NX+1 and 0 <= j <= NY+1.
    #[inline(always)]
    pub const fn idx(&self, i: usize, j: usize) -> usize {
        i + self.stride() * j
    }
}

/// Two equally sized buffers whose "current" and "old" roles can be exchanged
/// without copying.
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    cur: Vec<T>,
    old: Vec<T>,
}

impl<T: Copy> DoubleBuffer<T> {
    pub fn new(len: usize, value: T) -> Self {
        Self {
            cur: vec![value; len],
            old: vec![value; len],
        }
    }

    pub fn cur(&self) -> &[T] {
        &self.cur
    }

    pub fn cur_mut(&mut self) -> &mut [T] {
        &mut self.cur
    }

    pub fn old(&self) -> &[T] {
        &self.old
    }

    pub fn old_mut(&mut self) -> &mut [T] {
        &mut self.old
    }

    /// Borrow both slots at once: `(current, old)`.
    pub fn split_mut(&mut self) -> (&mut [T], &mut [T]) {
        (&mut self.cur, &mut self.old)
    }

    /// Exchange roles. Only the vector headers move.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.cur, &mut self.old);
    }

    pub fn fill(&mut self, value: T) {
        self.cur.fill(value);
        self.old.fill(value);
    }

    pub fn len(&self) -> usize {
        self.cur.len()
    }
}

/// All per-cell simulation buffers, sized together for one grid.
pub struct FluidState {
    pub grid: Grid,
    pub uv: DoubleBuffer<Vec2>,
    pub r: DoubleBuffer<f32>,
    pub g: DoubleBuffer<f32>,
    pub b: DoubleBuffer<f32>,
    /// Signed curl of the velocity field, rebuilt by vorticity confinement.
    pub curl: Vec<f32>,
    /// General-purpose scratch buffer (|curl| during confinement, pressure during projection).
    pub scratch_a: Vec<f32>,
    /// General-purpose scratch buffer (used for divergence field).
    pub scratch_b: Vec<f32>,
}

impl FluidState {
    pub fn new(grid: Grid) -> Self {
        let size = grid.num_cells();
        Self {
            grid,
            uv: DoubleBuffer::new(size, Vec2::ZERO),
            r: DoubleBuffer::new(size, 0.0),
            g: DoubleBuffer::new(size, 0.0),
            b: DoubleBuffer::new(size, 0.0),
            curl: vec![0.0; size],
            scratch_a: vec![0.0; size],
            scratch_b: vec![0.0; size],
        }
    }

    /// Zero every buffer in place, keeping the allocation.
    pub fn reset(&mut self) {
        self.uv.fill(Vec2::ZERO);
        self.r.fill(0.0);
        self.g.fill(0.0);
        self.b.fill(0.0);
        self.curl.fill(0.0);
        self.scratch_a.fill(0.0);
        self.scratch_b.fill(0.0);
    }
}
