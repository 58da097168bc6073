use crate::vector::Vector;

/// Relative margin added around the bounding box of the bodies to obtain the root region.
const RELATIVE_MARGIN: f64 = 1e-3;

/// Minimum margin, so that a single body or coincident bodies still get a region of positive size.
const MIN_MARGIN: f64 = 1e-3;

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const N: usize> {
    /// Minimum corner of the box.
    pub min: Vector<N>,
    /// Maximum corner of the box.
    pub max: Vector<N>,
}

impl<const N: usize> BoundingBox<N> {
    /// Creates a new [`BoundingBox`] with the given min and max corners.
    #[inline]
    pub const fn new(min: Vector<N>, max: Vector<N>) -> Self {
        Self { min, max }
    }

    /// Creates the smallest [`BoundingBox`] containing all the given positions.
    #[inline]
    pub fn containing(positions: impl IntoIterator<Item = Vector<N>>) -> Self {
        let mut result = Self::default();
        for position in positions {
            result.extend(&position);
        }
        result
    }

    /// Extends the [`BoundingBox`] so that it contains the given position.
    #[inline]
    pub fn extend(&mut self, position: &Vector<N>) {
        self.min = self.min.zip_map(*position, f64::min);
        self.max = self.max.zip_map(*position, f64::max);
    }

    /// Returns `true` if no position was added to this [`BoundingBox`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..N).any(|i| self.min[i] > self.max[i])
    }

    /// Returns the size of the [`BoundingBox`] along each axis.
    #[inline]
    pub fn size(&self) -> Vector<N> {
        self.max - self.min
    }

    /// Returns the center of the [`BoundingBox`].
    #[inline]
    pub fn center(&self) -> Vector<N> {
        self.min.zip_map(self.max, |a, b| (a + b) / 2.0)
    }
}

impl<const N: usize> Default for BoundingBox<N> {
    /// The empty box, which any position extends.
    #[inline]
    fn default() -> Self {
        Self::new(
            Vector::splat(f64::INFINITY),
            Vector::splat(f64::NEG_INFINITY),
        )
    }
}

/// An axis-aligned hyper-cube: the region of space covered by a node of a
/// [`SpatialIndex`](crate::SpatialIndex).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region<const N: usize> {
    /// Center of the cube.
    pub center: Vector<N>,
    /// Half of the side length of the cube.
    pub half: f64,
}

impl<const N: usize> Region<N> {
    /// Number of orthants a region is split into.
    pub const ORTHANTS: usize = 1 << N;

    /// Creates a new [`Region`] with the given center and half side length.
    #[inline]
    pub const fn new(center: Vector<N>, half: f64) -> Self {
        Self { center, half }
    }

    /// Creates the root region for the given bounding box: a cube of the largest side of the box,
    /// centered on it and expanded by a margin so that positions on the boundary are strictly
    /// inside.
    pub fn enclosing(bbox: &BoundingBox<N>) -> Self {
        if bbox.is_empty() {
            return Self::new(Vector::ZERO, MIN_MARGIN);
        }

        let half = bbox.size().0.into_iter().fold(0.0, f64::max) / 2.0;
        Self::new(bbox.center(), half + (half * RELATIVE_MARGIN).max(MIN_MARGIN))
    }

    /// Side length of the cube.
    #[inline]
    pub fn side(&self) -> f64 {
        2.0 * self.half
    }

    /// Minimum corner of the cube.
    #[inline]
    pub fn min(&self) -> Vector<N> {
        self.center - Vector::splat(self.half)
    }

    /// Maximum corner of the cube.
    #[inline]
    pub fn max(&self) -> Vector<N> {
        self.center + Vector::splat(self.half)
    }

    /// Returns `true` if the position lies in the cube, boundary included.
    #[inline]
    pub fn contains(&self, position: &Vector<N>) -> bool {
        (0..N).all(|i| (position[i] - self.center[i]).abs() <= self.half)
    }

    /// Clamps a position into the cube.
    #[inline]
    pub fn clamp(&self, position: Vector<N>) -> Vector<N> {
        let (min, max) = (self.min(), self.max());
        Vector::new(std::array::from_fn(|i| position[i].clamp(min[i], max[i])))
    }

    /// Returns the index of the orthant containing the position: bit `i` is set when the `i`-th
    /// coordinate is greater than the one of the center.
    #[inline]
    pub fn orthant(&self, position: &Vector<N>) -> usize {
        (0..N).fold(0, |index, i| {
            index | (usize::from(position[i] > self.center[i]) << i)
        })
    }

    /// Returns the sub-region of the given orthant.
    #[inline]
    pub fn child(&self, orthant: usize) -> Self {
        let quarter = self.half / 2.0;
        let center = Vector::new(std::array::from_fn(|i| {
            if orthant & (1 << i) == 0 {
                self.center[i] - quarter
            } else {
                self.center[i] + quarter
            }
        }));

        Self::new(center, quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_of_positions() {
        let bbox = BoundingBox::containing([
            Vector::new([1.0, -2.0]),
            Vector::new([-3.0, 4.0]),
            Vector::new([0.0, 0.0]),
        ]);

        assert_eq!(bbox.min, Vector::new([-3.0, -2.0]));
        assert_eq!(bbox.max, Vector::new([1.0, 4.0]));
        assert!(!bbox.is_empty());
        assert!(BoundingBox::<2>::default().is_empty());
    }

    #[test]
    fn enclosing_region_is_a_cube_with_margin() {
        let bbox = BoundingBox::new(Vector::new([0.0, 0.0]), Vector::new([4.0, 1.0]));
        let region = Region::enclosing(&bbox);

        assert_eq!(region.center, Vector::new([2.0, 0.5]));
        assert!(region.half > 2.0);
        assert!(region.contains(&bbox.min) && region.contains(&bbox.max));
        assert!(region.orthant(&bbox.max) != region.orthant(&bbox.min));
    }

    #[test]
    fn enclosing_region_of_a_point_has_a_size() {
        let point = Vector::new([5.0, 5.0, 5.0]);
        let region = Region::enclosing(&BoundingBox::containing([point]));

        assert_eq!(region.center, point);
        assert!(region.half > 0.0);
    }

    #[test]
    fn orthants_and_children_agree() {
        let region = Region::new(Vector::new([0.0, 0.0, 0.0]), 2.0);

        assert_eq!(Region::<3>::ORTHANTS, 8);
        for orthant in 0..Region::<3>::ORTHANTS {
            let child = region.child(orthant);
            assert_eq!(child.half, 1.0);
            assert_eq!(region.orthant(&child.center), orthant);
            assert!(region.contains(&child.min()) && region.contains(&child.max()));
        }

        assert_eq!(region.orthant(&Vector::new([1.0, -1.0, 1.0])), 0b101);
        // Positions on the center plane go to the lower side.
        assert_eq!(region.orthant(&Vector::new([0.0, 0.0, 0.0])), 0);
    }

    #[test]
    fn clamp_into_region() {
        let region = Region::new(Vector::new([0.0, 0.0]), 1.0);
        assert_eq!(
            region.clamp(Vector::new([3.0, -0.5])),
            Vector::new([1.0, -0.5])
        );
    }
}
