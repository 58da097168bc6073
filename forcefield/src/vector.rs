use std::{
    iter::Sum,
    ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign},
};

/// Fixed-size vector of `N` real coordinates.
///
/// Storage is a plain `[f64; N]`, so every operation is a loop over a known length that the
/// compiler can unroll. There is one instantiation per dimension used by the caller.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector<const N: usize>(pub [f64; N]);

impl<const N: usize> Vector<N> {
    /// The zero vector.
    pub const ZERO: Self = Self([0.0; N]);

    /// Creates a new [`Vector`] from the given coordinates.
    #[inline]
    pub const fn new(coordinates: [f64; N]) -> Self {
        Self(coordinates)
    }

    /// Creates a [`Vector`] with all coordinates set to `value`.
    #[inline]
    pub const fn splat(value: f64) -> Self {
        Self([value; N])
    }

    /// Returns the coordinates as an array.
    #[inline]
    pub const fn to_array(self) -> [f64; N] {
        self.0
    }

    /// Dot product of `self` and `rhs`.
    #[inline]
    pub fn dot(self, rhs: Self) -> f64 {
        let mut result = 0.0;
        for i in 0..N {
            result += self.0[i] * rhs.0[i];
        }
        result
    }

    /// Squared euclidean norm.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm.
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns `true` if no coordinate is `NaN` or infinite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Returns the vector rescaled so that its length does not exceed `max`, keeping its direction.
    ///
    /// Lengths beyond the range of `f64` are handled: the norm is computed on the vector divided
    /// by its largest coordinate, and infinite coordinates alone give the direction.
    pub fn clamp_length_max(self, max: f64) -> Self {
        let direction = if self.0.iter().any(|c| c.is_infinite()) {
            self.map(|c| if c.is_infinite() { c.signum() } else { 0.0 })
        } else {
            self
        };

        let largest = direction.0.iter().fold(0.0, |m: f64, c| m.max(c.abs()));
        if largest == 0.0 {
            return direction;
        }

        let scaled = direction / largest;
        let norm = scaled.length();
        if largest * norm > max {
            scaled * (max / norm)
        } else {
            direction
        }
    }

    /// Applies `f` to every coordinate.
    #[inline]
    pub fn map(self, f: impl FnMut(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }

    /// Combines the coordinates of `self` and `rhs` pairwise with `f`.
    #[inline]
    pub fn zip_map(self, rhs: Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        Self(std::array::from_fn(|i| f(self.0[i], rhs.0[i])))
    }
}

impl<const N: usize> Default for Vector<N> {
    #[inline]
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const N: usize> From<[f64; N]> for Vector<N> {
    #[inline]
    fn from(coordinates: [f64; N]) -> Self {
        Self(coordinates)
    }
}

impl<const N: usize> From<Vector<N>> for [f64; N] {
    #[inline]
    fn from(vector: Vector<N>) -> Self {
        vector.0
    }
}

impl<const N: usize> Index<usize> for Vector<N> {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl<const N: usize> IndexMut<usize> for Vector<N> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }
}

impl<const N: usize> Neg for Vector<N> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.map(Neg::neg)
    }
}

macro_rules! impl_vector_ops {
    ($($trait: ident, $method: ident, $assign_trait: ident, $assign_method: ident, $op: tt;)*) => {$(
        impl<const N: usize> $trait for Vector<N> {
            type Output = Self;

            #[inline]
            fn $method(self, rhs: Self) -> Self {
                self.zip_map(rhs, |a, b| a $op b)
            }
        }

        impl<const N: usize> $assign_trait for Vector<N> {
            #[inline]
            fn $assign_method(&mut self, rhs: Self) {
                *self = *self $op rhs;
            }
        }
    )*};
}

impl_vector_ops! {
    Add, add, AddAssign, add_assign, +;
    Sub, sub, SubAssign, sub_assign, -;
}

macro_rules! impl_scalar_ops {
    ($($trait: ident, $method: ident, $assign_trait: ident, $assign_method: ident, $op: tt;)*) => {$(
        impl<const N: usize> $trait<f64> for Vector<N> {
            type Output = Self;

            #[inline]
            fn $method(self, rhs: f64) -> Self {
                self.map(|c| c $op rhs)
            }
        }

        impl<const N: usize> $assign_trait<f64> for Vector<N> {
            #[inline]
            fn $assign_method(&mut self, rhs: f64) {
                *self = *self $op rhs;
            }
        }
    )*};
}

impl_scalar_ops! {
    Mul, mul, MulAssign, mul_assign, *;
    Div, div, DivAssign, div_assign, /;
}

impl<const N: usize> Mul<Vector<N>> for f64 {
    type Output = Vector<N>;

    #[inline]
    fn mul(self, rhs: Vector<N>) -> Vector<N> {
        rhs * self
    }
}

impl<const N: usize> Sum for Vector<N> {
    #[inline]
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a, const N: usize> Sum<&'a Vector<N>> for Vector<N> {
    #[inline]
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(feature = "glam")]
mod glam_impls {
    use super::Vector;

    macro_rules! impl_glam {
        ($($dim: literal => $v: ty),*) => {$(
            impl From<$v> for Vector<$dim> {
                #[inline]
                fn from(vector: $v) -> Self {
                    Self(vector.into())
                }
            }

            impl From<Vector<$dim>> for $v {
                #[inline]
                fn from(vector: Vector<$dim>) -> Self {
                    <$v>::from(vector.0)
                }
            }
        )*};
    }

    impl_glam!(2 => glam::DVec2, 3 => glam::DVec3, 4 => glam::DVec4);
}
