/// Implements list-style `Debug` and construction from nested vectors and arrays for a geometry
/// that wraps a `Vec` of parts, e.g. a ring of positions or a polygon of rings.
macro_rules! geometry_parts {
	($($geometry:ty => $part:ty),* $(,)?) => {$(
		impl std::fmt::Debug for $geometry {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				f.debug_list().entries(&self.0).finish()
			}
		}

		impl<T> From<Vec<T>> for $geometry
		where
			$part: From<T>,
		{
			fn from(parts: Vec<T>) -> Self {
				Self(parts.into_iter().map(<$part>::from).collect())
			}
		}

		impl<'a, T, const N: usize> From<&'a [T; N]> for $geometry
		where
			$part: From<&'a T>,
		{
			fn from(parts: &'a [T; N]) -> Self {
				Self(parts.iter().map(<$part>::from).collect())
			}
		}
	)*};
}

pub(super) use geometry_parts;
