use super::Projector;
use crate::Coordinates;
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ellipsoid {
	Grs80,
	Wgs84,
}

impl Ellipsoid {
	#[must_use]
	pub fn semi_major_axis(&self) -> f64 {
		6_378_137.0
	}

	#[must_use]
	pub fn flattening(&self) -> f64 {
		match self {
			Ellipsoid::Grs80 => 1.0 / 298.257_222_101,
			Ellipsoid::Wgs84 => 1.0 / 298.257_223_563,
		}
	}
}

/// Transverse Mercator projection evaluated with the Krüger series (third order in n).
///
/// Input is `[lng, lat]` in degrees, output `[easting, northing]` in meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransverseMercator {
	pub ellipsoid: Ellipsoid,
	pub lat_0: f64,
	pub lon_0: f64,
	pub k_0: f64,
	pub x_0: f64,
	pub y_0: f64,
}

impl Default for TransverseMercator {
	fn default() -> Self {
		Self {
			ellipsoid: Ellipsoid::Grs80,
			lat_0: 0.0,
			lon_0: 0.0,
			k_0: 1.0,
			x_0: 500_000.0,
			y_0: 0.0,
		}
	}
}

impl TransverseMercator {
	#[must_use]
	pub fn with_central_meridian(lon_0: f64) -> Self {
		Self {
			lon_0,
			..Self::default()
		}
	}

	#[must_use]
	pub fn forward(&self, position: &Coordinates) -> Coordinates {
		let (xi, eta) = self.conformal(position.y(), position.x() - self.lon_0);
		let (xi_0, _) = self.conformal(self.lat_0, 0.0);
		let scale = self.k_0 * self.rectifying_radius();
		Coordinates::new(self.x_0 + scale * eta, self.y_0 + scale * (xi - xi_0))
	}

	fn rectifying_radius(&self) -> f64 {
		let n = self.third_flattening();
		self.ellipsoid.semi_major_axis() / (1.0 + n) * (1.0 + n.powi(2) / 4.0 + n.powi(4) / 64.0)
	}

	fn third_flattening(&self) -> f64 {
		let f = self.ellipsoid.flattening();
		f / (2.0 - f)
	}

	/// Returns the series-corrected `(ξ, η)` for a latitude and a longitude offset, both in degrees.
	fn conformal(&self, lat: f64, delta_lon: f64) -> (f64, f64) {
		let n = self.third_flattening();
		let alpha = [
			n / 2.0 - 2.0 / 3.0 * n.powi(2) + 5.0 / 16.0 * n.powi(3),
			13.0 / 48.0 * n.powi(2) - 3.0 / 5.0 * n.powi(3),
			61.0 / 240.0 * n.powi(3),
		];
		let f = self.ellipsoid.flattening();
		let e = (f * (2.0 - f)).sqrt();

		let phi = lat * PI / 180.0;
		let lambda = delta_lon * PI / 180.0;

		let t = (phi.sin().atanh() - e * (e * phi.sin()).atanh()).sinh();
		let xi_prime = t.atan2(lambda.cos());
		let eta_prime = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

		let mut xi = xi_prime;
		let mut eta = eta_prime;
		for (j, a) in alpha.iter().enumerate() {
			#[allow(clippy::cast_precision_loss)]
			let k = 2.0 * (j + 1) as f64;
			xi += a * (k * xi_prime).sin() * (k * eta_prime).cosh();
			eta += a * (k * xi_prime).cos() * (k * eta_prime).sinh();
		}
		(xi, eta)
	}
}

impl Projector for TransverseMercator {
	fn project_ring(&self, ring: &[Coordinates]) -> Vec<Coordinates> {
		ring.iter().map(|c| self.forward(c)).collect()
	}
}

/// The default measuring projection: a GRS80 transverse Mercator whose central meridian is
/// the minimum longitude of the ring being projected, so each ring is measured close to its
/// own meridian.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CenteredTransverseMercator;

impl Projector for CenteredTransverseMercator {
	fn project_ring(&self, ring: &[Coordinates]) -> Vec<Coordinates> {
		let lon_0 = ring.iter().map(Coordinates::x).fold(f64::MAX, f64::min);
		TransverseMercator::with_central_meridian(lon_0).project_ring(ring)
	}
}
