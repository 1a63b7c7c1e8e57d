// Geometry primitives: `PointGeometry`, `LineStringGeometry`, `RingGeometry`, `PolygonGeometry`
// and their multi counterparts. All of them implement `GeometryTrait`.

mod coordinates;
mod linestring;
mod macros;
mod multi;
mod point;
mod polygon;
mod ring;
mod traits;

pub use coordinates::*;
pub use linestring::*;
pub use multi::*;
pub use point::*;
pub use polygon::*;
pub use ring::*;
pub use traits::*;

macros::geometry_parts!(
	LineStringGeometry => Coordinates,
	RingGeometry => Coordinates,
	PolygonGeometry => RingGeometry,
	MultiPointGeometry => PointGeometry,
	MultiLineStringGeometry => LineStringGeometry,
	MultiPolygonGeometry => PolygonGeometry,
);
