//! Renders measurement labels of the store's visible features.
//!
//! Every store event recomputes the annotations of all visible features plus the custom features
//! registered with [`MeasureLayer::set_feature`] and replaces the label source wholesale.

use crate::{
	config::MeasureConfig,
	ids::IdGenerator,
	store::{HandlerId, SharedStore, StoreEventKind},
	surface::{LayerKind, LayerSpec, SharedSurface, empty_collection, hide_all_filter, surface_mut, visibility},
};
use anyhow::{Result, bail};
use geodraw_geometry::{GeoFeature, Geometry, math::is_clockwise, projection::Projector};
use geodraw_measure::{
	Annotation, AnnotationKind, LabelFormatter, annotations_to_json, cal,
	units::{AreaSetting, LengthSetting, Unit},
};
use serde_json::{Value, json};
use std::{cell::RefCell, rc::Rc};

/// Ids of the measurement layers; `source` and `direction_source` are source ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasureLayers {
	pub source: String,
	pub point: String,
	pub line: String,
	pub line_segment: String,
	pub polygon: String,
	pub polygon_line: String,
	pub polygon_line_segment: String,
	pub direction_source: String,
	pub direction: String,
}

impl MeasureLayers {
	fn new(ids: &dyn IdGenerator) -> Self {
		Self {
			source: ids.next_id(),
			point: ids.next_id(),
			line: ids.next_id(),
			line_segment: ids.next_id(),
			polygon: ids.next_id(),
			polygon_line: ids.next_id(),
			polygon_line_segment: ids.next_id(),
			direction_source: ids.next_id(),
			direction: ids.next_id(),
		}
	}

	fn label_layers(&self) -> Vec<String> {
		vec![
			self.point.clone(),
			self.line.clone(),
			self.line_segment.clone(),
			self.polygon.clone(),
			self.polygon_line.clone(),
			self.polygon_line_segment.clone(),
			self.direction.clone(),
		]
	}
}

fn label_layer(id: &str, source: &str, size: u32, color: &str, filter: Value) -> LayerSpec {
	LayerSpec::new(id, LayerKind::Symbol)
		.with_source(source)
		.with_layout("text-field", json!(["get", "value"]))
		.with_layout("text-size", size)
		.with_layout("text-offset", json!([0, -1]))
		.with_paint("text-color", color)
		.with_paint("text-halo-color", "#fff")
		.with_paint("text-halo-width", 2)
		.with_filter(filter)
}

/// Matches labels of `kind` at segment centers or at vertices. Hidden labels match nothing.
fn kind_filter(kind: AnnotationKind, center: bool, show: bool) -> Value {
	if !show {
		return hide_all_filter();
	}
	let has = if center { "has" } else { "!has" };
	json!(["all", ["==", "type", kind.as_str()], [has, "center"]])
}

fn direction_field(right: &str, left: &str) -> Value {
	json!(["case", ["get", "clockwise"], right, left])
}

struct Settings {
	formatter: LabelFormatter,
	projector: Rc<dyn Projector>,
	show_polygon_direction: bool,
	custom: Vec<GeoFeature>,
}

struct MeasureState {
	store: SharedStore,
	surface: SharedSurface,
	layers: MeasureLayers,
	settings: RefCell<Settings>,
}

impl MeasureState {
	fn measured_features(&self) -> Vec<GeoFeature> {
		let mut features = self.store.fc().features;
		features.extend(self.settings.borrow().custom.iter().cloned());
		features
	}

	fn annotations(&self) -> Result<Vec<Annotation>> {
		let options = {
			let settings = self.settings.borrow();
			settings.formatter.measure_options_with(settings.projector.clone())
		};
		cal(&self.measured_features(), &options)
	}

	/// Polygons with the winding of their outer ring as `clockwise` property.
	fn directions(&self) -> Value {
		let features = self
			.measured_features()
			.into_iter()
			.filter_map(|feature| {
				let Geometry::Polygon(polygon) = &feature.geometry else {
					return None;
				};
				let clockwise = is_clockwise(polygon.outer()?);
				Some(json!({
					"type": "Feature",
					"geometry": feature.geometry.to_json(),
					"properties": { "id": feature.id, "clockwise": clockwise },
				}))
			})
			.collect::<Vec<_>>();
		json!({ "type": "FeatureCollection", "features": features })
	}

	fn render(&self) -> Result<()> {
		let labels = annotations_to_json(&self.annotations()?);
		let directions = if self.settings.borrow().show_polygon_direction {
			self.directions()
		} else {
			empty_collection()
		};
		let mut surface = surface_mut(&self.surface)?;
		surface.set_source_data(&self.layers.source, labels)?;
		surface.set_source_data(&self.layers.direction_source, directions)
	}
}

/// Measurement labels for a [`SharedStore`].
pub struct MeasureLayer {
	state: Rc<MeasureState>,
	handlers: Vec<HandlerId>,
}

impl MeasureLayer {
	/// Adds the label sources and layers and starts following the store.
	pub fn new(store: &SharedStore, config: &MeasureConfig, ids: &dyn IdGenerator) -> Result<Self> {
		let layers = MeasureLayers::new(ids);
		let surface = store.surface();
		{
			let mut surface = surface_mut(&surface)?;
			surface.add_source(&layers.source, empty_collection())?;
			surface.add_source(&layers.direction_source, empty_collection())?;
			surface.add_layer(label_layer(
				&layers.point,
				&layers.source,
				14,
				"#000",
				json!(["==", "type", "point"]),
			))?;
			surface.add_layer(label_layer(
				&layers.line,
				&layers.source,
				14,
				"#000",
				kind_filter(AnnotationKind::Line, false, true),
			))?;
			surface.add_layer(label_layer(
				&layers.line_segment,
				&layers.source,
				12,
				"#ff0000",
				kind_filter(AnnotationKind::Line, true, config.show_line_segments),
			))?;
			surface.add_layer(label_layer(
				&layers.polygon,
				&layers.source,
				18,
				"#000",
				json!(["==", "type", "polygon"]),
			))?;
			surface.add_layer(label_layer(
				&layers.polygon_line,
				&layers.source,
				14,
				"#000",
				kind_filter(AnnotationKind::PolygonLine, false, config.show_polygon_lines),
			))?;
			surface.add_layer(label_layer(
				&layers.polygon_line_segment,
				&layers.source,
				12,
				"#ff0000",
				kind_filter(AnnotationKind::PolygonLine, true, config.show_polygon_line_segments),
			))?;
			surface.add_layer(
				LayerSpec::new(&layers.direction, LayerKind::Symbol)
					.with_source(&layers.direction_source)
					.with_layout("symbol-placement", "line")
					.with_layout("text-field", direction_field("▶", "◀"))
					.with_layout("text-size", 14)
					.with_paint("text-color", "#3887be")
					.with_paint("text-halo-color", "#fff")
					.with_paint("text-halo-width", 1),
			)?;
		}

		let state = Rc::new(MeasureState {
			store: store.clone(),
			surface,
			layers,
			settings: RefCell::new(Settings {
				formatter: config.formatter(),
				projector: config.projector()?,
				show_polygon_direction: config.show_polygon_direction,
				custom: Vec::new(),
			}),
		});

		let on_clear = Rc::downgrade(&state);
		let on_change = Rc::downgrade(&state);
		let handlers = vec![
			store.on(StoreEventKind::Clear, move |_| {
				if let Some(state) = on_clear.upgrade() {
					state.settings.borrow_mut().custom.clear();
				}
			}),
			store.on(StoreEventKind::All, move |event| {
				let Some(state) = on_change.upgrade() else {
					return;
				};
				if let Err(err) = state.render() {
					log::warn!("failed to render measurements after {:?}: {err:#}", event.kind);
				}
			}),
		];

		state.render()?;
		Ok(Self { state, handlers })
	}

	pub fn layers(&self) -> &MeasureLayers {
		&self.state.layers
	}

	/// Recomputes and uploads all labels.
	pub fn render(&self) -> Result<()> {
		self.state.render()
	}

	/// Current annotations of the store's visible features and the custom features.
	pub fn annotations(&self) -> Result<Vec<Annotation>> {
		self.state.annotations()
	}

	pub fn formatter(&self) -> LabelFormatter {
		self.state.settings.borrow().formatter.clone()
	}

	pub fn set_units(&self, length: LengthSetting, area: AreaSetting) -> Result<()> {
		{
			let mut settings = self.state.settings.borrow_mut();
			settings.formatter.length_unit = length;
			settings.formatter.area_unit = area;
		}
		self.render()
	}

	/// Sets the number of decimals used for labels in `unit`.
	pub fn set_precision(&self, unit: Unit, precision: usize) -> Result<()> {
		{
			let mut settings = self.state.settings.borrow_mut();
			match unit {
				Unit::Length(unit) => settings.formatter.precisions.set_length(unit, precision),
				Unit::Area(unit) => settings.formatter.precisions.set_area(unit, precision),
				Unit::Angle(_) => bail!("labels have no precision for {} units", unit.kind()),
			}
		}
		self.render()
	}

	/// Measures features that are not part of the store. Known ids are replaced.
	pub fn set_feature(&self, features: Vec<GeoFeature>) -> Result<()> {
		{
			let mut settings = self.state.settings.borrow_mut();
			for feature in features {
				match settings.custom.iter_mut().find(|f| f.id == feature.id) {
					Some(existing) => *existing = feature,
					None => settings.custom.push(feature),
				}
			}
		}
		self.render()
	}

	/// Removes features from the custom set and from the store.
	pub fn remove_feature<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
		self
			.state
			.settings
			.borrow_mut()
			.custom
			.retain(|f| !ids.iter().any(|id| id.as_ref() == f.id));
		for id in ids {
			self.state.store.delete_by_id(id.as_ref())?;
		}
		self.render()
	}

	pub fn show_line_segment(&self, show: bool) -> Result<()> {
		self.set_filter(&self.state.layers.line_segment, kind_filter(AnnotationKind::Line, true, show))
	}

	/// Toggles the cumulative length labels on polygon rings.
	pub fn show_polygon_line(&self, show: bool) -> Result<()> {
		self.set_filter(
			&self.state.layers.polygon_line,
			kind_filter(AnnotationKind::PolygonLine, false, show),
		)
	}

	pub fn show_polygon_line_segment(&self, show: bool) -> Result<()> {
		self.set_filter(
			&self.state.layers.polygon_line_segment,
			kind_filter(AnnotationKind::PolygonLine, true, show),
		)
	}

	fn set_filter(&self, layer: &str, filter: Value) -> Result<()> {
		surface_mut(&self.state.surface)?.set_filter(layer, Some(filter))
	}

	pub fn show_polygon_direction(&self, show: bool) -> Result<()> {
		self.state.settings.borrow_mut().show_polygon_direction = show;
		self.render()
	}

	pub fn set_direction_symbol(&self, right: &str, left: &str) -> Result<()> {
		surface_mut(&self.state.surface)?.set_layout_property(
			&self.state.layers.direction,
			"text-field",
			direction_field(right, left),
		)
	}

	pub fn set_visible(&self, visible: bool) -> Result<()> {
		let mut surface = surface_mut(&self.state.surface)?;
		for layer in self.state.layers.label_layers() {
			surface.set_layout_property(&layer, "visibility", visibility(visible))?;
		}
		Ok(())
	}
}

impl Drop for MeasureLayer {
	fn drop(&mut self) {
		for handler in self.handlers.drain(..) {
			self.state.store.off(handler);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		ids::SequentialIds,
		memory::MemorySurface,
		store::SyncStrategy,
		surface::RenderSurface,
	};
	use geodraw_geometry::projection::Planar;
	use geodraw_measure::units::{AngleUnit, LengthUnit};
	use pretty_assertions::assert_eq;

	struct Fixture {
		memory: Rc<RefCell<MemorySurface>>,
		store: SharedStore,
		layer: MeasureLayer,
	}

	impl Fixture {
		fn new(config: MeasureConfig) -> Self {
			let memory = MemorySurface::new().shared();
			let surface: SharedSurface = memory.clone();
			let store = SharedStore::new(&surface, "store", SyncStrategy::Incremental).unwrap();
			let layer = MeasureLayer::new(&store, &config, &SequentialIds::new("m")).unwrap();
			// planar math keeps label values readable
			layer.state.settings.borrow_mut().projector = Rc::new(Planar);
			Self { memory, store, layer }
		}

		fn labels(&self) -> Vec<(String, String)> {
			self
				.memory
				.borrow()
				.source_features(&self.layer.layers().source)
				.iter()
				.map(|f| {
					(
						f["properties"]["type"].as_str().unwrap().to_string(),
						f["properties"]["value"].as_str().unwrap().to_string(),
					)
				})
				.collect()
		}

		fn directions(&self) -> Vec<Value> {
			self.memory.borrow().source_features(&self.layer.layers().direction_source)
		}
	}

	fn line(id: &str) -> GeoFeature {
		GeoFeature::new(id, Geometry::new_line_string(vec![[0.0, 0.0], [3.0, 4.0]]))
	}

	fn square(id: &str, clockwise: bool) -> GeoFeature {
		let mut ring = vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]];
		if clockwise {
			ring.reverse();
		}
		GeoFeature::new(id, Geometry::new_polygon(vec![ring]))
	}

	#[test]
	fn follows_store_changes() -> Result<()> {
		let f = Fixture::new(MeasureConfig::default());
		assert!(f.labels().is_empty());

		f.store.create(vec![line("a")])?;
		assert_eq!(
			f.labels(),
			vec![
				("line".to_string(), "0.0 m".to_string()),
				("line".to_string(), "5.0 m".to_string()),
				("line".to_string(), "5.0 m".to_string()),
			]
		);

		f.store.set_hidden(&["a"])?;
		assert!(f.labels().is_empty());
		f.store.clear_hidden(&["a"])?;
		assert_eq!(f.labels().len(), 3);
		f.store.delete_by_id("a")?;
		assert!(f.labels().is_empty());
		Ok(())
	}

	#[test]
	fn annotations_carry_parent_ids() -> Result<()> {
		let f = Fixture::new(MeasureConfig::default());
		f.store.create(vec![line("a"), square("b", false)])?;
		let annotations = f.layer.annotations()?;
		assert_eq!(annotations.first().and_then(|a| a.parent_id.clone()).as_deref(), Some("a"));
		assert_eq!(annotations.last().and_then(|a| a.parent_id.clone()).as_deref(), Some("b"));
		assert_eq!(annotations.last().map(|a| a.value.as_str()), Some("4.00 m²"));
		Ok(())
	}

	#[test]
	fn custom_features_are_measured_until_cleared() -> Result<()> {
		let f = Fixture::new(MeasureConfig::default());
		f.layer.set_feature(vec![line("custom")])?;
		assert_eq!(f.labels().len(), 3);
		assert!(f.store.fc().is_empty());

		f.layer.set_feature(vec![GeoFeature::new("custom", Geometry::new_point([1.0, 2.0]))])?;
		assert_eq!(f.labels(), vec![("point".to_string(), "1.000000,2.000000".to_string())]);

		f.store.clear()?;
		assert!(f.labels().is_empty());
		Ok(())
	}

	#[test]
	fn remove_feature_drops_custom_and_stored() -> Result<()> {
		let f = Fixture::new(MeasureConfig::default());
		f.store.create(vec![line("a")])?;
		f.layer.set_feature(vec![line("b")])?;
		f.layer.remove_feature(&["a", "b"])?;
		assert!(f.labels().is_empty());
		assert!(f.store.query("a").is_none());
		Ok(())
	}

	#[test]
	fn units_and_precision() -> Result<()> {
		let f = Fixture::new(MeasureConfig::default());
		f.store.create(vec![GeoFeature::new(
			"a",
			Geometry::new_line_string(vec![[0.0, 0.0], [1500.0, 0.0]]),
		)])?;
		assert_eq!(f.labels()[1].1, "1.50 km");

		f.layer.set_units(LengthSetting::Meter, AreaSetting::Auto)?;
		assert_eq!(f.labels()[1].1, "1500.0 m");

		f.layer.set_precision(Unit::Length(LengthUnit::Meter), 0)?;
		assert_eq!(f.labels()[1].1, "1500 m");
		assert_eq!(f.layer.formatter().precisions.length(LengthUnit::Meter), 0);

		assert!(f.layer.set_precision(Unit::Angle(AngleUnit::Degree), 2).is_err());
		Ok(())
	}

	#[test]
	fn polygon_direction() -> Result<()> {
		let f = Fixture::new(MeasureConfig {
			show_polygon_direction: true,
			..MeasureConfig::default()
		});
		f.store.create(vec![square("ccw", false), square("cw", true), line("l")])?;
		let directions = f.directions();
		assert_eq!(directions.len(), 2);
		assert_eq!(directions[0]["properties"], json!({"id": "ccw", "clockwise": false}));
		assert_eq!(directions[1]["properties"], json!({"id": "cw", "clockwise": true}));

		f.layer.show_polygon_direction(false)?;
		assert!(f.directions().is_empty());

		f.layer.set_direction_symbol(">", "<")?;
		assert_eq!(
			f.memory.borrow().layout_property(&f.layer.layers().direction, "text-field"),
			Some(json!(["case", ["get", "clockwise"], ">", "<"]))
		);
		Ok(())
	}

	#[test]
	fn segment_labels_toggle_with_a_filter() -> Result<()> {
		let f = Fixture::new(MeasureConfig {
			show_line_segments: false,
			..MeasureConfig::default()
		});
		let segment = f.layer.layers().line_segment.clone();
		assert_eq!(f.memory.borrow().filter(&segment), Some(hide_all_filter()));
		f.layer.show_line_segment(true)?;
		assert_eq!(
			f.memory.borrow().filter(&segment),
			Some(json!(["all", ["==", "type", "line"], ["has", "center"]]))
		);
		Ok(())
	}

	#[test]
	fn polygon_ring_labels_toggle_with_filters() -> Result<()> {
		let f = Fixture::new(MeasureConfig {
			show_polygon_line_segments: false,
			..MeasureConfig::default()
		});
		f.store.create(vec![square("a", false)])?;
		let labels = f.labels();
		assert_eq!(labels.iter().filter(|(kind, _)| kind == "polygon-line").count(), 9);
		assert_eq!(labels.last(), Some(&("polygon".to_string(), "4.00 m²".to_string())));

		let layers = f.layer.layers().clone();
		let ring = json!(["all", ["==", "type", "polygon-line"], ["!has", "center"]]);
		let ring_segment = json!(["all", ["==", "type", "polygon-line"], ["has", "center"]]);
		assert_eq!(f.memory.borrow().filter(&layers.polygon_line), Some(ring.clone()));
		assert_eq!(f.memory.borrow().filter(&layers.polygon_line_segment), Some(hide_all_filter()));

		f.layer.show_polygon_line(false)?;
		f.layer.show_polygon_line_segment(true)?;
		assert_eq!(f.memory.borrow().filter(&layers.polygon_line), Some(hide_all_filter()));
		assert_eq!(f.memory.borrow().filter(&layers.polygon_line_segment), Some(ring_segment));

		f.layer.show_polygon_line(true)?;
		assert_eq!(f.memory.borrow().filter(&layers.polygon_line), Some(ring));
		// line labels are unaffected
		assert_eq!(
			f.memory.borrow().filter(&layers.line),
			Some(json!(["all", ["==", "type", "line"], ["!has", "center"]]))
		);
		Ok(())
	}

	#[test]
	fn visibility_applies_to_every_label_layer() -> Result<()> {
		let f = Fixture::new(MeasureConfig::default());
		f.layer.set_visible(false)?;
		for layer in f.layer.layers().label_layers() {
			assert_eq!(f.memory.borrow().layout_property(&layer, "visibility"), Some(json!("none")));
		}
		Ok(())
	}

	#[test]
	fn dropping_detaches_from_the_store() -> Result<()> {
		let f = Fixture::new(MeasureConfig::default());
		let source = f.layer.layers().source.clone();
		drop(f.layer);
		f.store.create(vec![line("a")])?;
		assert!(f.memory.borrow().source_features(&source).is_empty());
		Ok(())
	}
}
