//! Headless implementations of the external collaborators: an in-memory render surface and an
//! in-memory vertex widget. The CLI replays sessions against them and the tests use them as
//! doubles for a real map engine.

use crate::{
	surface::{Camera, LayerSpec, Listener, ListenerId, MapEventKind, RenderSurface, SourceDiff},
	vertex::{VertexGuards, VertexWidget, WidgetMode},
};
use anyhow::{Context, Result, bail, ensure};
use geodraw_geometry::{Coordinates, GeoFeature, Geometry};
use serde_json::{Map, Value};
use std::{cell::RefCell, collections::BTreeMap, fmt::Debug, rc::Rc, time::Duration};

/// Layers and sources of a named base style.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSpec {
	pub sources: Vec<(String, Value)>,
	pub layers: Vec<LayerSpec>,
}

impl StyleSpec {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_source(mut self, id: &str, data: Value) -> Self {
		self.sources.push((id.to_string(), data));
		self
	}

	pub fn with_layer(mut self, layer: LayerSpec) -> Self {
		self.layers.push(layer);
		self
	}
}

/// Counts how sources were written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceStats {
	pub replacements: usize,
	pub diffs: usize,
}

#[derive(Default)]
pub struct MemorySurface {
	sources: BTreeMap<String, Value>,
	layers: Vec<LayerSpec>,
	listeners: Vec<(ListenerId, MapEventKind, Listener)>,
	next_listener: usize,
	camera: Camera,
	last_transition: Option<Option<Duration>>,
	cursor: String,
	style: Option<String>,
	styles: BTreeMap<String, StyleSpec>,
	stats: SurfaceStats,
}

impl MemorySurface {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn shared(self) -> Rc<RefCell<MemorySurface>> {
		Rc::new(RefCell::new(self))
	}

	pub fn register_style(&mut self, name: &str, style: StyleSpec) {
		self.styles.insert(name.to_string(), style);
	}

	pub fn style_name(&self) -> Option<&str> {
		self.style.as_deref()
	}

	pub fn listener_count(&self, kind: MapEventKind) -> usize {
		self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
	}

	pub fn total_listeners(&self) -> usize {
		self.listeners.len()
	}

	pub fn stats(&self) -> SurfaceStats {
		self.stats
	}

	/// The last `ease_to` duration, if a transition happened.
	pub fn last_transition(&self) -> Option<Option<Duration>> {
		self.last_transition
	}

	/// Features of a GeoJSON source; empty for unknown sources.
	pub fn source_features(&self, id: &str) -> Vec<Value> {
		self.sources
			.get(id)
			.and_then(|data| data.get("features"))
			.and_then(Value::as_array)
			.cloned()
			.unwrap_or_default()
	}

	fn layer_mut(&mut self, id: &str) -> Result<&mut LayerSpec> {
		self.layers
			.iter_mut()
			.find(|l| l.id == id)
			.with_context(|| format!("layer '{id}' does not exist"))
	}

	fn layer(&self, id: &str) -> Option<&LayerSpec> {
		self.layers.iter().find(|l| l.id == id)
	}

	fn features_mut(&mut self, id: &str) -> Result<&mut Vec<Value>> {
		let data = self
			.sources
			.get_mut(id)
			.with_context(|| format!("source '{id}' does not exist"))?;
		data
			.get_mut("features")
			.and_then(Value::as_array_mut)
			.with_context(|| format!("source '{id}' is not a feature collection"))
	}
}

fn feature_id(feature: &Value) -> Option<&str> {
	feature.get("id").and_then(Value::as_str)
}

fn set_property(map: &mut Map<String, Value>, name: &str, value: Value) {
	if value.is_null() {
		map.remove(name);
	} else {
		map.insert(name.to_string(), value);
	}
}

impl RenderSurface for MemorySurface {
	fn add_source(&mut self, id: &str, data: Value) -> Result<()> {
		ensure!(!self.sources.contains_key(id), "source '{id}' already exists");
		self.sources.insert(id.to_string(), data);
		Ok(())
	}

	fn remove_source(&mut self, id: &str) -> Result<()> {
		if let Some(layer) = self.layers.iter().find(|l| l.source.as_deref() == Some(id)) {
			bail!("source '{id}' is used by layer '{}'", layer.id);
		}
		self.sources
			.remove(id)
			.map(|_| ())
			.with_context(|| format!("source '{id}' does not exist"))
	}

	fn has_source(&self, id: &str) -> bool {
		self.sources.contains_key(id)
	}

	fn source_data(&self, id: &str) -> Option<Value> {
		self.sources.get(id).cloned()
	}

	fn set_source_data(&mut self, id: &str, data: Value) -> Result<()> {
		let source = self
			.sources
			.get_mut(id)
			.with_context(|| format!("source '{id}' does not exist"))?;
		*source = data;
		self.stats.replacements += 1;
		Ok(())
	}

	fn update_source_data(&mut self, id: &str, diff: SourceDiff) -> Result<()> {
		let features = self.features_mut(id)?;
		match diff {
			SourceDiff::Add(added) | SourceDiff::Update(added) => {
				for feature in added {
					match features.iter_mut().find(|f| feature_id(f) == feature_id(&feature)) {
						Some(existing) => *existing = feature,
						None => features.push(feature),
					}
				}
			}
			SourceDiff::Remove(ids) => features.retain(|f| !ids.iter().any(|id| feature_id(f) == Some(id))),
			SourceDiff::RemoveAll => features.clear(),
		}
		self.stats.diffs += 1;
		Ok(())
	}

	fn add_layer(&mut self, layer: LayerSpec) -> Result<()> {
		ensure!(!self.has_layer(&layer.id), "layer '{}' already exists", layer.id);
		if let Some(source) = &layer.source {
			ensure!(self.has_source(source), "source '{source}' does not exist");
		}
		self.layers.push(layer);
		Ok(())
	}

	fn remove_layer(&mut self, id: &str) -> Result<()> {
		let index = self
			.layers
			.iter()
			.position(|l| l.id == id)
			.with_context(|| format!("layer '{id}' does not exist"))?;
		self.layers.remove(index);
		Ok(())
	}

	fn has_layer(&self, id: &str) -> bool {
		self.layer(id).is_some()
	}

	fn layers(&self) -> Vec<LayerSpec> {
		self.layers.clone()
	}

	fn paint_property(&self, layer: &str, name: &str) -> Option<Value> {
		self.layer(layer)?.paint.get(name).cloned()
	}

	fn set_paint_property(&mut self, layer: &str, name: &str, value: Value) -> Result<()> {
		set_property(&mut self.layer_mut(layer)?.paint, name, value);
		Ok(())
	}

	fn layout_property(&self, layer: &str, name: &str) -> Option<Value> {
		self.layer(layer)?.layout.get(name).cloned()
	}

	fn set_layout_property(&mut self, layer: &str, name: &str, value: Value) -> Result<()> {
		set_property(&mut self.layer_mut(layer)?.layout, name, value);
		Ok(())
	}

	fn filter(&self, layer: &str) -> Option<Value> {
		self.layer(layer)?.filter.clone()
	}

	fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<()> {
		self.layer_mut(layer)?.filter = filter;
		Ok(())
	}

	fn on(&mut self, kind: MapEventKind, listener: Listener) -> ListenerId {
		let id = ListenerId(self.next_listener);
		self.next_listener += 1;
		self.listeners.push((id, kind, listener));
		id
	}

	fn off(&mut self, id: ListenerId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(i, _, _)| *i != id);
		self.listeners.len() != before
	}

	fn listeners(&self, kind: MapEventKind) -> Vec<Listener> {
		self.listeners
			.iter()
			.filter(|(_, k, _)| *k == kind)
			.map(|(_, _, l)| l.clone())
			.collect()
	}

	fn camera(&self) -> Camera {
		self.camera
	}

	fn set_camera(&mut self, camera: Camera) {
		self.camera = camera;
	}

	fn ease_to(&mut self, camera: Camera, duration: Option<Duration>) {
		self.camera = camera;
		self.last_transition = Some(duration);
	}

	fn set_cursor(&mut self, cursor: &str) {
		self.cursor = cursor.to_string();
	}

	fn cursor(&self) -> String {
		self.cursor.clone()
	}

	fn set_style(&mut self, style: &str) -> Result<()> {
		let spec = self
			.styles
			.get(style)
			.cloned()
			.with_context(|| format!("unknown style '{style}'"))?;
		self.sources = spec.sources.into_iter().collect();
		self.layers = spec.layers;
		self.style = Some(style.to_string());
		Ok(())
	}
}

impl Debug for MemorySurface {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemorySurface")
			.field("sources", &self.sources.keys().collect::<Vec<_>>())
			.field("layers", &self.layers.iter().map(|l| &l.id).collect::<Vec<_>>())
			.field("listeners", &self.listeners.len())
			.field("style", &self.style)
			.finish()
	}
}

/// In-memory direct-manipulation widget. Edits are simulated with [`MemoryWidget::select_vertex`],
/// [`MemoryWidget::move_selected`], [`MemoryWidget::delete_selected`] and
/// [`MemoryWidget::move_feature`]; each honours the installed [`VertexGuards`].
#[derive(Debug, Default)]
pub struct MemoryWidget {
	feature: Option<GeoFeature>,
	mode: Option<WidgetMode>,
	selected: Option<usize>,
	guards: Option<VertexGuards>,
}

impl MemoryWidget {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn shared(self) -> Rc<RefCell<MemoryWidget>> {
		Rc::new(RefCell::new(self))
	}

	pub fn mode(&self) -> Option<WidgetMode> {
		self.mode
	}

	pub fn loaded(&self) -> Option<&GeoFeature> {
		self.feature.as_ref()
	}

	pub fn select_vertex(&mut self, index: usize) -> bool {
		let count = self.feature.as_ref().map_or(0, |f| editable_vertices(&f.geometry).len());
		if index < count {
			self.selected = Some(index);
			true
		} else {
			false
		}
	}

	/// Drags the selected vertex. Returns `false` when nothing changed.
	pub fn move_selected(&mut self, to: Coordinates) -> bool {
		let Some(index) = self.selected else {
			return false;
		};
		let Some(feature) = self.feature.as_mut() else {
			return false;
		};
		match &mut feature.geometry {
			Geometry::LineString(line) => line.0[index] = to,
			Geometry::Polygon(polygon) => {
				let Some(ring) = polygon.outer_mut() else {
					return false;
				};
				let last = ring.0.len() - 1;
				ring.0[index] = to;
				if index == 0 && last > 0 {
					ring.0[last] = to;
				}
			}
			_ => return false,
		}
		true
	}

	/// Drags the whole feature; only allowed while a vertex is selected.
	pub fn move_feature(&mut self, dx: f64, dy: f64) -> bool {
		let selected = usize::from(self.selected.is_some());
		if !self.guards.unwrap_or_default().allow_drag(selected) {
			return false;
		}
		let Some(feature) = self.feature.as_mut() else {
			return false;
		};
		feature.geometry = translate(&feature.geometry, dx, dy);
		true
	}

	/// Deletes the selected vertex unless the guards forbid it.
	pub fn delete_selected(&mut self) -> bool {
		let (Some(index), Some(feature)) = (self.selected, self.feature.as_mut()) else {
			return false;
		};
		if !self.guards.unwrap_or_default().allow_vertex_delete(&feature.geometry) {
			return false;
		}
		match &mut feature.geometry {
			Geometry::LineString(line) => {
				line.0.remove(index);
			}
			Geometry::Polygon(polygon) => {
				let Some(ring) = polygon.outer_mut() else {
					return false;
				};
				let mut open = ring.open_vertices().to_vec();
				open.remove(index);
				ring.0 = open;
				ring.close();
			}
			_ => return false,
		}
		self.selected = None;
		true
	}
}

fn editable_vertices(geometry: &Geometry) -> Vec<Coordinates> {
	match geometry {
		Geometry::LineString(line) => line.0.clone(),
		Geometry::Polygon(polygon) => polygon.outer().map(|r| r.open_vertices().to_vec()).unwrap_or_default(),
		_ => Vec::new(),
	}
}

fn translate(geometry: &Geometry, dx: f64, dy: f64) -> Geometry {
	let shift = |c: &Coordinates| Coordinates::new(c.x() + dx, c.y() + dy);
	match geometry {
		Geometry::Point(p) => Geometry::new_point(shift(p.as_coord())),
		Geometry::LineString(line) => Geometry::new_line_string(line.0.iter().map(shift).collect::<Vec<Coordinates>>()),
		Geometry::Polygon(polygon) => Geometry::new_polygon(
			polygon
				.0
				.iter()
				.map(|r| r.0.iter().map(shift).collect::<Vec<Coordinates>>())
				.collect(),
		),
		other => other.clone(),
	}
}

impl VertexWidget for MemoryWidget {
	fn install_guards(&mut self, guards: VertexGuards) {
		self.guards = Some(guards);
	}

	fn load(&mut self, feature: GeoFeature, mode: WidgetMode) {
		self.feature = Some(feature);
		self.mode = Some(mode);
		self.selected = None;
	}

	fn get(&self, id: &str) -> Option<GeoFeature> {
		self.feature.as_ref().filter(|f| f.id == id).cloned()
	}

	fn clear(&mut self) {
		self.feature = None;
		self.mode = None;
		self.selected = None;
	}
}
