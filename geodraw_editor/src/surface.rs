//! The render-surface capability consumed by the editor.
//!
//! A [`RenderSurface`] is whatever draws the map: it owns sources and layers, paint and layout
//! state, the camera and the cursor, and it delivers pointer, keyboard and lifecycle events to
//! registered listeners. Everything in this crate talks to the map only through this trait.
//!
//! Surfaces are shared as [`SharedSurface`]. Listeners are invoked through [`dispatch`], which
//! releases the surface borrow before calling them, so a listener may freely mutate the surface
//! (add layers, register or remove listeners, update sources).

use anyhow::{Result, anyhow};
use geodraw_geometry::Coordinates;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::{
	cell::{RefCell, RefMut},
	fmt::Debug,
	rc::Rc,
	time::Duration,
};

pub type SharedSurface = Rc<RefCell<dyn RenderSurface>>;
pub type Listener = Rc<dyn Fn(&MapEvent)>;

/// Unique identifier of a registered surface listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
	Escape,
	Backspace,
	Other(String),
}

impl Key {
	/// Parses a key name as reported by browsers, case-insensitive.
	pub fn parse(name: &str) -> Key {
		match name.to_lowercase().as_str() {
			"escape" | "esc" => Key::Escape,
			"backspace" => Key::Backspace,
			_ => Key::Other(name.to_string()),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapEventKind {
	Click,
	DoubleClick,
	MouseMove,
	ContextMenu,
	KeyDown,
	MoveEnd,
	ZoomEnd,
	PitchEnd,
	RotateEnd,
	StyleLoad,
	SelectionChange,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
	Click(Coordinates),
	DoubleClick(Coordinates),
	MouseMove(Coordinates),
	/// Right click.
	ContextMenu(Coordinates),
	KeyDown(Key),
	MoveEnd,
	ZoomEnd,
	PitchEnd,
	RotateEnd,
	StyleLoad,
	/// Ids of the features selected in the vertex widget.
	SelectionChange(Vec<String>),
}

impl MapEvent {
	pub fn kind(&self) -> MapEventKind {
		match self {
			MapEvent::Click(_) => MapEventKind::Click,
			MapEvent::DoubleClick(_) => MapEventKind::DoubleClick,
			MapEvent::MouseMove(_) => MapEventKind::MouseMove,
			MapEvent::ContextMenu(_) => MapEventKind::ContextMenu,
			MapEvent::KeyDown(_) => MapEventKind::KeyDown,
			MapEvent::MoveEnd => MapEventKind::MoveEnd,
			MapEvent::ZoomEnd => MapEventKind::ZoomEnd,
			MapEvent::PitchEnd => MapEventKind::PitchEnd,
			MapEvent::RotateEnd => MapEventKind::RotateEnd,
			MapEvent::StyleLoad => MapEventKind::StyleLoad,
			MapEvent::SelectionChange(_) => MapEventKind::SelectionChange,
		}
	}

	/// The pointer position of mouse events.
	pub fn position(&self) -> Option<Coordinates> {
		match self {
			MapEvent::Click(p) | MapEvent::DoubleClick(p) | MapEvent::MouseMove(p) | MapEvent::ContextMenu(p) => Some(*p),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub center: Coordinates,
	pub zoom: f64,
	pub bearing: f64,
	pub pitch: f64,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			center: Coordinates::new(0.0, 0.0),
			zoom: 0.0,
			bearing: 0.0,
			pitch: 0.0,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
	Circle,
	Fill,
	Line,
	Symbol,
}

/// A style layer as handed to the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: LayerKind,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub paint: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub layout: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub filter: Option<Value>,
}

impl LayerSpec {
	pub fn new(id: &str, kind: LayerKind) -> Self {
		Self {
			id: id.to_string(),
			kind,
			source: None,
			paint: Map::new(),
			layout: Map::new(),
			filter: None,
		}
	}

	pub fn with_source(mut self, source: &str) -> Self {
		self.source = Some(source.to_string());
		self
	}

	pub fn with_paint(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.paint.insert(key.to_string(), value.into());
		self
	}

	pub fn with_layout(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.layout.insert(key.to_string(), value.into());
		self
	}

	pub fn with_filter(mut self, filter: Value) -> Self {
		self.filter = Some(filter);
		self
	}
}

/// Incremental change of a GeoJSON source. Features are GeoJSON values carrying an `id`.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceDiff {
	Add(Vec<Value>),
	Update(Vec<Value>),
	Remove(Vec<String>),
	RemoveAll,
}

pub trait RenderSurface {
	fn add_source(&mut self, id: &str, data: Value) -> Result<()>;
	fn remove_source(&mut self, id: &str) -> Result<()>;
	fn has_source(&self, id: &str) -> bool;
	fn source_data(&self, id: &str) -> Option<Value>;
	/// Replaces the whole content of a GeoJSON source.
	fn set_source_data(&mut self, id: &str, data: Value) -> Result<()>;
	fn update_source_data(&mut self, id: &str, diff: SourceDiff) -> Result<()>;

	fn add_layer(&mut self, layer: LayerSpec) -> Result<()>;
	fn remove_layer(&mut self, id: &str) -> Result<()>;
	fn has_layer(&self, id: &str) -> bool;
	/// Layers in drawing order.
	fn layers(&self) -> Vec<LayerSpec>;

	fn paint_property(&self, layer: &str, name: &str) -> Option<Value>;
	fn set_paint_property(&mut self, layer: &str, name: &str, value: Value) -> Result<()>;
	fn layout_property(&self, layer: &str, name: &str) -> Option<Value>;
	fn set_layout_property(&mut self, layer: &str, name: &str, value: Value) -> Result<()>;
	fn filter(&self, layer: &str) -> Option<Value>;
	fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<()>;

	fn on(&mut self, kind: MapEventKind, listener: Listener) -> ListenerId;
	/// Returns `false` if the listener was not registered.
	fn off(&mut self, id: ListenerId) -> bool;
	/// Listeners of one kind, in registration order.
	fn listeners(&self, kind: MapEventKind) -> Vec<Listener>;

	fn camera(&self) -> Camera;
	fn set_camera(&mut self, camera: Camera);
	/// Animated camera transition; `None` uses the surface's default duration.
	fn ease_to(&mut self, camera: Camera, duration: Option<Duration>);

	fn set_cursor(&mut self, cursor: &str);
	fn cursor(&self) -> String;

	/// Switches the base style. The surface fires [`MapEvent::StyleLoad`] once it is ready,
	/// after which only the new style's layers and sources exist.
	fn set_style(&mut self, style: &str) -> Result<()>;
}

impl Debug for dyn RenderSurface {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderSurface")
			.field("layers", &self.layers().len())
			.field("cursor", &self.cursor())
			.finish()
	}
}

/// Calls every listener registered for the event's kind and returns how many were called.
pub fn dispatch(surface: &SharedSurface, event: &MapEvent) -> usize {
	let listeners = surface.borrow().listeners(event.kind());
	for listener in &listeners {
		listener(event);
	}
	listeners.len()
}

pub(crate) fn surface_mut(surface: &SharedSurface) -> Result<RefMut<'_, dyn RenderSurface + 'static>> {
	surface.try_borrow_mut().map_err(|_| anyhow!("render surface is busy"))
}

pub fn empty_collection() -> Value {
	json!({"type": "FeatureCollection", "features": []})
}

/// Filter expression that matches nothing, used to hide a layer's features.
pub fn hide_all_filter() -> Value {
	json!(["==", "1", "0"])
}

pub fn visibility(visible: bool) -> Value {
	Value::from(if visible { "visible" } else { "none" })
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[rstest]
	#[case("Escape", Key::Escape)]
	#[case("ESC", Key::Escape)]
	#[case("backspace", Key::Backspace)]
	#[case("Enter", Key::Other("Enter".to_string()))]
	fn parse_keys(#[case] name: &str, #[case] key: Key) {
		assert_eq!(Key::parse(name), key);
	}

	#[test]
	fn event_kind_and_position() {
		let event = MapEvent::ContextMenu(Coordinates::new(1.0, 2.0));
		assert_eq!(event.kind(), MapEventKind::ContextMenu);
		assert_eq!(event.position(), Some(Coordinates::new(1.0, 2.0)));
		assert_eq!(MapEvent::StyleLoad.position(), None);
	}

	#[test]
	fn layer_spec_json() {
		let layer = LayerSpec::new("l1", LayerKind::Circle)
			.with_source("s1")
			.with_paint("circle-radius", 5)
			.with_filter(json!(["==", "$type", "Point"]));
		assert_eq!(
			serde_json::to_value(&layer).unwrap(),
			json!({
				"id": "l1",
				"type": "circle",
				"source": "s1",
				"paint": {"circle-radius": 5},
				"filter": ["==", "$type", "Point"]
			})
		);
		let parsed: LayerSpec = serde_json::from_value(json!({"id": "l2", "type": "fill"})).unwrap();
		assert_eq!(parsed, LayerSpec::new("l2", LayerKind::Fill));
	}
}
