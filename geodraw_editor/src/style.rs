//! Keeping layer styles in sync with the render surface.
//!
//! * [`LayerProxy`] holds a layer's paint and layout properties and pushes only the keys that
//!   changed.
//! * [`ProxiedSurface`] wraps a surface and records every layer added through it, so that a
//!   [`LayerProxy`] can be handed out for any of them.
//! * [`StyleProxy`] carries custom layers and their sources across a switch of the base style.

use crate::surface::{
	Camera, LayerSpec, Listener, ListenerId, MapEvent, MapEventKind, RenderSurface, SharedSurface, SourceDiff,
	surface_mut,
};
use anyhow::{Result, bail};
use serde_json::{Map, Value, json};
use std::{
	cell::RefCell,
	collections::{BTreeMap, HashSet},
	rc::{Rc, Weak},
	time::Duration,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Group {
	Paint,
	Layout,
}

/// Pushes every key of `new` that differs from `old`, and `null` for keys that disappeared.
fn push_changes(
	surface: &SharedSurface,
	layer: &str,
	group: Group,
	old: &Map<String, Value>,
	new: &Map<String, Value>,
) -> Result<usize> {
	let changes = new
		.iter()
		.filter(|(key, value)| old.get(*key) != Some(*value))
		.map(|(key, value)| (key.clone(), value.clone()))
		.chain(
			old.keys()
				.filter(|key| !new.contains_key(*key))
				.map(|key| (key.clone(), Value::Null)),
		)
		.collect::<Vec<_>>();

	let mut surface = surface_mut(surface)?;
	for (key, value) in &changes {
		match group {
			Group::Paint => surface.set_paint_property(layer, key, value.clone())?,
			Group::Layout => surface.set_layout_property(layer, key, value.clone())?,
		}
	}
	Ok(changes.len())
}

/// Paint and layout properties of one layer.
pub struct LayerProxy {
	surface: SharedSurface,
	id: String,
	paint: Map<String, Value>,
	layout: Map<String, Value>,
}

impl LayerProxy {
	pub fn new(surface: &SharedSurface, layer: &LayerSpec) -> Self {
		Self {
			surface: surface.clone(),
			id: layer.id.clone(),
			paint: layer.paint.clone(),
			layout: layer.layout.clone(),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn paint(&self) -> &Map<String, Value> {
		&self.paint
	}

	pub fn layout(&self) -> &Map<String, Value> {
		&self.layout
	}

	/// Edits both property maps and pushes the differences. Returns the number of pushed keys.
	pub fn update(&mut self, edit: impl FnOnce(&mut Map<String, Value>, &mut Map<String, Value>)) -> Result<usize> {
		let mut paint = self.paint.clone();
		let mut layout = self.layout.clone();
		edit(&mut paint, &mut layout);
		self.commit(paint, layout)
	}

	/// Replaces both property maps, pushing the differences.
	pub fn commit(&mut self, paint: Map<String, Value>, layout: Map<String, Value>) -> Result<usize> {
		let count = push_changes(&self.surface, &self.id, Group::Paint, &self.paint, &paint)?
			+ push_changes(&self.surface, &self.id, Group::Layout, &self.layout, &layout)?;
		self.paint = paint;
		self.layout = layout;
		if count > 0 {
			log::trace!("pushed {count} style changes of layer '{}'", self.id);
		}
		Ok(count)
	}

	/// Sets one paint property. Returns `false` if the value was already set.
	pub fn set_paint(&mut self, key: &str, value: impl Into<Value>) -> Result<bool> {
		let value = value.into();
		Ok(self.update(|paint, _| set_or_remove(paint, key, value))? > 0)
	}

	/// Sets one layout property. Returns `false` if the value was already set.
	pub fn set_layout(&mut self, key: &str, value: impl Into<Value>) -> Result<bool> {
		let value = value.into();
		Ok(self.update(|_, layout| set_or_remove(layout, key, value))? > 0)
	}

	/// Current properties as `{"paint": ..., "layout": ...}`.
	pub fn value(&self) -> Value {
		json!({ "paint": self.paint, "layout": self.layout })
	}
}

fn set_or_remove(map: &mut Map<String, Value>, key: &str, value: Value) {
	if value.is_null() {
		map.remove(key);
	} else {
		map.insert(key.to_string(), value);
	}
}

impl std::fmt::Debug for LayerProxy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LayerProxy")
			.field("id", &self.id)
			.field("paint", &self.paint)
			.field("layout", &self.layout)
			.finish()
	}
}

/// Surface decorator that remembers the specs of layers added through it.
pub struct ProxiedSurface {
	inner: SharedSurface,
	layers: BTreeMap<String, LayerSpec>,
}

impl ProxiedSurface {
	pub fn new(inner: &SharedSurface) -> Self {
		Self {
			inner: inner.clone(),
			layers: BTreeMap::new(),
		}
	}

	pub fn shared(self) -> Rc<RefCell<ProxiedSurface>> {
		Rc::new(RefCell::new(self))
	}

	/// A proxy for a layer added through this surface. Its pushes go through the decorator,
	/// so the recorded spec stays current.
	pub fn layer_proxy(this: &Rc<RefCell<ProxiedSurface>>, id: &str) -> Option<LayerProxy> {
		let spec = this.borrow().layers.get(id).cloned()?;
		let surface: SharedSurface = this.clone();
		Some(LayerProxy::new(&surface, &spec))
	}

	pub fn proxied_layers(&self) -> Vec<String> {
		self.layers.keys().cloned().collect()
	}
}

impl RenderSurface for ProxiedSurface {
	fn add_source(&mut self, id: &str, data: Value) -> Result<()> {
		surface_mut(&self.inner)?.add_source(id, data)
	}

	fn remove_source(&mut self, id: &str) -> Result<()> {
		surface_mut(&self.inner)?.remove_source(id)
	}

	fn has_source(&self, id: &str) -> bool {
		self.inner.borrow().has_source(id)
	}

	fn source_data(&self, id: &str) -> Option<Value> {
		self.inner.borrow().source_data(id)
	}

	fn set_source_data(&mut self, id: &str, data: Value) -> Result<()> {
		surface_mut(&self.inner)?.set_source_data(id, data)
	}

	fn update_source_data(&mut self, id: &str, diff: SourceDiff) -> Result<()> {
		surface_mut(&self.inner)?.update_source_data(id, diff)
	}

	fn add_layer(&mut self, layer: LayerSpec) -> Result<()> {
		surface_mut(&self.inner)?.add_layer(layer.clone())?;
		self.layers.insert(layer.id.clone(), layer);
		Ok(())
	}

	fn remove_layer(&mut self, id: &str) -> Result<()> {
		surface_mut(&self.inner)?.remove_layer(id)?;
		self.layers.remove(id);
		Ok(())
	}

	fn has_layer(&self, id: &str) -> bool {
		self.inner.borrow().has_layer(id)
	}

	fn layers(&self) -> Vec<LayerSpec> {
		self.inner.borrow().layers()
	}

	fn paint_property(&self, layer: &str, name: &str) -> Option<Value> {
		self.inner.borrow().paint_property(layer, name)
	}

	fn set_paint_property(&mut self, layer: &str, name: &str, value: Value) -> Result<()> {
		surface_mut(&self.inner)?.set_paint_property(layer, name, value.clone())?;
		if let Some(spec) = self.layers.get_mut(layer) {
			set_or_remove(&mut spec.paint, name, value);
		}
		Ok(())
	}

	fn layout_property(&self, layer: &str, name: &str) -> Option<Value> {
		self.inner.borrow().layout_property(layer, name)
	}

	fn set_layout_property(&mut self, layer: &str, name: &str, value: Value) -> Result<()> {
		surface_mut(&self.inner)?.set_layout_property(layer, name, value.clone())?;
		if let Some(spec) = self.layers.get_mut(layer) {
			set_or_remove(&mut spec.layout, name, value);
		}
		Ok(())
	}

	fn filter(&self, layer: &str) -> Option<Value> {
		self.inner.borrow().filter(layer)
	}

	fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<()> {
		surface_mut(&self.inner)?.set_filter(layer, filter.clone())?;
		if let Some(spec) = self.layers.get_mut(layer) {
			spec.filter = filter;
		}
		Ok(())
	}

	fn on(&mut self, kind: MapEventKind, listener: Listener) -> ListenerId {
		self.inner.borrow_mut().on(kind, listener)
	}

	fn off(&mut self, id: ListenerId) -> bool {
		self.inner.borrow_mut().off(id)
	}

	fn listeners(&self, kind: MapEventKind) -> Vec<Listener> {
		self.inner.borrow().listeners(kind)
	}

	fn camera(&self) -> Camera {
		self.inner.borrow().camera()
	}

	fn set_camera(&mut self, camera: Camera) {
		self.inner.borrow_mut().set_camera(camera);
	}

	fn ease_to(&mut self, camera: Camera, duration: Option<Duration>) {
		self.inner.borrow_mut().ease_to(camera, duration);
	}

	fn set_cursor(&mut self, cursor: &str) {
		self.inner.borrow_mut().set_cursor(cursor);
	}

	fn cursor(&self) -> String {
		self.inner.borrow().cursor()
	}

	fn set_style(&mut self, style: &str) -> Result<()> {
		surface_mut(&self.inner)?.set_style(style)?;
		self.layers.clear();
		Ok(())
	}
}

struct Replay {
	sources: Vec<(String, Value)>,
	layers: Vec<LayerSpec>,
}

struct StyleState {
	surface: SharedSurface,
	base_layers: RefCell<HashSet<String>>,
	replay: RefCell<Option<Replay>>,
}

impl StyleState {
	fn cache_base_layers(&self) {
		let ids = self.surface.borrow().layers().into_iter().map(|l| l.id).collect();
		*self.base_layers.borrow_mut() = ids;
	}

	fn custom_layers(&self) -> Vec<LayerSpec> {
		let base = self.base_layers.borrow();
		self
			.surface
			.borrow()
			.layers()
			.into_iter()
			.filter(|layer| !base.contains(&layer.id))
			.collect()
	}

	fn on_style_load(&self) -> Result<()> {
		self.cache_base_layers();
		let Some(replay) = self.replay.borrow_mut().take() else {
			return Ok(());
		};
		let mut surface = surface_mut(&self.surface)?;
		for (id, data) in replay.sources {
			if !surface.has_source(&id) {
				surface.add_source(&id, data)?;
			}
		}
		let count = replay.layers.len();
		for layer in replay.layers {
			if !surface.has_layer(&layer.id) {
				surface.add_layer(layer)?;
			}
		}
		log::debug!("restored {count} custom layers after style load");
		Ok(())
	}
}

/// Keeps custom layers and their sources alive across [`StyleProxy::set_style`].
///
/// Layers present when the proxy is created, or after a style load, count as the base style.
/// Everything added later is custom.
pub struct StyleProxy {
	state: Rc<StyleState>,
	listener: ListenerId,
}

impl StyleProxy {
	pub fn new(surface: &SharedSurface) -> Result<Self> {
		let state = Rc::new(StyleState {
			surface: surface.clone(),
			base_layers: RefCell::new(HashSet::new()),
			replay: RefCell::new(None),
		});
		state.cache_base_layers();

		let weak: Weak<StyleState> = Rc::downgrade(&state);
		let listener = surface_mut(surface)?.on(
			MapEventKind::StyleLoad,
			Rc::new(move |event: &MapEvent| {
				let (MapEvent::StyleLoad, Some(state)) = (event, weak.upgrade()) else {
					return;
				};
				if let Err(err) = state.on_style_load() {
					log::warn!("failed to restore custom layers: {err:#}");
				}
			}),
		);
		Ok(Self { state, listener })
	}

	/// Layers that are not part of the base style.
	pub fn custom_layers(&self) -> Vec<LayerSpec> {
		self.state.custom_layers()
	}

	/// Switches the base style. Custom layers and their sources are captured now and restored
	/// when the surface reports the style load.
	pub fn set_style(&self, style: &str) -> Result<()> {
		let layers = self.state.custom_layers();
		let mut sources: Vec<(String, Value)> = Vec::new();
		{
			let surface = self.state.surface.borrow();
			for source in layers.iter().filter_map(|l| l.source.as_deref()) {
				if sources.iter().any(|(id, _)| id == source) {
					continue;
				}
				let Some(data) = surface.source_data(source) else {
					bail!("source '{source}' of a custom layer does not exist");
				};
				sources.push((source.to_string(), data));
			}
		}
		log::debug!("switching to style '{style}' with {} custom layers", layers.len());
		surface_mut(&self.state.surface)?.set_style(style)?;
		*self.state.replay.borrow_mut() = Some(Replay { sources, layers });
		Ok(())
	}
}

impl Drop for StyleProxy {
	fn drop(&mut self) {
		if let Ok(mut surface) = self.state.surface.try_borrow_mut() {
			surface.off(self.listener);
		}
	}
}
