//! Interactive drawing of points, lines and polygons.
//!
//! A [`DrawManager`] turns pointer and keyboard events of the render surface into mutations of
//! a [`SharedStore`]. One drawing session runs at a time:
//!
//! * **Point**: every click creates a finished point.
//! * **LineString / Polygon**: the first click creates a feature with one vertex and arms the
//!   mouse-move and right-click listeners. Further clicks commit vertices; the cursor position
//!   is shown as a trailing preview vertex. Right click or Backspace removes the last committed
//!   vertex; with only the first vertex left the feature is deleted. A double click finishes
//!   the feature, deleting it if it has fewer than 2 (line) or 3 (polygon) distinct vertices.
//!   Polygon rings are closed as soon as they have 3 positions; while they have exactly 2, an
//!   overlay line previews the open edge after a short debounce.
//! * Escape drops the feature in progress.

use crate::{
	config::DrawConfig,
	ids::{IdGenerator, UuidGenerator},
	store::SharedStore,
	surface::{Key, LayerKind, LayerSpec, Listener, ListenerId, MapEvent, MapEventKind, SharedSurface, empty_collection, surface_mut},
};
use anyhow::{Error, Result, bail};
use geodraw_geometry::{Coordinates, GeoFeature, Geometry};
use itertools::Itertools;
use serde_json::{Value, json};
use std::{
	cell::{Cell, RefCell},
	fmt::{Debug, Display},
	rc::Rc,
	str::FromStr,
	time::{Duration, Instant},
};

/// Monotonic time source.
pub trait Clock: Debug {
	/// Time elapsed since an arbitrary, fixed origin.
	fn now(&self) -> Duration;
}

#[derive(Debug)]
pub struct SystemClock {
	origin: Instant,
}

impl Default for SystemClock {
	fn default() -> Self {
		Self { origin: Instant::now() }
	}
}

impl Clock for SystemClock {
	fn now(&self) -> Duration {
		self.origin.elapsed()
	}
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
	now: Cell<Duration>,
}

impl ManualClock {
	pub fn advance(&self, by: Duration) {
		self.now.set(self.now.get() + by);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Duration {
		self.now.get()
	}
}

/// Holds the most recently scheduled value until `delay` has passed without a newer one.
#[derive(Debug)]
pub struct Debounce<T> {
	delay: Duration,
	pending: Option<(Duration, T)>,
}

impl<T> Debounce<T> {
	pub fn new(delay: Duration) -> Self {
		Self { delay, pending: None }
	}

	pub fn schedule(&mut self, now: Duration, value: T) {
		self.pending = Some((now + self.delay, value));
	}

	/// Returns `true` if a value was pending.
	pub fn cancel(&mut self) -> bool {
		self.pending.take().is_some()
	}

	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Takes the pending value once it is due.
	pub fn poll(&mut self, now: Duration) -> Option<T> {
		match &self.pending {
			Some((due, _)) if *due <= now => self.pending.take().map(|(_, value)| value),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
	Point,
	LineString,
	Polygon,
}

impl Display for DrawMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			DrawMode::Point => "Point",
			DrawMode::LineString => "LineString",
			DrawMode::Polygon => "Polygon",
		})
	}
}

impl FromStr for DrawMode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s.to_lowercase().as_str() {
			"point" => DrawMode::Point,
			"line" | "linestring" => DrawMode::LineString,
			"polygon" => DrawMode::Polygon,
			_ => bail!("unknown draw mode '{s}'"),
		})
	}
}

#[derive(Clone, Debug)]
pub struct DrawOptions {
	/// Stop after the first finished feature.
	pub once: bool,
	pub preview_debounce: Duration,
	pub color: String,
	pub ids: Rc<dyn IdGenerator>,
	pub clock: Rc<dyn Clock>,
}

impl Default for DrawOptions {
	fn default() -> Self {
		DrawOptions::from(&DrawConfig::default())
	}
}

impl From<&DrawConfig> for DrawOptions {
	fn from(config: &DrawConfig) -> Self {
		Self {
			once: config.once,
			preview_debounce: config.preview_debounce(),
			color: config.color.clone(),
			ids: Rc::new(UuidGenerator::default()),
			clock: Rc::new(SystemClock::default()),
		}
	}
}

/// Ids of the layers a [`DrawManager`] adds. `overlay` is also the id of its own source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawLayers {
	pub point: String,
	pub point_symbol: String,
	pub line: String,
	pub line_vertex: String,
	pub polygon: String,
	pub polygon_vertex: String,
	pub polygon_outline: String,
	pub overlay: String,
}

impl DrawLayers {
	fn new(ids: &dyn IdGenerator) -> Self {
		Self {
			point: ids.next_id(),
			point_symbol: ids.next_id(),
			line: ids.next_id(),
			line_vertex: ids.next_id(),
			polygon: ids.next_id(),
			polygon_vertex: ids.next_id(),
			polygon_outline: ids.next_id(),
			overlay: ids.next_id(),
		}
	}

	fn store_layers(&self, color: &str) -> Vec<LayerSpec> {
		let vertex = |id: &str, geometry_type: &str| {
			LayerSpec::new(id, LayerKind::Circle)
				.with_paint("circle-color", color)
				.with_paint("circle-radius", 5)
				.with_paint("circle-stroke-color", "#fff")
				.with_paint("circle-stroke-width", 2)
				.with_filter(json!(["==", "$type", geometry_type]))
		};
		let line = |id: &str, geometry_type: &str| {
			LayerSpec::new(id, LayerKind::Line)
				.with_paint("line-color", color)
				.with_paint("line-width", 2)
				.with_filter(json!(["==", "$type", geometry_type]))
		};
		vec![
			vertex(&self.point, "Point"),
			LayerSpec::new(&self.point_symbol, LayerKind::Symbol).with_filter(json!(["==", "$type", "Point"])),
			line(&self.line, "LineString"),
			vertex(&self.line_vertex, "LineString"),
			LayerSpec::new(&self.polygon, LayerKind::Fill)
				.with_paint("fill-color", color)
				.with_paint("fill-opacity", 0.2)
				.with_filter(json!(["==", "$type", "Polygon"])),
			vertex(&self.polygon_vertex, "Polygon"),
			line(&self.polygon_outline, "Polygon"),
		]
	}
}

struct Session {
	mode: DrawMode,
	/// Listeners installed for the whole session.
	listeners: Vec<ListenerId>,
	/// Listeners installed while a feature is in progress.
	armed: Vec<ListenerId>,
	feature_id: Option<String>,
	vertices: Vec<Coordinates>,
	preview: Option<Coordinates>,
}

impl Session {
	fn positions(&self) -> Vec<Coordinates> {
		let mut positions = self.vertices.clone();
		positions.extend(self.preview);
		positions
	}
}

/// Line for `LineString` mode, single-ring polygon otherwise; rings are closed from 3 positions.
fn shape(mode: DrawMode, mut positions: Vec<Coordinates>) -> Geometry {
	if mode != DrawMode::Polygon {
		return Geometry::new_line_string(positions);
	}
	if positions.len() >= 3 {
		positions.push(positions[0]);
	}
	Geometry::new_polygon(vec![positions])
}

struct DrawState {
	store: SharedStore,
	surface: SharedSurface,
	options: DrawOptions,
	layers: DrawLayers,
	on_drawed: RefCell<Option<Rc<dyn Fn(&GeoFeature)>>>,
	session: RefCell<Option<Session>>,
	overlay: RefCell<Debounce<Value>>,
}

impl DrawState {
	fn mode(&self) -> Option<DrawMode> {
		self.session.borrow().as_ref().map(|s| s.mode)
	}

	fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
		self.session.borrow_mut().as_mut().map(f)
	}

	fn listen(self: &Rc<Self>, kind: MapEventKind) -> Result<ListenerId> {
		let state = Rc::downgrade(self);
		let listener: Listener = Rc::new(move |event: &MapEvent| {
			if let Some(state) = state.upgrade() {
				state.handle(event);
			}
		});
		Ok(surface_mut(&self.surface)?.on(kind, listener))
	}

	fn handle(self: &Rc<Self>, event: &MapEvent) {
		let result = self.flush_overlay().and_then(|_| match event {
			MapEvent::Click(position) => self.on_click(*position),
			MapEvent::DoubleClick(_) => self.on_double_click(),
			MapEvent::MouseMove(position) => self.on_mouse_move(*position),
			MapEvent::ContextMenu(position) => self.on_undo(Some(*position)),
			MapEvent::KeyDown(Key::Escape) => self.abort(),
			MapEvent::KeyDown(Key::Backspace) => self.on_undo(None),
			_ => Ok(()),
		});
		if let Err(err) = result {
			log::warn!("drawing failed: {err:#}");
		}
	}

	fn start(self: &Rc<Self>, mode: DrawMode) -> Result<()> {
		self.stop()?;
		let mut listeners = vec![self.listen(MapEventKind::Click)?, self.listen(MapEventKind::KeyDown)?];
		if mode != DrawMode::Point {
			listeners.push(self.listen(MapEventKind::DoubleClick)?);
		}
		surface_mut(&self.surface)?.set_cursor("crosshair");
		*self.session.borrow_mut() = Some(Session {
			mode,
			listeners,
			armed: Vec::new(),
			feature_id: None,
			vertices: Vec::new(),
			preview: None,
		});
		log::debug!("drawing {mode} started");
		Ok(())
	}

	fn stop(&self) -> Result<()> {
		let Some(session) = self.session.borrow_mut().take() else {
			return Ok(());
		};
		{
			let mut surface = surface_mut(&self.surface)?;
			for id in session.listeners.iter().chain(&session.armed) {
				surface.off(*id);
			}
			surface.set_cursor("");
		}
		self.clear_overlay()?;
		if let Some(id) = &session.feature_id {
			self.store.delete_by_id(id)?;
		}
		log::debug!("drawing {} stopped", session.mode);
		Ok(())
	}

	fn clear(&self) -> Result<()> {
		self.reset_active()?;
		self.store.clear()?;
		self.clear_overlay()
	}

	/// Forgets the feature in progress and disarms its listeners. Returns its id.
	fn reset_active(&self) -> Result<Option<String>> {
		let Some((id, armed)) = self.with_session(|s| {
			s.vertices.clear();
			s.preview = None;
			(s.feature_id.take(), std::mem::take(&mut s.armed))
		}) else {
			return Ok(None);
		};
		let mut surface = surface_mut(&self.surface)?;
		for listener in armed {
			surface.off(listener);
		}
		Ok(id)
	}

	/// The id of the feature in progress, provided it is still in the store.
	fn active_id(&self) -> Result<Option<String>> {
		let Some(id) = self.session.borrow().as_ref().and_then(|s| s.feature_id.clone()) else {
			return Ok(None);
		};
		if self.store.query(&id).is_some() {
			return Ok(Some(id));
		}
		log::debug!("feature '{id}' left the store while being drawn");
		self.reset_active()?;
		Ok(None)
	}

	fn on_click(self: &Rc<Self>, position: Coordinates) -> Result<()> {
		let Some(mode) = self.mode() else {
			return Ok(());
		};

		if mode == DrawMode::Point {
			let feature = GeoFeature::new(self.options.ids.next_id(), Geometry::new_point(position));
			self.store.create(vec![feature.clone()])?;
			return self.finished(&feature);
		}

		if let Some(id) = self.active_id()? {
			self.with_session(|s| {
				s.vertices.push(position);
				s.preview = Some(position);
			});
			return self.push_geometry(&id);
		}

		let id = self.options.ids.next_id();
		let armed = vec![
			self.listen(MapEventKind::MouseMove)?,
			self.listen(MapEventKind::ContextMenu)?,
		];
		self.with_session(|s| {
			s.feature_id = Some(id.clone());
			s.vertices = vec![position];
			s.preview = None;
			s.armed = armed;
		});
		log::trace!("started {mode} '{id}' at {position:?}");
		self.store.create(vec![GeoFeature::new(&id, shape(mode, vec![position]))])
	}

	fn on_mouse_move(&self, position: Coordinates) -> Result<()> {
		let Some(id) = self.active_id()? else {
			return Ok(());
		};
		self.with_session(|s| s.preview = Some(position));
		self.push_geometry(&id)
	}

	/// Removes the last committed vertex. `cursor` becomes the new preview; without it the
	/// current preview is kept.
	fn on_undo(&self, cursor: Option<Coordinates>) -> Result<()> {
		let Some(id) = self.active_id()? else {
			return Ok(());
		};
		let undone = self.with_session(|s| {
			if s.vertices.len() < 2 {
				return false;
			}
			s.vertices.pop();
			s.preview = cursor.or(s.preview);
			true
		});
		if undone == Some(true) {
			return self.push_geometry(&id);
		}
		log::trace!("removed '{id}', only its first vertex was left");
		self.reset_active()?;
		self.clear_overlay()?;
		self.store.delete_by_id(&id)?;
		Ok(())
	}

	fn on_double_click(&self) -> Result<()> {
		let Some(id) = self.active_id()? else {
			return Ok(());
		};
		let Some((mode, vertices)) = self.with_session(|s| (s.mode, s.vertices.clone())) else {
			return Ok(());
		};
		self.reset_active()?;
		self.clear_overlay()?;

		let mut vertices = vertices.into_iter().dedup().collect::<Vec<_>>();
		let required = if mode == DrawMode::Polygon {
			if vertices.len() > 1 && vertices.first() == vertices.last() {
				vertices.pop();
			}
			3
		} else {
			2
		};
		if vertices.len() < required {
			log::debug!("discarded {mode} '{id}' with {} vertices", vertices.len());
			self.store.delete_by_id(&id)?;
			return Ok(());
		}

		let Some(mut feature) = self.store.query(&id) else {
			return Ok(());
		};
		feature.geometry = shape(mode, vertices);
		self.store.update(vec![feature.clone()])?;
		self.finished(&feature)
	}

	/// Drops the feature in progress.
	fn abort(&self) -> Result<()> {
		if let Some(id) = self.reset_active()? {
			log::debug!("aborted '{id}'");
			self.store.delete_by_id(&id)?;
		}
		self.clear_overlay()
	}

	fn finished(&self, feature: &GeoFeature) -> Result<()> {
		log::debug!("finished {} '{}'", feature.geometry.type_name(), feature.id);
		let callback = self.on_drawed.borrow().clone();
		if let Some(callback) = callback {
			callback(feature);
		}
		if self.options.once {
			self.stop()?;
		}
		Ok(())
	}

	/// Writes the session's vertices and preview into the stored feature.
	fn push_geometry(&self, id: &str) -> Result<()> {
		let Some((mode, positions)) = self.with_session(|s| (s.mode, s.positions())) else {
			return Ok(());
		};
		let Some(mut feature) = self.store.query(id) else {
			return Ok(());
		};
		if mode == DrawMode::Polygon {
			self.schedule_overlay(&positions);
		}
		feature.geometry = shape(mode, positions);
		self.store.update(vec![feature])
	}

	fn schedule_overlay(&self, positions: &[Coordinates]) {
		let data = if positions.len() == 2 {
			json!({
				"type": "FeatureCollection",
				"features": [{
					"type": "Feature",
					"geometry": Geometry::new_line_string(positions.to_vec()).to_json(),
					"properties": {},
				}],
			})
		} else {
			empty_collection()
		};
		self.overlay.borrow_mut().schedule(self.options.clock.now(), data);
	}

	fn flush_overlay(&self) -> Result<bool> {
		let due = self.overlay.borrow_mut().poll(self.options.clock.now());
		match due {
			Some(data) => {
				surface_mut(&self.surface)?.set_source_data(&self.layers.overlay, data)?;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	fn clear_overlay(&self) -> Result<()> {
		self.overlay.borrow_mut().cancel();
		surface_mut(&self.surface)?.set_source_data(&self.layers.overlay, empty_collection())
	}
}

pub struct DrawManager {
	state: Rc<DrawState>,
}

impl DrawManager {
	/// Adds the drawing layers for the store's source plus the polygon edge overlay.
	pub fn new(store: &SharedStore, options: DrawOptions) -> Result<Self> {
		let layers = DrawLayers::new(options.ids.as_ref());
		for layer in layers.store_layers(&options.color) {
			store.add_layer(layer)?;
		}
		let surface = store.surface();
		{
			let mut surface = surface_mut(&surface)?;
			surface.add_source(&layers.overlay, empty_collection())?;
			surface.add_layer(
				LayerSpec::new(&layers.overlay, LayerKind::Line)
					.with_source(&layers.overlay)
					.with_paint("line-color", options.color.as_str())
					.with_paint("line-width", 2),
			)?;
		}
		Ok(Self {
			state: Rc::new(DrawState {
				store: store.clone(),
				surface,
				overlay: RefCell::new(Debounce::new(options.preview_debounce)),
				options,
				layers,
				on_drawed: RefCell::new(None),
				session: RefCell::new(None),
			}),
		})
	}

	/// Stops any running session and starts drawing `mode`.
	pub fn start(&self, mode: DrawMode) -> Result<()> {
		self.state.start(mode)
	}

	/// Ends the session, deleting an unfinished feature. Does nothing without a session.
	pub fn stop(&self) -> Result<()> {
		self.state.stop()
	}

	/// Empties the store and the overlay. A running session keeps going.
	pub fn clear(&self) -> Result<()> {
		self.state.clear()
	}

	/// Applies the overlay once its debounce delay has passed. Hosts call this periodically;
	/// every handled event does it as well.
	pub fn tick(&self) -> Result<bool> {
		self.state.flush_overlay()
	}

	/// Called once for every finished feature.
	pub fn set_on_drawed(&self, callback: impl Fn(&GeoFeature) + 'static) {
		*self.state.on_drawed.borrow_mut() = Some(Rc::new(callback));
	}

	pub fn mode(&self) -> Option<DrawMode> {
		self.state.mode()
	}

	pub fn current_feature_id(&self) -> Option<String> {
		self.state.session.borrow().as_ref().and_then(|s| s.feature_id.clone())
	}

	pub fn layers(&self) -> &DrawLayers {
		&self.state.layers
	}

	pub fn store(&self) -> &SharedStore {
		&self.state.store
	}

	pub fn is_overlay_pending(&self) -> bool {
		self.state.overlay.borrow().is_pending()
	}

	/// Stops drawing and removes the overlay layer and source. The store and its layers stay.
	pub fn destroy(&self) -> Result<()> {
		self.stop()?;
		let mut surface = surface_mut(&self.state.surface)?;
		surface.remove_layer(&self.state.layers.overlay)?;
		surface.remove_source(&self.state.layers.overlay)
	}
}

impl Debug for DrawManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DrawManager")
			.field("mode", &self.mode())
			.field("feature", &self.current_feature_id())
			.finish()
	}
}
