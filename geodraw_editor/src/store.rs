//! The authoritative feature collection of an editing session.
//!
//! [`FeatureStore`] keeps features by id in two disjoint partitions, visible and hidden, and
//! mirrors the visible partition into one GeoJSON source of the render surface, either through
//! incremental diffs or by replacing the whole source ([`SyncStrategy`]).
//!
//! [`SharedStore`] is the handle the rest of the editor uses. Every mutation runs in one turn:
//! surface synchronization, then the handlers registered for the event's kind, then the
//! handlers registered for [`StoreEventKind::All`], each group in registration order. Handlers
//! may read the store, but mutating it while they run fails.

use crate::surface::{LayerSpec, SharedSurface, SourceDiff, empty_collection, surface_mut, visibility};
use anyhow::{Result, anyhow, ensure};
use geodraw_geometry::{GeoCollection, GeoFeature};
use std::{
	cell::RefCell,
	collections::{BTreeMap, HashMap},
	fmt::Debug,
	rc::Rc,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncStrategy {
	/// Send add/update/remove diffs.
	#[default]
	Incremental,
	/// Replace the whole source on every change, for surfaces without diff support.
	Replace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreEventKind {
	/// Only used for registration: receives every event.
	All,
	Create,
	Update,
	Delete,
	Clear,
	Destroy,
	Hide,
	Show,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoreEvent {
	pub kind: StoreEventKind,
	pub features: Vec<GeoFeature>,
}

impl StoreEvent {
	fn new(kind: StoreEventKind, features: Vec<GeoFeature>) -> Self {
		Self { kind, features }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

pub type StoreHandler = Rc<dyn Fn(&StoreEvent)>;

/// Features by id, iterated in insertion order. Overwriting keeps the original position.
#[derive(Clone, Debug, Default)]
struct FeatureMap {
	order: Vec<String>,
	features: HashMap<String, GeoFeature>,
}

impl FeatureMap {
	fn insert(&mut self, feature: GeoFeature) -> Option<GeoFeature> {
		if !self.features.contains_key(&feature.id) {
			self.order.push(feature.id.clone());
		}
		self.features.insert(feature.id.clone(), feature)
	}

	fn remove(&mut self, id: &str) -> Option<GeoFeature> {
		let feature = self.features.remove(id)?;
		self.order.retain(|i| i != id);
		Some(feature)
	}

	fn get(&self, id: &str) -> Option<&GeoFeature> {
		self.features.get(id)
	}

	fn contains(&self, id: &str) -> bool {
		self.features.contains_key(id)
	}

	fn values(&self) -> impl Iterator<Item = &GeoFeature> {
		self.order.iter().filter_map(|id| self.features.get(id))
	}

	fn ids(&self) -> Vec<String> {
		self.order.clone()
	}

	fn clear(&mut self) {
		self.order.clear();
		self.features.clear();
	}
}

pub struct FeatureStore {
	source_id: String,
	surface: SharedSurface,
	strategy: SyncStrategy,
	visible: FeatureMap,
	hidden: FeatureMap,
	layer_ids: Vec<String>,
	destroyed: bool,
}

impl FeatureStore {
	/// Creates the store and its (empty) GeoJSON source on the surface.
	pub fn new(surface: &SharedSurface, source_id: &str, strategy: SyncStrategy) -> Result<Self> {
		surface_mut(surface)?.add_source(source_id, empty_collection())?;
		Ok(Self {
			source_id: source_id.to_string(),
			surface: surface.clone(),
			strategy,
			visible: FeatureMap::default(),
			hidden: FeatureMap::default(),
			layer_ids: Vec::new(),
			destroyed: false,
		})
	}

	pub fn source_id(&self) -> &str {
		&self.source_id
	}

	pub fn surface(&self) -> &SharedSurface {
		&self.surface
	}

	pub fn strategy(&self) -> SyncStrategy {
		self.strategy
	}

	fn ensure_attached(&self) -> Result<()> {
		ensure!(!self.destroyed, "feature store has been destroyed");
		Ok(())
	}

	/// Inserts features, overwriting existing ones with the same id. A hidden feature with a
	/// colliding id is replaced and becomes visible.
	pub fn create(&mut self, features: Vec<GeoFeature>) -> Result<StoreEvent> {
		self.ensure_attached()?;
		let mut added = Vec::new();
		let mut updated = Vec::new();
		for feature in &features {
			self.hidden.remove(&feature.id);
			if self.visible.insert(feature.clone()).is_some() {
				updated.push(feature.to_json());
			} else {
				added.push(feature.to_json());
			}
		}
		self.sync(vec![SourceDiff::Add(added), SourceDiff::Update(updated)])?;
		log::debug!("store '{}': created {} feature(s)", self.source_id, features.len());
		Ok(StoreEvent::new(StoreEventKind::Create, features))
	}

	/// Replaces features by id. Unknown ids are inserted; hidden features stay hidden.
	pub fn update(&mut self, features: Vec<GeoFeature>) -> Result<StoreEvent> {
		self.ensure_attached()?;
		let mut added = Vec::new();
		let mut updated = Vec::new();
		for feature in &features {
			if self.hidden.contains(&feature.id) {
				self.hidden.insert(feature.clone());
			} else if self.visible.insert(feature.clone()).is_some() {
				updated.push(feature.to_json());
			} else {
				added.push(feature.to_json());
			}
		}
		self.sync(vec![SourceDiff::Add(added), SourceDiff::Update(updated)])?;
		log::trace!("store '{}': updated {} feature(s)", self.source_id, features.len());
		Ok(StoreEvent::new(StoreEventKind::Update, features))
	}

	/// Removes features by id from either partition. Returns `None` when none of them existed.
	pub fn delete<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<Option<StoreEvent>> {
		self.ensure_attached()?;
		let mut removed = Vec::new();
		let mut removed_visible = Vec::new();
		for id in ids {
			let id = id.as_ref();
			if let Some(feature) = self.visible.remove(id) {
				removed_visible.push(id.to_string());
				removed.push(feature);
			} else if let Some(feature) = self.hidden.remove(id) {
				removed.push(feature);
			}
		}
		if removed.is_empty() {
			return Ok(None);
		}
		self.sync(vec![SourceDiff::Remove(removed_visible)])?;
		log::debug!("store '{}': deleted {} feature(s)", self.source_id, removed.len());
		Ok(Some(StoreEvent::new(StoreEventKind::Delete, removed)))
	}

	/// Empties the visible partition. Hidden features are kept.
	pub fn clear(&mut self) -> Result<StoreEvent> {
		self.ensure_attached()?;
		self.visible.clear();
		self.sync(vec![SourceDiff::RemoveAll])?;
		log::debug!("store '{}': cleared", self.source_id);
		Ok(StoreEvent::new(StoreEventKind::Clear, Vec::new()))
	}

	/// Moves visible features into the hidden partition; ids that are not visible are skipped.
	pub fn set_hidden<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<Option<StoreEvent>> {
		self.ensure_attached()?;
		let mut moved = Vec::new();
		for id in ids {
			if let Some(feature) = self.visible.remove(id.as_ref()) {
				self.hidden.insert(feature.clone());
				moved.push(feature);
			}
		}
		if moved.is_empty() {
			return Ok(None);
		}
		self.sync(vec![SourceDiff::Remove(moved.iter().map(|f| f.id.clone()).collect())])?;
		Ok(Some(StoreEvent::new(StoreEventKind::Hide, moved)))
	}

	/// Moves hidden features back into the visible partition. An empty id list restores every
	/// hidden feature.
	pub fn clear_hidden<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<Option<StoreEvent>> {
		self.ensure_attached()?;
		let ids = if ids.is_empty() {
			self.hidden.ids()
		} else {
			ids.iter().map(|id| id.as_ref().to_string()).collect()
		};
		let mut restored = Vec::new();
		for id in &ids {
			if let Some(feature) = self.hidden.remove(id) {
				self.visible.insert(feature.clone());
				restored.push(feature);
			}
		}
		if restored.is_empty() {
			return Ok(None);
		}
		self.sync(vec![SourceDiff::Add(restored.iter().map(GeoFeature::to_json).collect())])?;
		Ok(Some(StoreEvent::new(StoreEventKind::Show, restored)))
	}

	/// Drops all features and removes the owned layers and the source from the surface.
	/// The store rejects every mutation afterwards.
	pub fn destroy(&mut self) -> Result<StoreEvent> {
		self.ensure_attached()?;
		self.visible.clear();
		self.hidden.clear();
		self.destroyed = true;
		let mut surface = surface_mut(&self.surface)?;
		for id in self.layer_ids.drain(..) {
			if surface.has_layer(&id) {
				surface.remove_layer(&id)?;
			}
		}
		if surface.has_source(&self.source_id) {
			surface.remove_source(&self.source_id)?;
		}
		log::debug!("store '{}': destroyed", self.source_id);
		Ok(StoreEvent::new(StoreEventKind::Destroy, Vec::new()))
	}

	/// Looks up a visible feature.
	pub fn query(&self, id: &str) -> Option<&GeoFeature> {
		self.visible.get(id)
	}

	/// Looks up a feature in either partition.
	pub fn query_any(&self, id: &str) -> Option<&GeoFeature> {
		self.visible.get(id).or_else(|| self.hidden.get(id))
	}

	/// The visible features in insertion order.
	pub fn fc(&self) -> GeoCollection {
		GeoCollection::from(self.visible.values().cloned().collect())
	}

	pub fn hidden_ids(&self) -> Vec<String> {
		self.hidden.ids()
	}

	/// Adds a layer rendering this store's source and takes ownership of it.
	pub fn add_layer(&mut self, mut layer: LayerSpec) -> Result<()> {
		self.ensure_attached()?;
		layer.source = Some(self.source_id.clone());
		let id = layer.id.clone();
		surface_mut(&self.surface)?.add_layer(layer)?;
		self.layer_ids.push(id);
		Ok(())
	}

	/// Takes ownership of a layer that is already on the surface.
	pub fn adopt_layer(&mut self, id: &str) {
		if !self.layer_ids.iter().any(|l| l == id) {
			self.layer_ids.push(id.to_string());
		}
	}

	pub fn layer_ids(&self) -> &[String] {
		&self.layer_ids
	}

	/// Shows or hides all owned layers.
	pub fn set_visible(&self, visible: bool) -> Result<()> {
		let mut surface = surface_mut(&self.surface)?;
		for id in &self.layer_ids {
			surface.set_layout_property(id, "visibility", visibility(visible))?;
		}
		Ok(())
	}

	/// Replaces the source content with the visible features.
	pub fn re_render(&self) -> Result<()> {
		self.ensure_attached()?;
		surface_mut(&self.surface)?.set_source_data(&self.source_id, self.fc().to_json())
	}

	fn sync(&self, diffs: Vec<SourceDiff>) -> Result<()> {
		let diffs = diffs
			.into_iter()
			.filter(|diff| match diff {
				SourceDiff::Add(list) | SourceDiff::Update(list) => !list.is_empty(),
				SourceDiff::Remove(ids) => !ids.is_empty(),
				SourceDiff::RemoveAll => true,
			})
			.collect::<Vec<_>>();
		if diffs.is_empty() {
			return Ok(());
		}
		match self.strategy {
			SyncStrategy::Incremental => {
				let mut surface = surface_mut(&self.surface)?;
				for diff in diffs {
					surface.update_source_data(&self.source_id, diff)?;
				}
				Ok(())
			}
			SyncStrategy::Replace => self.re_render(),
		}
	}
}

impl Debug for FeatureStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FeatureStore")
			.field("source_id", &self.source_id)
			.field("strategy", &self.strategy)
			.field("visible", &self.visible.order)
			.field("hidden", &self.hidden.order)
			.finish()
	}
}

#[derive(Default)]
struct Handlers {
	next_id: usize,
	by_kind: BTreeMap<StoreEventKind, Vec<(HandlerId, StoreHandler)>>,
	all: Vec<(HandlerId, StoreHandler)>,
}

impl Handlers {
	fn for_event(&self, kind: StoreEventKind) -> Vec<StoreHandler> {
		self.by_kind
			.get(&kind)
			.into_iter()
			.flatten()
			.chain(self.all.iter())
			.map(|(_, handler)| handler.clone())
			.collect()
	}
}

/// Shared handle to a [`FeatureStore`] with event fan-out.
#[derive(Clone)]
pub struct SharedStore {
	store: Rc<RefCell<FeatureStore>>,
	handlers: Rc<RefCell<Handlers>>,
}

impl SharedStore {
	pub fn new(surface: &SharedSurface, source_id: &str, strategy: SyncStrategy) -> Result<Self> {
		Ok(Self::from(FeatureStore::new(surface, source_id, strategy)?))
	}

	fn mutate<T>(&self, f: impl FnOnce(&mut FeatureStore) -> Result<T>) -> Result<T> {
		let mut store = self
			.store
			.try_borrow_mut()
			.map_err(|_| anyhow!("feature store is busy dispatching events"))?;
		f(&mut store)
	}

	fn emit(&self, event: &StoreEvent) {
		// holding a shared borrow keeps handlers from mutating the store
		let _store = self.store.borrow();
		let handlers = self.handlers.borrow().for_event(event.kind);
		for handler in handlers {
			handler(event);
		}
	}

	fn mutate_and_emit(&self, f: impl FnOnce(&mut FeatureStore) -> Result<Option<StoreEvent>>) -> Result<Option<StoreEvent>> {
		let event = self.mutate(f)?;
		if let Some(event) = &event {
			self.emit(event);
		}
		Ok(event)
	}

	pub fn create(&self, features: Vec<GeoFeature>) -> Result<()> {
		self.mutate_and_emit(|s| s.create(features).map(Some))?;
		Ok(())
	}

	pub fn update(&self, features: Vec<GeoFeature>) -> Result<()> {
		self.mutate_and_emit(|s| s.update(features).map(Some))?;
		Ok(())
	}

	/// Removes one feature and returns it; absent ids are a no-op without event.
	pub fn delete_by_id(&self, id: &str) -> Result<Option<GeoFeature>> {
		let event = self.mutate_and_emit(|s| s.delete(&[id]))?;
		Ok(event.and_then(|e| e.features.into_iter().next()))
	}

	/// Removes features by id, ignoring absent ones, and returns the removed features.
	pub fn delete(&self, features: &[GeoFeature]) -> Result<Vec<GeoFeature>> {
		let ids = features.iter().map(|f| f.id.as_str()).collect::<Vec<_>>();
		let event = self.mutate_and_emit(|s| s.delete(&ids))?;
		Ok(event.map(|e| e.features).unwrap_or_default())
	}

	pub fn clear(&self) -> Result<()> {
		self.mutate_and_emit(|s| s.clear().map(Some))?;
		Ok(())
	}

	pub fn set_hidden<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
		self.mutate_and_emit(|s| s.set_hidden(ids))?;
		Ok(())
	}

	pub fn clear_hidden<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
		self.mutate_and_emit(|s| s.clear_hidden(ids))?;
		Ok(())
	}

	pub fn destroy(&self) -> Result<()> {
		self.mutate_and_emit(|s| s.destroy().map(Some))?;
		Ok(())
	}

	pub fn query(&self, id: &str) -> Option<GeoFeature> {
		self.store.borrow().query(id).cloned()
	}

	pub fn query_any(&self, id: &str) -> Option<GeoFeature> {
		self.store.borrow().query_any(id).cloned()
	}

	pub fn fc(&self) -> GeoCollection {
		self.store.borrow().fc()
	}

	pub fn hidden_ids(&self) -> Vec<String> {
		self.store.borrow().hidden_ids()
	}

	pub fn source_id(&self) -> String {
		self.store.borrow().source_id().to_string()
	}

	pub fn surface(&self) -> SharedSurface {
		self.store.borrow().surface().clone()
	}

	pub fn layer_ids(&self) -> Vec<String> {
		self.store.borrow().layer_ids().to_vec()
	}

	pub fn add_layer(&self, layer: LayerSpec) -> Result<()> {
		self.mutate(|s| s.add_layer(layer))
	}

	pub fn adopt_layer(&self, id: &str) -> Result<()> {
		self.mutate(|s| {
			s.adopt_layer(id);
			Ok(())
		})
	}

	pub fn set_visible(&self, visible: bool) -> Result<()> {
		self.store.borrow().set_visible(visible)
	}

	pub fn re_render(&self) -> Result<()> {
		self.store.borrow().re_render()
	}

	/// Registers a handler. Handlers of one kind accumulate and run in registration order.
	pub fn on(&self, kind: StoreEventKind, handler: impl Fn(&StoreEvent) + 'static) -> HandlerId {
		let mut handlers = self.handlers.borrow_mut();
		let id = HandlerId(handlers.next_id);
		handlers.next_id += 1;
		let entry = (id, Rc::new(handler) as StoreHandler);
		if kind == StoreEventKind::All {
			handlers.all.push(entry);
		} else {
			handlers.by_kind.entry(kind).or_default().push(entry);
		}
		id
	}

	pub fn off(&self, id: HandlerId) -> bool {
		let mut handlers = self.handlers.borrow_mut();
		let before = handlers.all.len() + handlers.by_kind.values().map(Vec::len).sum::<usize>();
		handlers.all.retain(|(i, _)| *i != id);
		for list in handlers.by_kind.values_mut() {
			list.retain(|(i, _)| *i != id);
		}
		let after = handlers.all.len() + handlers.by_kind.values().map(Vec::len).sum::<usize>();
		before != after
	}
}

impl From<FeatureStore> for SharedStore {
	fn from(store: FeatureStore) -> Self {
		Self {
			store: Rc::new(RefCell::new(store)),
			handlers: Rc::new(RefCell::new(Handlers::default())),
		}
	}
}

impl Debug for SharedStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.store.try_borrow() {
			Ok(store) => store.fmt(f),
			Err(_) => f.write_str("FeatureStore(<busy>)"),
		}
	}
}
