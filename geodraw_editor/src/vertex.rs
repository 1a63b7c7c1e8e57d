//! Vertex editing of a single feature through an external direct-manipulation widget.
//!
//! The widget does the dragging; [`VertexEditor`] loads one feature into it, restricts what the
//! user may do ([`VertexGuards`]) and reports the edited feature once the widget's selection is
//! emptied.

use crate::surface::{ListenerId, MapEvent, MapEventKind, SharedSurface, surface_mut};
use anyhow::{Result, anyhow};
use geodraw_geometry::{GeoFeature, Geometry};
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetMode {
	/// The whole feature is selected; used for points.
	SimpleSelect,
	/// Individual vertices can be selected, dragged and deleted.
	DirectSelect,
}

/// Editing restrictions installed into the widget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexGuards;

impl VertexGuards {
	/// Lines keep at least 2 vertices, polygons at least a triangle.
	pub fn allow_vertex_delete(&self, geometry: &Geometry) -> bool {
		match geometry {
			Geometry::LineString(line) => line.0.len() > 2,
			Geometry::Polygon(polygon) => polygon.outer().is_some_and(|ring| ring.open_vertices().len() > 3),
			_ => false,
		}
	}

	/// Moving the whole feature requires a selected vertex.
	pub fn allow_drag(&self, selected_vertices: usize) -> bool {
		selected_vertices > 0
	}

	pub fn allow_feature_delete(&self) -> bool {
		false
	}
}

pub trait VertexWidget {
	fn install_guards(&mut self, guards: VertexGuards);
	/// Replaces the widget content with one feature.
	fn load(&mut self, feature: GeoFeature, mode: WidgetMode);
	fn get(&self, id: &str) -> Option<GeoFeature>;
	fn clear(&mut self);
}

pub type SharedWidget = Rc<RefCell<dyn VertexWidget>>;
type ChangeCallback = Rc<dyn Fn(&GeoFeature)>;

struct EditSession {
	feature_id: String,
	on_change: ChangeCallback,
	listener: ListenerId,
}

struct EditorState {
	surface: SharedSurface,
	widget: SharedWidget,
	session: RefCell<Option<EditSession>>,
}

impl EditorState {
	fn finish(&self) -> Result<Option<GeoFeature>> {
		let Some(session) = self.session.borrow_mut().take() else {
			return Ok(None);
		};
		surface_mut(&self.surface)?.off(session.listener);

		let mut widget = self
			.widget
			.try_borrow_mut()
			.map_err(|_| anyhow!("vertex widget is busy"))?;
		let edited = widget.get(&session.feature_id);
		widget.clear();
		drop(widget);

		let Some(feature) = edited else {
			return Ok(None);
		};
		log::debug!("vertex editing of '{}' finished", feature.id);
		(session.on_change)(&feature);
		Ok(Some(feature))
	}
}

pub struct VertexEditor {
	state: Rc<EditorState>,
}

impl VertexEditor {
	pub fn new(surface: &SharedSurface, widget: SharedWidget) -> Self {
		widget.borrow_mut().install_guards(VertexGuards);
		Self {
			state: Rc::new(EditorState {
				surface: surface.clone(),
				widget,
				session: RefCell::new(None),
			}),
		}
	}

	/// Loads a feature for editing. A feature still being edited is finished and reported
	/// first, edited or not. `on_change` receives the final feature once the widget's
	/// selection becomes empty.
	pub fn set_feature(&self, feature: GeoFeature, on_change: impl Fn(&GeoFeature) + 'static) -> Result<()> {
		self.state.finish()?;

		let mode = if matches!(feature.geometry, Geometry::Point(_)) {
			WidgetMode::SimpleSelect
		} else {
			WidgetMode::DirectSelect
		};
		let feature_id = feature.id.clone();
		self
			.state
			.widget
			.try_borrow_mut()
			.map_err(|_| anyhow!("vertex widget is busy"))?
			.load(feature, mode);

		let state: Weak<EditorState> = Rc::downgrade(&self.state);
		let listener = surface_mut(&self.state.surface)?.on(
			MapEventKind::SelectionChange,
			Rc::new(move |event: &MapEvent| {
				let (Some(state), MapEvent::SelectionChange(selected)) = (state.upgrade(), event) else {
					return;
				};
				if !selected.is_empty() {
					return;
				}
				if let Err(err) = state.finish() {
					log::warn!("failed to finish vertex editing: {err:#}");
				}
			}),
		);

		log::debug!("vertex editing of '{feature_id}' started in {mode:?}");
		*self.state.session.borrow_mut() = Some(EditSession {
			feature_id,
			on_change: Rc::new(on_change),
			listener,
		});
		Ok(())
	}

	/// Finishes the current edit as if the selection had been emptied.
	pub fn finish(&self) -> Result<Option<GeoFeature>> {
		self.state.finish()
	}

	pub fn feature_id(&self) -> Option<String> {
		self.state.session.borrow().as_ref().map(|s| s.feature_id.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		memory::{MemorySurface, MemoryWidget},
		surface::dispatch,
	};
	use geodraw_geometry::Coordinates;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	struct Fixture {
		memory: Rc<RefCell<MemorySurface>>,
		surface: SharedSurface,
		widget: Rc<RefCell<MemoryWidget>>,
		editor: VertexEditor,
		reports: Rc<RefCell<Vec<GeoFeature>>>,
	}

	impl Fixture {
		fn new() -> Self {
			let memory = MemorySurface::new().shared();
			let surface: SharedSurface = memory.clone();
			let widget = MemoryWidget::new().shared();
			let editor = VertexEditor::new(&surface, widget.clone());
			Self {
				memory,
				surface,
				widget,
				editor,
				reports: Rc::new(RefCell::new(Vec::new())),
			}
		}

		fn edit(&self, feature: GeoFeature) {
			let reports = self.reports.clone();
			self
				.editor
				.set_feature(feature, move |f| reports.borrow_mut().push(f.clone()))
				.unwrap();
		}

		fn deselect(&self) {
			dispatch(&self.surface, &MapEvent::SelectionChange(vec![]));
		}
	}

	fn line() -> GeoFeature {
		GeoFeature::new("l", Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]))
	}

	#[test]
	fn reports_edited_geometry_on_deselect() {
		let f = Fixture::new();
		f.edit(line());
		assert_eq!(f.widget.borrow().mode(), Some(WidgetMode::DirectSelect));
		{
			let mut widget = f.widget.borrow_mut();
			widget.select_vertex(1);
			widget.move_selected(Coordinates::new(1.0, 1.0));
		}
		dispatch(&f.surface, &MapEvent::SelectionChange(vec!["l".to_string()]));
		assert!(f.reports.borrow().is_empty());

		f.deselect();
		assert_eq!(
			f.reports.borrow()[0].geometry,
			Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]])
		);
		assert!(f.widget.borrow().loaded().is_none());
		assert_eq!(f.memory.borrow().listener_count(MapEventKind::SelectionChange), 0);
		assert_eq!(f.editor.feature_id(), None);
	}

	#[test]
	fn unchanged_feature_is_reported_on_deselect() {
		let f = Fixture::new();
		f.edit(line());
		f.deselect();
		assert_eq!(*f.reports.borrow(), vec![line()]);
		assert!(f.widget.borrow().loaded().is_none());
		assert_eq!(f.editor.finish().unwrap(), None);
	}

	#[test]
	fn switching_features_reports_an_unedited_previous_one() {
		let f = Fixture::new();
		f.edit(line());
		f.edit(GeoFeature::new("q", Geometry::new_line_string(vec![[3.0, 3.0], [4.0, 4.0]])));
		assert_eq!(*f.reports.borrow(), vec![line()]);
		assert_eq!(f.editor.feature_id(), Some("q".to_string()));

		f.deselect();
		assert_eq!(f.reports.borrow().len(), 2);
		assert_eq!(f.reports.borrow()[1].id, "q");
	}

	#[test]
	fn switching_features_reports_the_previous_one() {
		let f = Fixture::new();
		f.edit(line());
		f.widget.borrow_mut().select_vertex(0);
		f.widget.borrow_mut().move_selected(Coordinates::new(-1.0, 0.0));

		f.edit(GeoFeature::new("p", Geometry::new_point([5.0, 5.0])));
		assert_eq!(f.reports.borrow().len(), 1);
		assert_eq!(f.reports.borrow()[0].id, "l");
		assert_eq!(f.widget.borrow().mode(), Some(WidgetMode::SimpleSelect));
		assert_eq!(f.editor.feature_id(), Some("p".to_string()));
		assert_eq!(f.memory.borrow().listener_count(MapEventKind::SelectionChange), 1);
	}

	#[test]
	fn deleting_the_last_line_vertices_is_suppressed() {
		let f = Fixture::new();
		f.edit(GeoFeature::new("l", Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 0.0]])));
		let mut widget = f.widget.borrow_mut();
		widget.select_vertex(0);
		assert!(!widget.delete_selected());
	}

	#[rstest]
	#[case(Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]), true)]
	#[case(Geometry::new_line_string(vec![[0.0, 0.0], [1.0, 0.0]]), false)]
	#[case(Geometry::new_polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]), true)]
	#[case(Geometry::new_polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]), false)]
	#[case(Geometry::new_point([0.0, 0.0]), false)]
	fn vertex_delete_guard(#[case] geometry: Geometry, #[case] allowed: bool) {
		assert_eq!(VertexGuards.allow_vertex_delete(&geometry), allowed);
	}

	#[test]
	fn drag_and_feature_delete_guards() {
		assert!(!VertexGuards.allow_drag(0));
		assert!(VertexGuards.allow_drag(1));
		assert!(!VertexGuards.allow_feature_delete());
	}
}
