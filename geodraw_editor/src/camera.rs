//! Mirrors the camera of a render surface.

use crate::surface::{Camera, ListenerId, MapEvent, MapEventKind, SharedSurface, surface_mut};
use anyhow::Result;
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
	time::Duration,
};

struct CameraState {
	surface: RefCell<SharedSurface>,
	camera: Cell<Camera>,
}

impl CameraState {
	fn refresh(&self) {
		let camera = self.surface.borrow().borrow().camera();
		self.camera.set(camera);
	}
}

/// Keeps a copy of the surface camera, refreshed whenever `event` fires.
pub struct CameraWatcher {
	state: Rc<CameraState>,
	event: MapEventKind,
	listener: Cell<Option<ListenerId>>,
}

impl CameraWatcher {
	/// Follows the camera on [`MapEventKind::MoveEnd`].
	pub fn new(surface: &SharedSurface) -> Result<Self> {
		Self::with_event(surface, MapEventKind::MoveEnd)
	}

	pub fn with_event(surface: &SharedSurface, event: MapEventKind) -> Result<Self> {
		let watcher = Self {
			state: Rc::new(CameraState {
				surface: RefCell::new(surface.clone()),
				camera: Cell::new(Camera::default()),
			}),
			event,
			listener: Cell::new(None),
		};
		watcher.bind()?;
		Ok(watcher)
	}

	fn bind(&self) -> Result<()> {
		let state = Rc::downgrade(&self.state);
		let surface = self.state.surface.borrow().clone();
		let id = surface_mut(&surface)?.on(
			self.event,
			Rc::new(move |_: &MapEvent| {
				if let Some(state) = state.upgrade() {
					state.refresh();
				}
			}),
		);
		self.listener.set(Some(id));
		self.state.refresh();
		Ok(())
	}

	fn unbind(&self) {
		let Some(id) = self.listener.take() else {
			return;
		};
		if let Ok(mut surface) = self.state.surface.borrow().try_borrow_mut() {
			surface.off(id);
		}
	}

	/// The camera as of the last watched event.
	pub fn camera(&self) -> Camera {
		self.state.camera.get()
	}

	/// Stops following the current surface and follows `surface` instead.
	pub fn set_surface(&self, surface: &SharedSurface) -> Result<()> {
		self.unbind();
		*self.state.surface.borrow_mut() = surface.clone();
		log::debug!("camera watcher rebound to another surface");
		self.bind()
	}

	/// Moves the camera, animated over `duration` if given.
	pub fn ease_to(&self, camera: Camera, duration: Option<Duration>) -> Result<()> {
		let surface = self.state.surface.borrow().clone();
		surface_mut(&surface)?.ease_to(camera, duration);
		Ok(())
	}
}

impl Drop for CameraWatcher {
	fn drop(&mut self) {
		self.unbind();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		memory::MemorySurface,
		surface::{RenderSurface, dispatch},
	};
	use approx::assert_relative_eq;
	use geodraw_geometry::Coordinates;

	fn camera(zoom: f64) -> Camera {
		Camera {
			center: Coordinates::new(13.4, 52.5),
			zoom,
			bearing: 10.0,
			pitch: 30.0,
		}
	}

	#[test]
	fn refreshes_on_move_end() -> Result<()> {
		let memory = MemorySurface::new().shared();
		let surface: SharedSurface = memory.clone();
		let watcher = CameraWatcher::new(&surface)?;
		assert_eq!(watcher.camera(), Camera::default());

		memory.borrow_mut().set_camera(camera(7.5));
		assert_eq!(watcher.camera(), Camera::default());
		dispatch(&surface, &MapEvent::MoveEnd);
		assert_relative_eq!(watcher.camera().zoom, 7.5);
		assert_relative_eq!(watcher.camera().center.x(), 13.4);
		Ok(())
	}

	#[test]
	fn custom_event() -> Result<()> {
		let memory = MemorySurface::new().shared();
		let surface: SharedSurface = memory.clone();
		let watcher = CameraWatcher::with_event(&surface, MapEventKind::ZoomEnd)?;
		memory.borrow_mut().set_camera(camera(3.0));
		dispatch(&surface, &MapEvent::MoveEnd);
		assert_relative_eq!(watcher.camera().zoom, 0.0);
		dispatch(&surface, &MapEvent::ZoomEnd);
		assert_relative_eq!(watcher.camera().zoom, 3.0);
		Ok(())
	}

	#[test]
	fn rebinding_moves_the_listener() -> Result<()> {
		let first = MemorySurface::new().shared();
		let second = MemorySurface::new().shared();
		second.borrow_mut().set_camera(camera(12.0));
		let first_surface: SharedSurface = first.clone();
		let second_surface: SharedSurface = second.clone();

		let watcher = CameraWatcher::new(&first_surface)?;
		watcher.set_surface(&second_surface)?;
		assert_eq!(first.borrow().listener_count(MapEventKind::MoveEnd), 0);
		assert_eq!(second.borrow().listener_count(MapEventKind::MoveEnd), 1);
		assert_relative_eq!(watcher.camera().zoom, 12.0);

		drop(watcher);
		assert_eq!(second.borrow().listener_count(MapEventKind::MoveEnd), 0);
		Ok(())
	}

	#[test]
	fn ease_to_passes_the_duration() -> Result<()> {
		let memory = MemorySurface::new().shared();
		let surface: SharedSurface = memory.clone();
		let watcher = CameraWatcher::new(&surface)?;
		watcher.ease_to(camera(9.0), Some(Duration::from_millis(300)))?;
		assert_eq!(memory.borrow().last_transition(), Some(Some(Duration::from_millis(300))));
		assert_relative_eq!(memory.borrow().camera().zoom, 9.0);
		Ok(())
	}
}
