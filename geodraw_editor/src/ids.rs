//! Id generation for features, layers and sources.

use std::{cell::Cell, fmt::Debug};
use uuid::Uuid;

/// Produces fresh, unique identifiers.
pub trait IdGenerator: Debug {
	fn next_id(&self) -> String;
}

/// Random uuid v4 ids, e.g. `3f2b8c1e-7d4a-4c1b-9e0f-5a6b7c8d9e0f`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UuidGenerator {
	pub uppercase: bool,
	/// Keep the `-` separators (the default) or emit 32 plain hex digits.
	pub without_separator: bool,
}

impl IdGenerator for UuidGenerator {
	fn next_id(&self) -> String {
		let uuid = Uuid::new_v4();
		let id = if self.without_separator {
			uuid.simple().to_string()
		} else {
			uuid.hyphenated().to_string()
		};
		if self.uppercase { id.to_uppercase() } else { id }
	}
}

/// Deterministic ids `prefix1`, `prefix2`, ... for replays and tests.
#[derive(Debug, Default)]
pub struct SequentialIds {
	prefix: String,
	counter: Cell<u64>,
}

impl SequentialIds {
	pub fn new(prefix: &str) -> Self {
		Self {
			prefix: prefix.to_string(),
			counter: Cell::new(0),
		}
	}
}

impl IdGenerator for SequentialIds {
	fn next_id(&self) -> String {
		let next = self.counter.get() + 1;
		self.counter.set(next);
		format!("{}{next}", self.prefix)
	}
}
