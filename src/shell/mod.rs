// Composition root.
//
// Responsibilities
// - Read settings from `.env` and the environment.
// - Instantiate the concrete store and platform adapters.
// - Wire them into the location repository and the position tracker.

pub mod config;
pub mod state;
