//! Track catalog: the model type and the directory scanner.
//!
//! The catalog owns [`Track`] values and hands them out as `Arc<Track>`;
//! the session and queue only ever hold references.

mod display;
mod model;
mod scan;

pub use display::display_from_fields;
pub use model::{Track, TrackId};
pub use scan::scan;
