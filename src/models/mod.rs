pub use reelgrab_core::models::{media, settings};
