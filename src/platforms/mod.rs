pub use reelgrab_core::platforms::Platform;

pub mod facebook;
pub mod tiktok;
pub mod traits;
