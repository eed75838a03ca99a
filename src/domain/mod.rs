pub mod audio;
pub mod post;
pub mod state;

pub use audio::{AudioRef, AudioUnit, Chunk};
pub use post::{MediaKind, PlatformId, Post, PostId};
pub use state::{PipelineState, PlaybackState};
