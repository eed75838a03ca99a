pub mod context;
pub mod error;

pub use context::{AppContext, Status};
pub use error::{Result, SocialcastError};
