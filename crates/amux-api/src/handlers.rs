//! Request handlers.

pub mod chunks;
pub mod health;
pub mod jobs;

pub use chunks::*;
pub use health::*;
pub use jobs::*;
