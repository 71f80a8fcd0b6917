mod auth;
mod events;
mod habits;

pub use auth::*;
pub use events::*;
pub use habits::*;
