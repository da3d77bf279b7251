pub mod error;
pub mod persistence;
pub mod store;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use persistence::FileStore;
pub use store::{Phase, Session, SessionStore, Transition, SESSION_KEY};
