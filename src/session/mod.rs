// Session module
// The in-memory session snapshot and its reactive store

mod store;
mod types;

pub use store::SessionStore;
pub use types::{Session, TokenPair, UserProfile};
