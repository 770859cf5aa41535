pub mod extractor;
pub mod session;
pub mod state;
pub mod test_utils;

pub use session::{FileSessionStore, InMemorySessionStore, SessionStore, SessionStoreError};
pub use state::AppState;
