mod session;
mod store;

pub use session::SessionManager;
pub use store::FileStore;
pub use store::MemoryStore;
pub use store::SessionStore;
pub use store::StoreError;
pub use store::StoredEntry;
