mod memory;
mod repo;
mod repo_types;

pub use memory::InMemoryUserStore;
pub use repo::{PgUserStore, UserStore};
pub use repo_types::{NewUser, StoreError, User, UserPatch};
