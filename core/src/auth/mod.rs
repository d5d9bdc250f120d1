pub mod credentials;
pub mod password;
pub mod session;

pub use credentials::{CredentialMap, CredentialStore};
pub use password::PasswordRecord;
pub use session::{Session, SessionId, SessionRegistry};
