//! Clients for the external services this application delegates to:
//! object storage (cover images), the recognition workflow (photo to
//! title/author/publisher), and the identity provider (login).

pub mod identity;
pub mod recognition;
pub mod storage;

pub use identity::IdentityClient;
pub use recognition::RecognitionClient;
pub use storage::StorageClient;
