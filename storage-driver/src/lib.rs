//! The key-value storage contract consumed by the registry core.

mod driver;
mod error;

pub use driver::ByteStream;
pub use driver::Driver;
pub use driver::Metadata;
pub use error::StorageError;
pub use error::StorageErrorBuilder;
pub use error::StorageErrorKind;
