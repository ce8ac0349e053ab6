pub mod error;
pub mod types;
pub mod value;

pub use error::{EngineError, ErrorKind, Result};
pub use types::{Principal, Role, TenantId, UserId};
pub use value::{Payload, Value, payload_from_json};
