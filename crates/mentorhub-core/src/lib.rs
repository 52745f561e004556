pub mod error;
pub mod scope;

pub use error::{CoreError, ErrorCategory, Result};
pub use scope::{TenantScope, is_valid_code};
