//! Shared utilities (component E, §2): path safety, file copy semantics,
//! the output-size limiter, and the checkout hook runner.

pub mod fs_ops;
pub mod hook;
pub mod limit_stream;
pub mod path_safety;

pub use hook::run_checkout_hook;
pub use limit_stream::LimitFilterOutputStream;
pub use path_safety::{resolve_in_checkout, validate_relative};
