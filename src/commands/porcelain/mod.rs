//! Porcelain commands (user-facing Git operations)
//!
//! ## Commands
//!
//! - `add`: Stage files
//! - `status`: Show working tree status

pub mod add;
pub mod status;
