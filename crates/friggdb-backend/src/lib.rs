//! friggdb backend reader
//!
//! Defines the block storage reader capability (tenants, block lists and the
//! per-block bloom, index and object reads) and a direct implementation over
//! a local directory tree.

pub mod error;
pub mod local;
pub mod reader;

pub use error::{BackendError, Result};
pub use local::LocalReader;
pub use reader::{BlockDescriptor, Reader};
