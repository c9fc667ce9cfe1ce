//! Level data model
//!
//! Templates, placed instances, parameter values and the project manifest.

mod math;
mod value;
mod template;
mod instance;
mod project;

pub use math::*;
pub use value::*;
pub use template::*;
pub use instance::*;
pub use project::*;
