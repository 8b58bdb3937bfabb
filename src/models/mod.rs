pub mod comment;
pub mod milestone;
pub mod project;
pub mod task;
pub mod user;

pub use comment::*;
pub use milestone::*;
pub use project::*;
pub use task::*;
pub use user::*;
