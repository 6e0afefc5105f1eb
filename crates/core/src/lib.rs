pub mod detect;
pub mod error;
pub mod models;
pub mod traits;

pub use detect::*;
pub use error::*;
pub use models::*;
pub use traits::*;
