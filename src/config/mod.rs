pub mod types;
pub mod model;
pub mod settings;

pub use types::*;
pub use model::*;
pub use settings::*;
