pub mod state;
pub mod navigation;
pub mod image_loading;
pub mod input;
pub mod file_ops;

pub use state::*;
