pub mod config;
pub mod duck;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod process;

pub use config::LoaderConfig;
pub use error::{LoadError, LoadResult};
