pub mod assets;
pub mod config;
pub mod error;
pub mod parsing;
pub mod paths;
pub mod site;
pub mod theme;
pub mod types;

pub use assets::*;
pub use config::*;
pub use error::*;
pub use parsing::*;
pub use paths::*;
pub use site::*;
pub use theme::*;
pub use types::*;
