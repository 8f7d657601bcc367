pub mod artifact;
pub mod checklist;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod io;
pub mod lock;
pub mod next;
pub mod paths;
pub mod resolver;
pub mod session;
pub mod store;
pub mod types;

pub use error::{Result, TrailError};
