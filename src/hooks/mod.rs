pub mod audit;
pub mod build_id;
pub mod config;
pub mod context;
pub mod package;
pub mod paths;
pub mod release;
pub mod util;
pub mod warn;
