pub mod address;
pub mod cluster;
pub mod history;
pub mod record;

pub use address::*;
pub use cluster::*;
pub use history::*;
pub use record::*;
