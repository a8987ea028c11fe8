// Path Planning algorithms module

pub mod neighbors;
pub mod graph_search;
pub mod prm;
pub mod rrt_star;

pub use neighbors::*;
pub use graph_search::*;
pub use prm::*;
pub use rrt_star::*;
