pub mod preprocessing;
pub mod edges;
pub mod threshold;
pub mod morphology;
pub mod components;
pub mod detection;

pub use preprocessing::*;
pub use edges::*;
pub use threshold::*;
pub use morphology::close;
pub use components::*;
pub use detection::*;
