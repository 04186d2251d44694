pub mod document;
pub mod enums;
pub mod reading;

pub use document::*;
pub use enums::*;
pub use reading::*;
