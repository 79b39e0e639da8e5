
pub mod types;
pub mod random;
pub mod padding;
pub mod modes;
pub mod reference;

pub use types::*;
pub use random::*;
pub use modes::ModeContext;
pub use reference::{Xtea, XteaWide};
