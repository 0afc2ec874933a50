//! Request and response models

pub mod evaluate;
pub mod forensics;

pub use evaluate::*;
pub use forensics::*;
