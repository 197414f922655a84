pub mod blending;

pub use blending::{blend, BlendingEngine};
