//! Entity Component System integration with hecs.

pub mod bridge;

pub mod prelude {
    pub use super::bridge::*;
}
