//! Public extension contracts for collaborators the gateway notifies but does not own.

pub mod logout;

pub use logout::*;
