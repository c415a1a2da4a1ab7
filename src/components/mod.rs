//! Canvas components.

pub mod network;
