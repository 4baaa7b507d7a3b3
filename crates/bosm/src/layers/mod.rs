//! Common low-level modules for composing networks in Burn.
pub mod activation;
pub mod head;
pub mod stack;
