//! Prompt-driven generation pipeline

pub mod generator;

pub use generator::Generator;
