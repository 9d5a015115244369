pub mod config;
pub mod cycle;
pub mod frequency;
pub mod input;
pub mod rectify;
pub mod resonance;
pub mod sequence;
pub mod session;
pub mod workflow;
