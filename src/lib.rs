//! HygieAI clinical risk prediction service.
//!
//! Estimates three clinical risk probabilities (bleeding, infection, adverse
//! surgical outcome) from diagnosis codes and structured measurements using
//! three independently trained classifiers, one of which is a weighted blend
//! of two sub-models. The [`risk`] module is the prediction core; [`api`]
//! exposes it over HTTP and [`assistant`] adds LLM-backed intent routing and
//! narrative summaries.

pub mod api;
pub mod assistant;
pub mod config;
pub mod error;
pub mod risk;
