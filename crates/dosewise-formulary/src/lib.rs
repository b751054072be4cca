//! # dosewise-formulary
//!
//! A TOML-driven formulary source for the dosewise engine.
//!
//! ## Overview
//!
//! This crate provides [`TomlFormulary`], which implements the
//! [`ConfigSource`](dosewise_core::traits::ConfigSource) trait. The
//! formulary is parsed once, checked for out-of-range values, and then
//! handed out as a shared immutable snapshot.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use dosewise_formulary::TomlFormulary;
//!
//! let formulary = TomlFormulary::from_file(Path::new("formulary/diabetes.toml"))?;
//! let engine = dosewise_core::RecommendationEngine::from_source(&formulary);
//! ```

pub mod loader;
pub mod validate;

pub use loader::TomlFormulary;
pub use validate::validate;
