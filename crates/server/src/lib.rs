//! Fetal Age Predictor web server
//!
//! Serves the prediction form, a JSON prediction API and the health and
//! metrics endpoints on top of `gestation-lib`.

pub mod api;
pub mod config;
pub mod views;
