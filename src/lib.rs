//! # Metro Progress
//!
//! Construction progress monitoring for metro sites: field photos are
//! segmented into material classes, counted, and merged into a per-area
//! completion record bounded by a base plan extracted from the BIM model.
//!
//! ## Features
//!
//! - Base plans from IFC files (IFC2x3 and IFC4): elements per material
//!   class inside a storey or space
//! - Instance or pixel counting of segmentation label maps
//! - Additive or high-score progress merging, clamped to the plan
//! - JSON-file or in-memory stores with per-area locking
//! - CSV/JSON reports and a terminal dashboard
//!
//! ## Example
//!
//! ```no_run
//! use metro_progress::accountant::{Accountant, Policy};
//! use metro_progress::model::{CountingUnit, Observation};
//! use metro_progress::store::JsonFileStore;
//!
//! let accountant = Accountant::new(
//!     JsonFileStore::plans("data"),
//!     JsonFileStore::progress("data"),
//!     Policy::HighScore,
//! );
//! let observation = Observation::new(CountingUnit::Instances).with("concreto", 4);
//! let result = accountant.update("plataforma", &observation).expect("update failed");
//! println!("{}: {:.2}%", result.area_id, result.percentage_overall);
//! ```

pub mod accountant;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod model;
pub mod parser;
pub mod segmentation;
pub mod service;
pub mod store;
pub mod ui;
