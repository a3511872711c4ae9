//! Error types for metro-progress.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::CountingUnit;

/// Errors that can occur when parsing IFC files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the IFC file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },
}

/// Errors raised while deriving base plans from a BIM model.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No storey or space carries the requested name.
    #[error("area '{name}' not found in the IFC model")]
    AreaNotFound { name: String },

    /// A spatial containment relation does not point at a structure.
    #[error("relation #{relation} has a malformed RelatingStructure")]
    MalformedRelation { relation: u64 },

    /// Failed to read the folder-to-area mapping file.
    #[error("failed to read area mapping '{path}': {source}")]
    MappingRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The folder-to-area mapping is not a JSON object of strings.
    #[error("invalid area mapping '{path}': {source}")]
    MappingParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Persisting a generated plan failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read a persisted record.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a record.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A persisted record is not valid JSON for its type.
    #[error("corrupt record '{key}': {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    /// The key cannot be used as a file name.
    #[error("'{key}' is not a valid area id")]
    InvalidKey { key: String },

    /// Failed to serialize a record before writing it.
    #[error("JSON serialization failed: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

/// Errors surfaced by [`crate::accountant::Accountant::update`].
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The area id is empty or contains a path separator.
    #[error("invalid area id '{area_id}'")]
    InvalidAreaId { area_id: String },

    /// No base plan persisted for the area.
    #[error("base plan for area '{area_id}' not found")]
    PlanNotFound { area_id: String },

    /// The persisted progress record failed to parse.
    #[error("progress record for area '{area_id}' is corrupt: {source}")]
    CorruptProgress {
        area_id: String,
        source: serde_json::Error,
    },

    /// The observation was measured in a different unit than the plan.
    #[error("area '{area_id}' plans {plan} but the observation counts {observed}")]
    UnitMismatch {
        area_id: String,
        plan: CountingUnit,
        observed: CountingUnit,
    },

    /// Reading or writing plan or progress failed.
    #[error(transparent)]
    Io(StoreError),
}

/// Errors turning a prediction into per-class counts.
#[derive(Debug, Error)]
pub enum SegmentationError {
    /// The label image could not be decoded.
    #[error("failed to decode label image: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    /// Label buffer length does not match the declared dimensions.
    #[error("label buffer has {actual} pixels, expected {width}x{height}")]
    Dimensions {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// Errors loading the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },

    /// Failed to list the areas being exported.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failed to load one area's progress.
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors at the web-tier boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}
