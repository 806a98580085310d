//! Result and Error types for the crate
//!
//! Every failure mode surfaces immediately with enough context to diagnose
//! the offending input file or settings value. There are no retries.

/// Type alias for Result<T, xdmfplot::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for anything that can go wrong while resolving and
/// plotting a frame
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A settings-file option failed validation
    #[error("invalid value for option '{option}': {reason}")]
    ConfigValidation { option: String, reason: String },

    /// The requested grid does not exist in the XDMF tree
    #[error(
        "invalid grid\n  '{variable}' provided a grid not found in the XDMF\n  grid tried was: '{grid}'"
    )]
    GridNotFound { grid: String, variable: String },

    /// The requested attribute does not exist under the resolved grid
    #[error("invalid attribute\n  '{variable}' not found in {file}\n  path looked for was: '{grid}/{variable}'")]
    AttributeNotFound {
        grid: String,
        variable: String,
        file: String,
    },

    /// Dimension count in the topology tag disagrees with its type tag
    #[error(
        "dimensions specified in topology tag ({counts}) do not match topology type ('{topology_type}')"
    )]
    TopologyMismatch { topology_type: String, counts: usize },

    /// Declared `Dimensions` disagree with the topology entry
    #[error(
        "dimensions specified in the geometry's {location} ({found}) do not match those specified in the topology tag ({expected})"
    )]
    DimensionMismatch {
        location: String,
        expected: usize,
        found: String,
    },

    /// Hyperslab count disagrees with the topology entry
    #[error(
        "dimensions specified in the geometry's {ordinal} hyperslab ('{text}') do not match those specified in the topology tag ({expected})"
    )]
    HyperslabMismatch {
        ordinal: String,
        text: String,
        expected: usize,
    },

    /// Missing or malformed hyperslab selection data
    #[error("invalid hyperslab spec for '{context}': {reason}")]
    InvalidHyperslabSpec { context: String, reason: String },

    /// A geometry DataItem function was not of the `$0/<divisor>` form
    #[error("unsupported function expression '{expression}' in {context}")]
    UnsupportedFunction { context: String, expression: String },

    /// A time Information function was not of the `$0-$1` form
    #[error("could not retrieve time from '{grid}'\n  time not formatted as known pattern ('{expression}')")]
    UnsupportedTimeExpression { grid: String, expression: String },

    /// The sliced field did not squeeze down to exactly two dimensions
    #[error("field '{dataset}' is not 2D after removing unit axes (shape was {shape:?})")]
    FieldShape { dataset: String, shape: Vec<usize> },

    /// An expected structural element was absent from the tree
    #[error("no <{element}> found under <{parent}>")]
    MissingElement { parent: String, element: String },

    /// File could not be read or written
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The XML index failed to parse
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The binary array store rejected an open or read
    #[error(transparent)]
    Store(#[from] hdf5::Error),

    /// The image backend failed to encode or save
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
