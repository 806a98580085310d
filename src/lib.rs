//! Pseudocolor plotting of scalar fields from XDMF simulation frames
//!
//! An XDMF frame is an XML index describing mesh topology, geometry and
//! named attributes, paired with an HDF5 store holding the actual arrays.
//! This crate resolves a (grid, variable) request against the index,
//! validates every declared dimension along the way, pulls the selected
//! hyperslabs out of the store, and renders a 2D pseudocolor image of the
//! field in Cartesian coordinates.
//!
//! # Quickstart
//!
//! ```rust, no_run
//! # use xdmfplot::{Document, Settings, Store};
//! # use xdmfplot::{plot, varname, transform::PolarGrid};
//! # fn main() -> xdmfplot::Result<()> {
//! let settings = Settings::from_file("plot.config")?;
//! let names = varname::resolve(&settings.variable);
//!
//! let document = Document::read("frame_0100.xmf")?;
//! let selection = document.resolve(&names)?;
//!
//! let store = Store::open(&selection.store_path)?;
//! let rho = store.read_coordinate(&selection.coordinates[0])?;
//! let phi = store.read_coordinate(&selection.coordinates[1])?;
//! let field = store.read_field(&selection.field, (rho.len(), phi.len()))?;
//!
//! let grid = PolarGrid::new(rho, phi);
//! let frame = plot::Frame::new(&field, &grid, &settings, None, false)?;
//! plot::render(
//!     &frame,
//!     settings.image_size,
//!     settings.image_format,
//!     std::path::Path::new("Entropy_frame_0100.png"),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [settings] - the plaintext settings file and its validators
//! - [varname] - variable path resolution, including abundance shorthand
//! - [xdmf] - the structural index walker over the XML tree
//! - [store] - strided reads from the HDF5 array store
//! - [transform] - polar/Cartesian transforms and the sampling probe
//! - [plot] - colormaps and the raster/SVG rendering backends

// Modules
pub mod error;
pub mod plot;
pub mod settings;
pub mod store;
pub mod transform;
pub mod utils;
pub mod varname;
pub mod xdmf;

// Inlined for convenience
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use settings::Settings;
#[doc(inline)]
pub use store::Store;
#[doc(inline)]
pub use varname::VarNames;
#[doc(inline)]
pub use xdmf::Document;
