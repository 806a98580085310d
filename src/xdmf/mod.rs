//! Structural resolution of XDMF index files
//!
//! An XDMF file is an XML index: a `Domain` holding named `Grid` elements,
//! each with a `Topology` (per-dimension element counts), a `Geometry`
//! (one coordinate `DataItem` per spatial dimension) and named `Attribute`
//! fields. The data itself lives in an external HDF5 store; the index
//! points into it with hyperslab selections.
//!
//! # Quickstart
//!
//! ```rust, no_run
//! # use xdmfplot::xdmf::Document;
//! # use xdmfplot::varname;
//! let doc = Document::read("frame_0100.xmf").unwrap();
//! let names = varname::resolve("Hydro/Entropy");
//!
//! // validated hyperslab selections for the grid coordinates and field
//! let selection = doc.resolve(&names).unwrap();
//! ```
//!
//! # Implementation overview
//!
//! `resolve()` walks the tree rather than streaming it: the index files
//! are tiny compared to the arrays they describe. Every declared dimension
//! is cross-checked on the way down:
//!
//! - the `TopologyType` leading digit must equal the number of declared
//!   element counts
//! - each coordinate `DataItem` (and the hyperslab tag inside it) must
//!   declare dimensions matching the corresponding topology entry, read in
//!   reverse order (the last-declared dimension is the first geometry item)
//! - each hyperslab count must equal the matching topology entry
//!
//! Mismatches are hard errors naming the exact tag and the expected vs
//! found values; nothing proceeds to array slicing on a bad index.
//!
//! Coordinate items may be wrapped in a `Function` DataItem; the only
//! supported form is elementwise division `$0/<n>`. Time values resolve
//! from the grid's `Time` element, falling back to an
//! `Information[Name="Time"]` subtraction function `$0-$1` over two stored
//! scalars. Anything else is an unsupported expression and fatal.

pub mod hyperslab;
pub mod xml;

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::utils::{f, ordinal};
use crate::varname::VarNames;

#[doc(inline)]
pub use hyperslab::Hyperslab;

use xml::Element;

/// A parsed XDMF index file
#[derive(Debug, Clone)]
pub struct Document {
    domain: Element,
    path: PathBuf,
}

/// One coordinate array selection from the grid geometry
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSelection {
    /// Dataset path inside the binary store
    pub dataset: String,
    pub slab: Hyperslab,
    /// Elementwise divisor from a `$0/<n>` function wrapper
    pub divisor: Option<f64>,
}

/// The attribute array selection, one hyperslab per stored dimension
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection {
    /// Dataset path inside the binary store
    pub dataset: String,
    pub slabs: Vec<Hyperslab>,
}

/// Where the frame's time value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSource {
    /// A literal `Time Value` on the grid
    Value(f64),
    /// A `$0-$1` difference of two stored scalars (time since bounce)
    Difference { minuend: String, subtrahend: String },
}

/// Everything needed to slice one grid's arrays out of the store
#[derive(Debug, Clone)]
pub struct GridSelection {
    /// Binary store location, resolved relative to the index file
    pub store_path: PathBuf,
    /// Coordinate selections in reverse-dimension order
    pub coordinates: Vec<CoordinateSelection>,
    pub field: FieldSelection,
    pub time: Option<TimeSource>,
}

impl Document {
    /// Read and parse an XDMF index file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = xml::read(&path)?;
        Self::from_root(root, path.as_ref().to_path_buf())
    }

    /// Parse an XDMF index from a string, with `path` used for relative
    /// store locations and error context
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let root = xml::parse(content)?;
        Self::from_root(root, path.into())
    }

    fn from_root(root: Element, path: PathBuf) -> Result<Self> {
        let domain = root
            .find_child("Domain")
            .cloned()
            .ok_or_else(|| Error::MissingElement {
                parent: root.name().to_string(),
                element: "Domain".to_string(),
            })?;
        Ok(Self { domain, path })
    }

    /// Names of every grid in the domain
    pub fn grid_names(&self) -> Vec<&str> {
        self.domain
            .children()
            .iter()
            .filter(|c| c.name() == "Grid")
            .filter_map(|c| c.attribute("Name"))
            .collect()
    }

    /// Attribute names defined on the given grid
    pub fn variable_names(&self, grid: &str) -> Vec<&str> {
        match self.domain.find_named("Grid", grid) {
            Some(grid) => grid
                .children()
                .iter()
                .filter(|c| c.name() == "Attribute")
                .filter_map(|c| c.attribute("Name"))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The `--tree` listing of all grids and their variables
    pub fn tree_listing(&self) -> String {
        let mut out = String::from("Found valid scalars:\n");
        for grid in self.grid_names() {
            out += &f!("\n{grid}\n");
            for chunk in self.variable_names(grid).chunks(5) {
                out += &f!("\t{}\n", chunk.join(", "));
            }
        }
        out
    }

    /// Human-readable creation timestamp from `Information[Name="ctime"]`
    ///
    /// Returns None when the metadata is absent; the caller decides how
    /// loudly to complain (it is never fatal).
    pub fn creation_time(&self) -> Option<String> {
        let info = self
            .domain
            .children()
            .iter()
            .find(|c| c.name() == "Information" && c.attribute("Name") == Some("ctime"))?;
        let epoch = info.attribute("Value")?.parse::<f64>().ok()?;
        let stamp = chrono::DateTime::from_timestamp(epoch as i64, 0)?;
        Some(f!("Data from {}", stamp.format("%a %b %e %H:%M:%S %Y")))
    }

    /// Resolve a grid/variable pair into validated store selections
    ///
    /// This is the structural walk described in the module docs. Every
    /// returned hyperslab has been checked against the declared topology.
    pub fn resolve(&self, names: &VarNames) -> Result<GridSelection> {
        let grid = self
            .domain
            .find_named("Grid", &names.grid)
            .ok_or_else(|| Error::GridNotFound {
                grid: names.grid.clone(),
                variable: names.raw.clone(),
            })?;

        let counts = self.topology_counts(grid)?;
        let (coordinates, store_file) = self.resolve_geometry(grid, &counts)?;
        let field = self.resolve_attribute(grid, names)?;
        let time = resolve_time(grid, &names.grid)?;

        let directory = self.path.parent().unwrap_or_else(|| Path::new(""));
        let store_path = directory.join(store_file);
        debug!("Resolved store path: {}", store_path.display());

        Ok(GridSelection {
            store_path,
            coordinates,
            field,
            time,
        })
    }

    /// Declared per-dimension counts, validated against the topology type
    fn topology_counts(&self, grid: &Element) -> Result<Vec<usize>> {
        let topology = grid.find_child("Topology").ok_or_else(|| Error::MissingElement {
            parent: "Grid".to_string(),
            element: "Topology".to_string(),
        })?;

        let declared = topology
            .attribute("NumberOfElements")
            .ok_or_else(|| Error::MissingElement {
                parent: "Topology".to_string(),
                element: "NumberOfElements".to_string(),
            })?;
        let counts = declared
            .split_whitespace()
            .map(|t| t.parse::<usize>())
            .collect::<core::result::Result<Vec<usize>, _>>()
            .map_err(|_| Error::InvalidHyperslabSpec {
                context: "Topology NumberOfElements".to_string(),
                reason: f!("'{declared}' is not an integer sequence"),
            })?;

        // the topology type tag leads with its dimensionality, e.g. 2DSMesh
        let topology_type = topology.attribute("TopologyType").unwrap_or_default();
        let implied = topology_type.chars().next().and_then(|c| c.to_digit(10));
        if implied != Some(counts.len() as u32) {
            return Err(Error::TopologyMismatch {
                topology_type: topology_type.to_string(),
                counts: counts.len(),
            });
        }

        Ok(counts)
    }

    /// Walk the geometry DataItems in reverse-dimension order
    fn resolve_geometry(
        &self,
        grid: &Element,
        counts: &[usize],
    ) -> Result<(Vec<CoordinateSelection>, String)> {
        let geometry = grid.find_child("Geometry").ok_or_else(|| Error::MissingElement {
            parent: "Grid".to_string(),
            element: "Geometry".to_string(),
        })?;

        let items = geometry
            .children()
            .iter()
            .filter(|c| c.name() == "DataItem")
            .collect::<Vec<&Element>>();

        let mut coordinates = Vec::with_capacity(items.len());
        let mut store_file: Option<String> = None;

        for (i, item) in items.iter().enumerate() {
            // geometry item i maps to declared dimension N-1-i
            let expected = counts
                .len()
                .checked_sub(i + 1)
                .map(|dim| counts[dim])
                .ok_or_else(|| Error::InvalidHyperslabSpec {
                    context: "Geometry".to_string(),
                    reason: f!(
                        "more coordinate DataItems than the {} declared topology dimensions",
                        counts.len()
                    ),
                })?;

            if let Some(found) = item.attribute("Dimensions") {
                check_dimension("DataItem", expected, found)?;
            }

            let (slab_holder, divisor) = if item.attribute("ItemType") == Some("Function") {
                let expression = item.attribute("Function").unwrap_or_default();
                let divisor = hyperslab::parse_divisor(expression).ok_or_else(|| {
                    Error::UnsupportedFunction {
                        context: f!("geometry's {} DataItem", ordinal(i)),
                        expression: expression.to_string(),
                    }
                })?;
                (item.child_at(0)?, Some(divisor))
            } else {
                (*item, None)
            };

            let location = f!("{} hyperslab tag", ordinal(i));
            match slab_holder.attribute("Dimensions") {
                Some(found) => check_dimension(&location, expected, found)?,
                None => {
                    return Err(Error::DimensionMismatch {
                        location,
                        expected,
                        found: "(absent)".to_string(),
                    })
                }
            }

            let ssc = slab_holder.child_at(0)?;
            let slab =
                hyperslab::parse_triple(ssc.text(), &f!("geometry's {} hyperslab", ordinal(i)))?;
            if slab.count != expected {
                return Err(Error::HyperslabMismatch {
                    ordinal: ordinal(i),
                    text: ssc.text().to_string(),
                    expected,
                });
            }

            let (file, dataset) =
                split_store_path(slab_holder.child_at(1)?.text(), &f!("geometry's {} DataItem", ordinal(i)))?;

            // the store is keyed off the first coordinate's file reference
            match &store_file {
                None => store_file = Some(file.to_string()),
                Some(first) if first != file => {
                    debug!("Coordinate {i} references a different store file '{file}', keeping '{first}'")
                }
                Some(_) => {}
            }

            coordinates.push(CoordinateSelection {
                dataset: dataset.to_string(),
                slab,
                divisor,
            });
        }

        if coordinates.len() < 2 {
            return Err(Error::MissingElement {
                parent: "Geometry".to_string(),
                element: "two coordinate DataItems".to_string(),
            });
        }

        let store_file = store_file.expect("at least two coordinates resolved");
        Ok((coordinates, store_file))
    }

    /// Decode the requested attribute's flat hyperslab spec
    fn resolve_attribute(&self, grid: &Element, names: &VarNames) -> Result<FieldSelection> {
        let attribute = grid
            .children()
            .iter()
            .find(|c| c.name() == "Attribute" && c.attribute("Name") == Some(names.variable.as_str()))
            .ok_or_else(|| Error::AttributeNotFound {
                grid: names.grid.clone(),
                variable: names.variable.clone(),
                file: self.path.display().to_string(),
            })?;

        let context = f!("{}/{}", names.grid, names.variable);
        let wrapper = attribute.find_child("DataItem").ok_or_else(|| Error::MissingElement {
            parent: "Attribute".to_string(),
            element: "DataItem".to_string(),
        })?;

        let spec = wrapper.child_at(0)?;
        let dimensions = spec.attribute("Dimensions").ok_or_else(|| {
            Error::InvalidHyperslabSpec {
                context: context.clone(),
                reason: "Dimensions spec of DataItem in hyperslab missing".to_string(),
            }
        })?;
        let slabs = hyperslab::decode_flat(dimensions, spec.text(), &context)?;

        let (_, dataset) = split_store_path(wrapper.child_at(1)?.text(), &context)?;

        // xn_c composition arrays carry a species dimension; the rank is an
        // explicit rule tied to that naming convention, not inferred
        let expected_rank = if dataset.contains("xn_c") { 4 } else { 3 };
        if slabs.len() != expected_rank {
            return Err(Error::InvalidHyperslabSpec {
                context: context.clone(),
                reason: f!(
                    "'{dataset}' requires a rank {expected_rank} selection, spec declares {}",
                    slabs.len()
                ),
            });
        }

        Ok(FieldSelection {
            dataset: dataset.to_string(),
            slabs,
        })
    }
}

/// Prefer the grid's literal Time value, fall back to the bounce function
fn resolve_time(grid: &Element, grid_name: &str) -> Result<Option<TimeSource>> {
    if let Some(value) = grid.find_child("Time").and_then(|t| t.attribute("Value")) {
        let parsed = value.parse::<f64>().map_err(|_| Error::UnsupportedTimeExpression {
            grid: grid_name.to_string(),
            expression: value.to_string(),
        })?;
        return Ok(Some(TimeSource::Value(parsed)));
    }

    let Some(info) = grid
        .children()
        .iter()
        .find(|c| c.name() == "Information" && c.attribute("Name") == Some("Time"))
    else {
        return Ok(None);
    };

    let function = info.child_at(0)?;
    let expression = function.attribute("Function").unwrap_or_default();
    if function.attribute("ItemType") != Some("Function") || !hyperslab::is_difference(expression)
    {
        return Err(Error::UnsupportedTimeExpression {
            grid: grid_name.to_string(),
            expression: expression.to_string(),
        });
    }

    let operand = |item: &Element| -> Result<String> {
        let (_, dataset) = split_store_path(item.text(), "time function operand")?;
        Ok(dataset.to_string())
    };

    Ok(Some(TimeSource::Difference {
        minuend: operand(function.child_at(0)?)?,
        subtrahend: operand(function.child_at(1)?)?,
    }))
}

fn check_dimension(location: &str, expected: usize, found: &str) -> Result<()> {
    if found.trim().parse::<usize>() == Ok(expected) {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            location: location.to_string(),
            expected,
            found: found.to_string(),
        })
    }
}

/// Split a `file.h5:/dataset/path` store reference
fn split_store_path<'a>(text: &'a str, context: &str) -> Result<(&'a str, &'a str)> {
    text.trim()
        .split_once(':')
        .ok_or_else(|| Error::InvalidHyperslabSpec {
            context: context.to_string(),
            reason: f!("store reference '{}' has no ':' separator", text.trim()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varname;

    // a structurally complete single-grid frame
    fn frame() -> String {
        r#"<?xml version="1.0" ?>
        <Xdmf Version="2.0">
          <Domain>
            <Information Name="ctime" Value="1556723000"/>
            <Grid Name="Hydro" GridType="Uniform">
              <Topology TopologyType="2DSMesh" NumberOfElements="240 722"/>
              <Geometry GeometryType="X_Y">
                <DataItem ItemType="HyperSlab" Dimensions="722">
                  <DataItem Dimensions="3" Format="XML">0 1 722</DataItem>
                  <DataItem Dimensions="724" Format="HDF">frame.h5:/mesh/x_ef</DataItem>
                </DataItem>
                <DataItem ItemType="Function" Function="$0/2" Dimensions="240">
                  <DataItem ItemType="HyperSlab" Dimensions="240">
                    <DataItem Dimensions="3" Format="XML">0 1 240</DataItem>
                    <DataItem Dimensions="242" Format="HDF">frame.h5:/mesh/y_ef</DataItem>
                  </DataItem>
                </DataItem>
              </Geometry>
              <Attribute Name="Entropy" AttributeType="Scalar" Center="Cell">
                <DataItem ItemType="HyperSlab" Dimensions="1 722 240">
                  <DataItem Dimensions="3 3" Format="XML">0 0 0 1 1 1 1 722 240</DataItem>
                  <DataItem Dimensions="1 722 240" Format="HDF">frame.h5:/fluid/entropy</DataItem>
                </DataItem>
              </Attribute>
              <Attribute Name="Density" AttributeType="Scalar" Center="Cell">
                <DataItem ItemType="HyperSlab" Dimensions="1 722 240">
                  <DataItem Dimensions="3 3" Format="XML">0 0 0 1 1 1 1 722 240</DataItem>
                  <DataItem Dimensions="1 722 240" Format="HDF">frame.h5:/fluid/density</DataItem>
                </DataItem>
              </Attribute>
              <Time Value="12.5"/>
            </Grid>
          </Domain>
        </Xdmf>"#
            .to_string()
    }

    fn document(content: &str) -> Document {
        Document::parse(content, "run/frame_0100.xmf").unwrap()
    }

    #[test]
    fn resolves_a_complete_grid() {
        let doc = document(&frame());
        let names = varname::resolve("Hydro/Entropy");
        let selection = doc.resolve(&names).unwrap();

        assert_eq!(selection.store_path, PathBuf::from("run/frame.h5"));
        assert_eq!(selection.coordinates.len(), 2);

        let x = &selection.coordinates[0];
        assert_eq!(x.dataset, "/mesh/x_ef");
        assert_eq!(x.slab, Hyperslab { start: 0, stride: 1, count: 722 });
        assert_eq!(x.divisor, None);

        let y = &selection.coordinates[1];
        assert_eq!(y.dataset, "/mesh/y_ef");
        assert_eq!(y.slab.count, 240);
        assert_eq!(y.divisor, Some(2.0));

        assert_eq!(selection.field.dataset, "/fluid/entropy");
        assert_eq!(selection.field.slabs.len(), 3);
        assert_eq!(selection.field.slabs[1].count, 722);

        assert_eq!(selection.time, Some(TimeSource::Value(12.5)));
    }

    #[test]
    fn unknown_grid_echoes_the_attempt() {
        let doc = document(&frame());
        let names = varname::resolve("Nonsense/Entropy");
        let error = doc.resolve(&names).unwrap_err();
        assert!(matches!(
            error,
            Error::GridNotFound { grid, variable }
                if grid == "Nonsense" && variable == "Nonsense/Entropy"
        ));
    }

    #[test]
    fn unknown_attribute_echoes_the_path() {
        let doc = document(&frame());
        let names = varname::resolve("Hydro/Pressure");
        let error = doc.resolve(&names).unwrap_err();
        assert!(matches!(
            error,
            Error::AttributeNotFound { grid, variable, .. }
                if grid == "Hydro" && variable == "Pressure"
        ));
    }

    #[test]
    fn topology_type_digit_must_match() {
        let content = frame().replace("2DSMesh", "3DSMesh");
        let error = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap_err();
        assert!(matches!(error, Error::TopologyMismatch { .. }));
    }

    #[test]
    fn coordinate_dimension_mismatch_is_fatal() {
        let content = frame().replace(
            r#"<DataItem ItemType="HyperSlab" Dimensions="722">"#,
            r#"<DataItem ItemType="HyperSlab" Dimensions="721">"#,
        );
        let error = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap_err();
        assert!(matches!(error, Error::DimensionMismatch { expected: 722, .. }));
    }

    #[test]
    fn hyperslab_count_mismatch_is_fatal() {
        let content = frame().replace(">0 1 722<", ">0 1 700<");
        let error = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap_err();
        // declared Dimensions still says 722, so the count check fires
        assert!(matches!(error, Error::HyperslabMismatch { expected: 722, .. }));
    }

    #[test]
    fn unsupported_coordinate_function_is_fatal() {
        let content = frame().replace("$0/2", "$0*2");
        let error = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap_err();
        assert!(matches!(error, Error::UnsupportedFunction { .. }));
    }

    #[test]
    fn bounce_time_function_resolves_to_difference() {
        let content = frame().replace(
            r#"<Time Value="12.5"/>"#,
            r#"<Information Name="Time">
                 <DataItem ItemType="Function" Function="$0-$1" Dimensions="1">
                   <DataItem Dimensions="1" Format="HDF">frame.h5:/mesh/time</DataItem>
                   <DataItem Dimensions="1" Format="HDF">frame.h5:/mesh/t_bounce</DataItem>
                 </DataItem>
               </Information>"#,
        );
        let selection = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap();
        assert_eq!(
            selection.time,
            Some(TimeSource::Difference {
                minuend: "/mesh/time".to_string(),
                subtrahend: "/mesh/t_bounce".to_string(),
            })
        );
    }

    #[test]
    fn unknown_time_function_is_fatal() {
        let content = frame().replace(
            r#"<Time Value="12.5"/>"#,
            r#"<Information Name="Time">
                 <DataItem ItemType="Function" Function="$0+$1" Dimensions="1">
                   <DataItem Dimensions="1" Format="HDF">frame.h5:/mesh/time</DataItem>
                   <DataItem Dimensions="1" Format="HDF">frame.h5:/mesh/t_bounce</DataItem>
                 </DataItem>
               </Information>"#,
        );
        let error = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap_err();
        assert!(matches!(error, Error::UnsupportedTimeExpression { .. }));
    }

    #[test]
    fn missing_time_is_not_fatal() {
        let content = frame().replace(r#"<Time Value="12.5"/>"#, "");
        let selection = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap();
        assert_eq!(selection.time, None);
    }

    #[test]
    fn species_datasets_require_four_dimensions() {
        let content = frame()
            .replace("/fluid/entropy", "/abundance/xn_c")
            .replace(
                r#"<DataItem Dimensions="3 3" Format="XML">0 0 0 1 1 1 1 722 240</DataItem>
                  <DataItem Dimensions="1 722 240" Format="HDF">frame.h5:/abundance/xn_c</DataItem>"#,
                r#"<DataItem Dimensions="3 4" Format="XML">0 0 0 0 1 1 1 1 1 2 722 240</DataItem>
                  <DataItem Dimensions="1 2 722 240" Format="HDF">frame.h5:/abundance/xn_c</DataItem>"#,
            );
        let selection = document(&content)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap();
        assert_eq!(selection.field.slabs.len(), 4);

        // a rank-3 spec against an xn_c dataset must be rejected
        let bad = frame().replace("/fluid/entropy", "/abundance/xn_c");
        let error = document(&bad)
            .resolve(&varname::resolve("Hydro/Entropy"))
            .unwrap_err();
        assert!(matches!(error, Error::InvalidHyperslabSpec { .. }));
    }

    #[test]
    fn tree_listing_names_grids_and_variables() {
        let doc = document(&frame());
        assert_eq!(doc.grid_names(), vec!["Hydro"]);
        assert_eq!(doc.variable_names("Hydro"), vec!["Entropy", "Density"]);

        let listing = doc.tree_listing();
        assert!(listing.contains("Hydro"));
        assert!(listing.contains("Entropy"));
        assert!(listing.contains("Density"));
    }

    #[test]
    fn creation_time_is_human_readable() {
        let doc = document(&frame());
        let ctime = doc.creation_time().unwrap();
        assert!(ctime.starts_with("Data from "));
        assert!(ctime.contains("2019"));

        let doc = document(&frame().replace(
            r#"<Information Name="ctime" Value="1556723000"/>"#,
            "",
        ));
        assert_eq!(doc.creation_time(), None);
    }
}
