//! Strided reads from the HDF5 binary store
//!
//! The index walker produces validated [`Hyperslab`] selections; this
//! module applies them to the store with the `hdf5` crate's slice readers
//! so only the requested window is ever pulled off disk. Coordinate arrays
//! come back as plain vectors, fields as 2D arrays squeezed down from
//! their stored rank.

use std::path::Path;

use log::warn;
use ndarray::{s, Array1, Array2, Axis, Ix2, Ix3, Ix4};

use crate::error::{Error, Result};
use crate::utils::f;
use crate::xdmf::{CoordinateSelection, FieldSelection, Hyperslab, TimeSource};

/// An open binary array store
#[derive(Debug)]
pub struct Store {
    file: hdf5::File,
}

impl Store {
    /// Open the store read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = hdf5::File::open(path)?;
        Ok(Self { file })
    }

    /// Read one coordinate array, applying its selection and divisor
    pub fn read_coordinate(&self, selection: &CoordinateSelection) -> Result<Vec<f64>> {
        let dataset = self.file.dataset(&selection.dataset)?;
        let slab = &selection.slab;
        let values: Array1<f64> =
            dataset.read_slice_1d(s![slab.start..slab.end();slab.stride as isize])?;

        let scale = selection.divisor.map(|d| 1.0 / d).unwrap_or(1.0);
        Ok(values.iter().map(|v| v * scale).collect())
    }

    /// Read the field window and squeeze it to the expected 2D shape
    ///
    /// `expected` is `(coordinate 0 count, coordinate 1 count)`. A field
    /// stored with the axes swapped is accepted with a warning and
    /// transposed; any other post-squeeze shape is an error.
    pub fn read_field(
        &self,
        selection: &FieldSelection,
        expected: (usize, usize),
    ) -> Result<Array2<f64>> {
        let dataset = self.file.dataset(&selection.dataset)?;
        let slabs = &selection.slabs;

        let window = match slabs[..] {
            [a, b, c] => dataset
                .read_slice::<f64, _, Ix3>(s![range(a), range(b), range(c)])?
                .into_dyn(),
            [a, b, c, d] => dataset
                .read_slice::<f64, _, Ix4>(s![range(a), range(b), range(c), range(d)])?
                .into_dyn(),
            _ => {
                return Err(Error::InvalidHyperslabSpec {
                    context: selection.dataset.clone(),
                    reason: f!("rank {} selection is not readable as a field", slabs.len()),
                })
            }
        };

        let stored_shape = window.shape().to_vec();

        // drop unit axes until two remain
        let mut window = window;
        while window.ndim() > 2 {
            let Some(unit) = window.shape().iter().position(|&n| n == 1) else {
                break;
            };
            window = window.index_axis_move(Axis(unit), 0);
        }

        let field = window
            .into_dimensionality::<Ix2>()
            .map_err(|_| Error::FieldShape {
                dataset: selection.dataset.clone(),
                shape: stored_shape.clone(),
            })?;

        match field.dim() {
            d if d == expected => Ok(field),
            (rows, cols) if (cols, rows) == expected => {
                warn!(
                    "field '{}' stored as {rows}x{cols}, transposing to match the geometry",
                    selection.dataset
                );
                Ok(field.reversed_axes())
            }
            _ => Err(Error::FieldShape {
                dataset: selection.dataset.clone(),
                shape: stored_shape,
            }),
        }
    }

    /// Read a stored scalar, accepting both 0-dimensional and length-1
    /// datasets
    pub fn read_scalar(&self, dataset: &str) -> Result<f64> {
        let ds = self.file.dataset(dataset)?;
        if ds.ndim() == 0 {
            return Ok(ds.read_scalar::<f64>()?);
        }
        let values = ds.read_raw::<f64>()?;
        values
            .first()
            .copied()
            .ok_or_else(|| {
                Error::Store(hdf5::Error::from(f!("dataset '{dataset}' is empty").as_str()))
            })
    }

    /// Evaluate the frame time from its resolved source
    pub fn time(&self, source: &TimeSource) -> Result<f64> {
        match source {
            TimeSource::Value(value) => Ok(*value),
            TimeSource::Difference { minuend, subtrahend } => {
                Ok(self.read_scalar(minuend)? - self.read_scalar(subtrahend)?)
            }
        }
    }
}

fn range(slab: Hyperslab) -> ndarray::Slice {
    ndarray::Slice::new(slab.start as isize, Some(slab.end() as isize), slab.stride as isize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array3};
    use tempfile::NamedTempFile;

    fn slab(count: usize) -> Hyperslab {
        Hyperslab { start: 0, stride: 1, count }
    }

    fn store_with<F>(fill: F) -> (NamedTempFile, Store)
    where
        F: FnOnce(&hdf5::File),
    {
        let file = NamedTempFile::new().unwrap();
        let h5 = hdf5::File::create(file.path()).unwrap();
        fill(&h5);
        drop(h5);
        let store = Store::open(file.path()).unwrap();
        (file, store)
    }

    #[test]
    fn coordinate_read_applies_stride_and_divisor() {
        let (_guard, store) = store_with(|h5| {
            let values = Array::from_iter((0..10).map(|i| i as f64 * 100.0));
            h5.new_dataset_builder()
                .with_data(&values)
                .create("/mesh/x_ef")
                .unwrap();
        });

        let selection = CoordinateSelection {
            dataset: "/mesh/x_ef".to_string(),
            slab: Hyperslab { start: 1, stride: 2, count: 4 },
            divisor: Some(100.0),
        };
        let values = store.read_coordinate(&selection).unwrap();
        assert_eq!(values, vec![1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn field_squeezes_leading_unit_axis() {
        let (_guard, store) = store_with(|h5| {
            let field = Array3::from_shape_fn((1, 4, 3), |(_, i, j)| (i * 3 + j) as f64);
            h5.new_dataset_builder()
                .with_data(&field)
                .create("/fluid/entropy")
                .unwrap();
        });

        let selection = FieldSelection {
            dataset: "/fluid/entropy".to_string(),
            slabs: vec![slab(1), slab(4), slab(3)],
        };
        let field = store.read_field(&selection, (4, 3)).unwrap();
        assert_eq!(field.dim(), (4, 3));
        assert_eq!(field[[2, 1]], 7.0);
    }

    #[test]
    fn transposed_field_is_swapped_back() {
        let (_guard, store) = store_with(|h5| {
            let field = Array3::from_shape_fn((1, 3, 4), |(_, i, j)| (i * 4 + j) as f64);
            h5.new_dataset_builder()
                .with_data(&field)
                .create("/fluid/entropy")
                .unwrap();
        });

        let selection = FieldSelection {
            dataset: "/fluid/entropy".to_string(),
            slabs: vec![slab(1), slab(3), slab(4)],
        };
        let field = store.read_field(&selection, (4, 3)).unwrap();
        assert_eq!(field.dim(), (4, 3));
        // value at stored [1, 2] lands at [2, 1]
        assert_eq!(field[[2, 1]], 6.0);
    }

    #[test]
    fn wrong_field_shape_is_an_error() {
        let (_guard, store) = store_with(|h5| {
            let field = Array3::from_shape_fn((2, 4, 3), |(k, i, j)| (k + i + j) as f64);
            h5.new_dataset_builder()
                .with_data(&field)
                .create("/fluid/entropy")
                .unwrap();
        });

        let selection = FieldSelection {
            dataset: "/fluid/entropy".to_string(),
            slabs: vec![slab(2), slab(4), slab(3)],
        };
        let error = store.read_field(&selection, (4, 3)).unwrap_err();
        assert!(matches!(error, Error::FieldShape { shape, .. } if shape == vec![2, 4, 3]));
    }

    #[test]
    fn time_difference_reads_two_scalars() {
        let (_guard, store) = store_with(|h5| {
            h5.new_dataset_builder()
                .with_data(&ndarray::arr1(&[14.5]))
                .create("/mesh/time")
                .unwrap();
            h5.new_dataset_builder()
                .with_data(&ndarray::arr1(&[2.0]))
                .create("/mesh/t_bounce")
                .unwrap();
        });

        let source = TimeSource::Difference {
            minuend: "/mesh/time".to_string(),
            subtrahend: "/mesh/t_bounce".to_string(),
        };
        assert_eq!(store.time(&source).unwrap(), 12.5);
        assert_eq!(store.time(&TimeSource::Value(3.0)).unwrap(), 3.0);
    }
}
