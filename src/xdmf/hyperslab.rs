//! Hyperslab selections and the two supported function expressions
//!
//! A hyperslab is a strided rectangular selection into a stored array,
//! written as three integers (start, stride, count) per dimension. The
//! index format also allows a `DataItem` to be wrapped in a Function node;
//! only two forms ever appear and only those two are supported:
//!
//! - `$0/<divisor>` - elementwise division of a coordinate array
//! - `$0-$1` - scalar difference of two stored values (bounce time)
//!
//! A general expression grammar is deliberately out of scope.

use nom::bytes::complete::tag;
use nom::character::complete::{digit1, multispace0};
use nom::combinator::{all_consuming, map_res};
use nom::sequence::{delimited, preceded};
use nom::IResult;

use crate::error::{Error, Result};
use crate::utils::f;

/// A strided selection along one array dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperslab {
    pub start: usize,
    pub stride: usize,
    pub count: usize,
}

impl Hyperslab {
    /// Exclusive end of the selection, `start + stride * count`
    pub fn end(&self) -> usize {
        self.start + self.stride * self.count
    }
}

/// Parse a whitespace-separated `start stride count` triple
pub fn parse_triple(text: &str, context: &str) -> Result<Hyperslab> {
    let values = text
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<core::result::Result<Vec<usize>, _>>()
        .map_err(|_| Error::InvalidHyperslabSpec {
            context: context.to_string(),
            reason: f!("'{}' is not a whitespace-separated integer triple", text.trim()),
        })?;

    match values[..] {
        [start, stride, count] => Ok(Hyperslab { start, stride, count }),
        _ => Err(Error::InvalidHyperslabSpec {
            context: context.to_string(),
            reason: f!("expected 3 integers, found {}", values.len()),
        }),
    }
}

/// Decode an attribute's flat hyperslab spec into per-dimension selections
///
/// The `Dimensions` attribute declares `3 <rank>`; the element text holds
/// the three rows (starts, strides, counts) flattened row-major.
pub fn decode_flat(dimensions: &str, text: &str, context: &str) -> Result<Vec<Hyperslab>> {
    let bad = |reason: String| Error::InvalidHyperslabSpec {
        context: context.to_string(),
        reason,
    };

    let declared = dimensions
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<core::result::Result<Vec<usize>, _>>()
        .map_err(|_| bad(f!("Dimensions '{dimensions}' is not an integer sequence")))?;

    let values = text
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<core::result::Result<Vec<usize>, _>>()
        .map_err(|_| bad(f!("'{}' is not an integer sequence", text.trim())))?;

    // rank comes from the declared "3 N" pair when present, else the length
    let rank = match declared[..] {
        [rows, rank] if rows == 3 => rank,
        _ if values.len() % 3 == 0 => values.len() / 3,
        _ => return Err(bad(f!("Dimensions '{dimensions}' does not describe 3 rows"))),
    };

    if rank == 0 || values.len() != 3 * rank {
        return Err(bad(f!(
            "expected {} integers for rank {rank}, found {}",
            3 * rank,
            values.len()
        )));
    }

    Ok((0..rank)
        .map(|dim| Hyperslab {
            start: values[dim],
            stride: values[rank + dim],
            count: values[2 * rank + dim],
        })
        .collect())
}

fn divisor(i: &str) -> IResult<&str, f64> {
    map_res(preceded(tag("$0/"), digit1), |d: &str| d.parse::<f64>())(i)
}

/// Extract the divisor from a `$0/<n>` function expression
pub fn parse_divisor(expression: &str) -> Option<f64> {
    all_consuming(delimited(multispace0, divisor, multispace0))(expression)
        .ok()
        .map(|(_, value)| value)
}

/// Recognise the `$0-$1` two-operand subtraction expression
pub fn is_difference(expression: &str) -> bool {
    all_consuming::<_, _, nom::error::Error<&str>, _>(delimited(
        multispace0,
        tag("$0-$1"),
        multispace0,
    ))(expression)
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn triple_parses_and_validates() {
        let slab = parse_triple("0 1 722", "test").unwrap();
        assert_eq!(slab, Hyperslab { start: 0, stride: 1, count: 722 });
        assert_eq!(slab.end(), 722);
        assert!(parse_triple("0 1", "test").is_err());
        assert!(parse_triple("0 1 a", "test").is_err());
    }

    #[test]
    fn strided_end() {
        let slab = Hyperslab { start: 2, stride: 3, count: 5 };
        assert_eq!(slab.end(), 17);
    }

    #[test]
    fn flat_decode_rank_three() {
        let slabs = decode_flat("3 3", "0 0 0  1 1 1  1 722 240", "test").unwrap();
        assert_eq!(
            slabs,
            vec![
                Hyperslab { start: 0, stride: 1, count: 1 },
                Hyperslab { start: 0, stride: 1, count: 722 },
                Hyperslab { start: 0, stride: 1, count: 240 },
            ]
        );
    }

    #[test]
    fn flat_decode_rank_four() {
        let text = "0 0 0 0  1 1 1 1  1 2 722 240";
        let slabs = decode_flat("3 4", text, "test").unwrap();
        assert_eq!(slabs.len(), 4);
        assert_eq!(slabs[3], Hyperslab { start: 0, stride: 1, count: 240 });
    }

    #[rstest]
    #[case("3 3", "0 0 1 1")] // not 3*rank values
    #[case("3 3", "0 0 0 1 1 1 1 722 x")] // non-integer
    #[case("2 4", "0 0 0 0 1 1 1 1")] // first token not 3 rows
    fn flat_decode_rejects_malformed(#[case] dims: &str, #[case] text: &str) {
        assert!(decode_flat(dims, text, "test").is_err());
    }

    #[rstest]
    #[case("$0/1000", Some(1000.0))]
    #[case(" $0/6 ", Some(6.0))]
    #[case("$1/10", None)]
    #[case("$0*3", None)]
    #[case("$0/", None)]
    fn divisor_expressions(#[case] expr: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_divisor(expr), expected);
    }

    #[test]
    fn difference_expression() {
        assert!(is_difference("$0-$1"));
        assert!(is_difference(" $0-$1 "));
        assert!(!is_difference("$0+$1"));
        assert!(!is_difference("$0-$1-$2"));
    }
}
