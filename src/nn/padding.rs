//! Padding modes and the window arithmetic shared by convolution and pooling.

use crate::error::{NnError, Result};
use std::fmt;
use std::str::FromStr;

/// How out-of-bounds window positions are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// No padding: windows never leave the input.
    #[default]
    Valid,
    /// Output size `ceil(in / stride)`; the input is padded so that every
    /// output position has a window, odd surplus going to the bottom/right.
    Same,
}

impl FromStr for Padding {
    type Err = NnError;

    fn from_str(mode: &str) -> Result<Self> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "valid" => Ok(Padding::Valid),
            "same" => Ok(Padding::Same),
            other => Err(NnError::config(format!(
                "unknown padding mode '{}' (expected 'valid' or 'same')",
                other
            ))),
        }
    }
}

impl fmt::Display for Padding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Padding::Valid => f.write_str("valid"),
            Padding::Same => f.write_str("same"),
        }
    }
}

/// Output extent and leading pad along one spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisWindow {
    pub output: usize,
    /// Padding before the first input element. The trailing pad is implied.
    pub pad_before: usize,
}

impl Padding {
    /// Computes the output length and leading pad of one axis.
    ///
    /// `None` when no window fits: a zero kernel or stride, or an input
    /// shorter than the kernel under `valid` padding.
    pub fn axis(self, input: usize, kernel: usize, stride: usize) -> Option<AxisWindow> {
        if kernel == 0 || stride == 0 {
            return None;
        }
        match self {
            Padding::Valid => {
                if input < kernel {
                    return None;
                }
                Some(AxisWindow {
                    output: (input - kernel) / stride + 1,
                    pad_before: 0,
                })
            }
            Padding::Same => {
                let output = (input + stride - 1) / stride;
                let total = ((output - 1) * stride + kernel).saturating_sub(input);
                Some(AxisWindow {
                    output,
                    pad_before: total / 2,
                })
            }
        }
    }
}

/// Two-dimensional window placement over an HWC input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub rows: AxisWindow,
    pub cols: AxisWindow,
}

impl WindowGeometry {
    pub fn new(
        padding: Padding,
        input: (usize, usize),
        size: [usize; 2],
        stride: [usize; 2],
        context: &str,
    ) -> Result<Self> {
        if size.contains(&0) || stride.contains(&0) {
            return Err(NnError::config(format!(
                "{} size {:?} and stride {:?} must be positive",
                context, size, stride
            )));
        }
        let rows = padding.axis(input.0, size[0], stride[0]);
        let cols = padding.axis(input.1, size[1], stride[1]);
        match (rows, cols) {
            (Some(rows), Some(cols)) => Ok(Self { rows, cols }),
            _ => Err(NnError::shape(
                context,
                format!("spatial size of at least {:?} for 'valid' padding", size),
                format!("{:?}", [input.0, input.1]),
            )),
        }
    }

    pub fn output(&self) -> (usize, usize) {
        (self.rows.output, self.cols.output)
    }

    /// Input coordinate read by kernel offset `(dy, dx)` at output `(oy, ox)`,
    /// or `None` if it falls into the padding.
    pub fn source(
        &self,
        out: (usize, usize),
        offset: (usize, usize),
        stride: [usize; 2],
        input: (usize, usize),
    ) -> Option<(usize, usize)> {
        let y = (out.0 * stride[0] + offset.0).checked_sub(self.rows.pad_before)?;
        let x = (out.1 * stride[1] + offset.1).checked_sub(self.cols.pad_before)?;
        if y < input.0 && x < input.1 {
            Some((y, x))
        } else {
            None
        }
    }
}

/// Validates a `[height, width]` size or stride given as a list.
pub fn window_pair(values: &[usize], what: &str) -> Result<[usize; 2]> {
    match values {
        [h, w] if *h > 0 && *w > 0 => Ok([*h, *w]),
        [_, _] => Err(NnError::config(format!(
            "{} must be positive, got {:?}",
            what, values
        ))),
        _ => Err(NnError::config(format!(
            "{} needs exactly 2 components, got {}",
            what,
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("valid".parse::<Padding>().unwrap(), Padding::Valid);
        assert_eq!("SAME".parse::<Padding>().unwrap(), Padding::Same);
        assert!(matches!("full".parse::<Padding>(), Err(NnError::Configuration(_))));
    }

    #[test]
    fn test_valid_axis() {
        let w = Padding::Valid.axis(5, 3, 1).unwrap();
        assert_eq!(w, AxisWindow { output: 3, pad_before: 0 });
        assert_eq!(Padding::Valid.axis(5, 2, 2).unwrap().output, 2);
        assert!(Padding::Valid.axis(2, 3, 1).is_none());
    }

    #[test]
    fn test_same_axis_puts_surplus_on_trailing_edge() {
        // total pad 1: nothing before, one after
        assert_eq!(
            Padding::Same.axis(4, 2, 1).unwrap(),
            AxisWindow { output: 4, pad_before: 0 }
        );
        // total pad 2: split evenly
        assert_eq!(
            Padding::Same.axis(5, 3, 1).unwrap(),
            AxisWindow { output: 5, pad_before: 1 }
        );
        // ceil(5/2) = 3 outputs, total pad (3-1)*2+3-5 = 2
        assert_eq!(
            Padding::Same.axis(5, 3, 2).unwrap(),
            AxisWindow { output: 3, pad_before: 1 }
        );
        // total pad 3: one before, two after
        assert_eq!(
            Padding::Same.axis(4, 4, 1).unwrap(),
            AxisWindow { output: 4, pad_before: 1 }
        );
    }

    #[test]
    fn test_same_axis_never_negative_pad() {
        assert_eq!(
            Padding::Same.axis(6, 2, 3).unwrap(),
            AxisWindow { output: 2, pad_before: 0 }
        );
    }

    #[test]
    fn test_source_skips_padding() {
        let geo = WindowGeometry::new(Padding::Same, (3, 3), [3, 3], [1, 1], "test").unwrap();
        assert_eq!(geo.source((0, 0), (0, 0), [1, 1], (3, 3)), None);
        assert_eq!(geo.source((0, 0), (1, 1), [1, 1], (3, 3)), Some((0, 0)));
        assert_eq!(geo.source((2, 2), (2, 2), [1, 1], (3, 3)), None);
    }

    #[test]
    fn test_zero_stride_or_kernel_has_no_window() {
        assert_eq!(Padding::Same.axis(4, 2, 0), None);
        assert_eq!(Padding::Valid.axis(4, 0, 1), None);
        assert!(matches!(
            WindowGeometry::new(Padding::Same, (4, 4), [2, 2], [0, 1], "MaxPooling2D"),
            Err(NnError::Configuration(_))
        ));
    }

    #[test]
    fn test_window_pair() {
        assert_eq!(window_pair(&[2, 3], "size").unwrap(), [2, 3]);
        assert!(matches!(window_pair(&[2], "size"), Err(NnError::Configuration(_))));
        assert!(window_pair(&[2, 2, 2], "size").is_err());
        assert!(window_pair(&[0, 2], "stride").is_err());
    }
}
