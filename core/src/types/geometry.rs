use regex::Regex;
use std::sync::OnceLock;

/// Parses every decimal number in a DS string
///
/// Accepts `\`-separated DICOM values as well as space or comma separated
/// lists, including exponential notation.
pub fn parse_decimals(s: &str) -> Vec<f64> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| {
        Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").expect("Failed to compile regex")
    });

    re.find_iter(s)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Patient-space position of the first voxel (ImagePositionPatient)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub [f64; 3]);

impl Position {
    /// Parses exactly three decimals
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not hold three numbers
    pub fn parse(s: &str) -> Result<Self, String> {
        let values = parse_decimals(s);
        match values.as_slice() {
            [x, y, z] => Ok(Position([*x, *y, *z])),
            _ => Err(format!("Failed to parse position from '{}'", s)),
        }
    }
}

/// Row and column direction cosines (ImageOrientationPatient)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub row: [f64; 3],
    pub col: [f64; 3],
}

impl Orientation {
    /// Parses exactly six decimals
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not hold six numbers
    pub fn parse(s: &str) -> Result<Self, String> {
        let values = parse_decimals(s);
        match values.as_slice() {
            [r0, r1, r2, c0, c1, c2] => Ok(Orientation {
                row: [*r0, *r1, *r2],
                col: [*c0, *c1, *c2],
            }),
            _ => Err(format!("Failed to parse orientation from '{}'", s)),
        }
    }

    /// Slice normal: row × col
    pub fn normal(&self) -> [f64; 3] {
        let (r, c) = (self.row, self.col);
        [
            r[1] * c[2] - r[2] * c[1],
            r[2] * c[0] - r[0] * c[2],
            r[0] * c[1] - r[1] * c[0],
        ]
    }

    /// Component-wise equality within `tolerance`
    pub fn approx_eq(&self, other: &Orientation, tolerance: f64) -> bool {
        self.row
            .iter()
            .chain(self.col.iter())
            .zip(other.row.iter().chain(other.col.iter()))
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// Signed distance of `position` along `normal`
pub fn distance_along(normal: &[f64; 3], position: &Position) -> f64 {
    normal
        .iter()
        .zip(position.0.iter())
        .map(|(n, p)| n * p)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0.1\\0.1", vec![0.1, 0.1])]
    #[case("-12.5\\3\\1.5e+1", vec![-12.5, 3.0, 15.0])]
    #[case("[1, 0, 0]", vec![1.0, 0.0, 0.0])]
    #[case("", vec![])]
    fn test_parse_decimals(#[case] input: &str, #[case] expected: Vec<f64>) {
        assert_eq!(parse_decimals(input), expected);
    }

    #[test]
    fn test_position_requires_three_values() {
        assert_eq!(
            Position::parse("1\\2\\3").unwrap(),
            Position([1.0, 2.0, 3.0])
        );
        assert!(Position::parse("1\\2").is_err());
        assert!(Position::parse("garbage").is_err());
    }

    #[test]
    fn test_axial_normal() {
        let o = Orientation::parse("1\\0\\0\\0\\1\\0").unwrap();
        assert_eq!(o.normal(), [0.0, 0.0, 1.0]);
        assert_eq!(distance_along(&o.normal(), &Position([5.0, 6.0, -7.5])), -7.5);
        assert!(Orientation::parse("1\\0\\0\\0\\1").is_err());
    }

    #[test]
    fn test_orientation_tolerance() {
        let a = Orientation::parse("1\\0\\0\\0\\1\\0").unwrap();
        let b = Orientation::parse("1\\0.00001\\0\\0\\1\\0").unwrap();
        let c = Orientation::parse("0\\1\\0\\0\\0\\-1").unwrap();
        assert!(a.approx_eq(&b, 1e-4));
        assert!(!a.approx_eq(&c, 1e-4));
    }
}
