//! Unitary matrices attached to gates for simulation and verification.
//!
//! A gate's unitary is never used for execution. It fixes the number of
//! qubits the gate acts on, which gate validation enforces against every
//! registered implementation.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Tolerance for the unitarity check.
const EPSILON: f64 = 1e-10;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A `2^n x 2^n` unitary matrix in row-major order.
///
/// Serializes as the flat list of elements; deserialization runs the same
/// checks as [`Unitary::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Complex64>", into = "Vec<Complex64>")]
pub struct Unitary {
    num_qubits: usize,
    data: Vec<Complex64>,
}

impl Unitary {
    /// Create a unitary from row-major elements.
    ///
    /// Fails unless the matrix is square, its dimension is a power of two
    /// (at least 2), and `U * U^dagger = I` within tolerance.
    pub fn new(data: Vec<Complex64>) -> GateResult<Self> {
        let dim = data.len().isqrt();
        if dim * dim != data.len() {
            return Err(GateError::InvalidUnitary(format!(
                "{} elements do not form a square matrix",
                data.len()
            )));
        }
        if dim < 2 || !dim.is_power_of_two() {
            return Err(GateError::InvalidUnitary(format!(
                "dimension {dim} is not a power of two"
            )));
        }

        let unitary = Self {
            num_qubits: dim.trailing_zeros() as usize,
            data,
        };
        if !unitary.is_unitary() {
            return Err(GateError::InvalidUnitary("matrix is not unitary".into()));
        }
        Ok(unitary)
    }

    fn from_real(values: &[f64]) -> Self {
        let dim = values.len().isqrt();
        Self {
            num_qubits: dim.trailing_zeros() as usize,
            data: values.iter().map(|&v| Complex64::new(v, 0.0)).collect(),
        }
    }

    /// Pauli-X.
    pub fn x() -> Self {
        Self::from_real(&[0.0, 1.0, 1.0, 0.0])
    }

    /// Pauli-Y.
    pub fn y() -> Self {
        Self {
            num_qubits: 1,
            data: vec![ZERO, Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0), ZERO],
        }
    }

    /// Pauli-Z.
    pub fn z() -> Self {
        Self::from_real(&[1.0, 0.0, 0.0, -1.0])
    }

    /// Hadamard.
    pub fn h() -> Self {
        let s = 1.0 / 2.0_f64.sqrt();
        Self::from_real(&[s, s, s, -s])
    }

    /// Controlled-Z.
    pub fn cz() -> Self {
        #[rustfmt::skip]
        let values = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, -1.0,
        ];
        Self::from_real(&values)
    }

    /// Number of qubits the matrix acts on.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Matrix dimension (`2^num_qubits`).
    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// Element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<Complex64> {
        let dim = self.dim();
        (row < dim && col < dim).then(|| self.data[row * dim + col])
    }

    /// Check `U * U^dagger = I` within tolerance.
    pub fn is_unitary(&self) -> bool {
        let dim = self.dim();
        (0..dim).all(|i| {
            (0..dim).all(|j| {
                let dot: Complex64 = (0..dim)
                    .map(|k| self.data[i * dim + k] * self.data[j * dim + k].conj())
                    .sum();
                let expected = if i == j { ONE } else { ZERO };
                (dot - expected).norm() < EPSILON
            })
        })
    }
}

impl TryFrom<Vec<Complex64>> for Unitary {
    type Error = GateError;

    fn try_from(data: Vec<Complex64>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<Unitary> for Vec<Complex64> {
    fn from(unitary: Unitary) -> Self {
        unitary.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_unitaries() {
        for (u, n) in [
            (Unitary::x(), 1),
            (Unitary::y(), 1),
            (Unitary::z(), 1),
            (Unitary::h(), 1),
            (Unitary::cz(), 2),
        ] {
            assert!(u.is_unitary());
            assert_eq!(u.num_qubits(), n);
        }
        assert_eq!(Unitary::cz().get(3, 3), Some(Complex64::new(-1.0, 0.0)));
        assert_eq!(Unitary::cz().get(4, 0), None);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(Unitary::new(vec![ONE; 3]).is_err());
        assert!(Unitary::new(vec![ONE]).is_err());
        assert!(Unitary::new(vec![ONE; 9]).is_err());
    }

    #[test]
    fn test_rejects_non_unitary() {
        let err = Unitary::new(vec![ONE, ONE, ZERO, ONE]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_deserialize_validates() {
        let x: Unitary =
            serde_json::from_str("[[0.0,0.0],[1.0,0.0],[1.0,0.0],[0.0,0.0]]").unwrap();
        assert_eq!(x, Unitary::x());
        assert_eq!(
            serde_json::to_string(&Unitary::z()).unwrap(),
            "[[1.0,0.0],[0.0,0.0],[0.0,0.0],[-1.0,0.0]]"
        );

        assert!(serde_json::from_str::<Unitary>("[[1.0,0.0]]").is_err());
        assert!(serde_json::from_str::<Unitary>("[[1.0,0.0],[1.0,0.0],[0.0,0.0],[1.0,0.0]]").is_err());
        assert!(serde_json::from_str::<Unitary>(r#"{"num_qubits":3,"data":[[1.0,0.0]]}"#).is_err());
    }

    #[test]
    fn test_accepts_valid_matrix() {
        let u = Unitary::new(vec![ZERO, ONE, ONE, ZERO]).unwrap();
        assert_eq!(u, Unitary::x());
    }
}
