//! Shared fixtures for the end-to-end tests.

use cds_core::{Dimensions, Forcing, ModelEquations, RowMajorMatrix};
use thiserror::Error;

/// A falling unit mass whose mass matrix becomes singular once
/// `t > t_singular`.
///
/// The free-fall phase follows `y' = g t`, `y = g t² / 2`.
#[derive(Debug, Clone, Copy)]
pub struct VanishingMass {
    pub gravity: f64,
    pub t_singular: f64,
}

#[derive(Debug, Error)]
#[error("vanishing mass never fails on its own")]
pub struct Never;

impl ModelEquations for VanishingMass {
    type Error = Never;

    fn dimensions(&self) -> Dimensions {
        Dimensions::new(1, 0).expect("one coordinate without constraints")
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![0.0, 0.0]
    }

    fn state_labels(&self) -> Vec<String> {
        vec!["dy".into(), "y".into()]
    }

    fn mass_matrix(
        &self,
        t: f64,
        _x: &[f64],
        _u: &[f64],
        m: &mut RowMajorMatrix,
    ) -> Result<(), Self::Error> {
        m.set(0, 0, if t > self.t_singular { 0.0 } else { 1.0 });
        Ok(())
    }

    fn forcing(&self, _t: f64, _x: &[f64], _u: &[f64], f: &mut Forcing) -> Result<(), Self::Error> {
        f.c[0] = -self.gravity;
        Ok(())
    }
}

/// Parses CSV text into the header and numeric rows.
///
/// # Panics
///
/// Panics if the text is empty or a field is not a number.
#[must_use]
pub fn parse_csv(text: &str) -> (String, Vec<Vec<f64>>) {
    let mut lines = text.lines();
    let header = lines.next().expect("csv has a header").to_string();
    let rows = lines
        .map(|line| {
            line.split(',')
                .map(|field| field.parse().expect("numeric field"))
                .collect()
        })
        .collect();
    (header, rows)
}
