//! Coordinate input normalization.
//!
//! Callers hand points over in whatever shape they have: a single vector, a
//! list of vectors or triples, a flat array, or loosely typed JSON coming from
//! a scripting layer. Everything is normalized to a flat `[x0, y0, z0, x1, ...]`
//! array before any buffer is touched, so a malformed input never causes a
//! partial write.

use glam::DVec3;
use geoscene_core::{GeoSceneError, Result};
use serde_json::Value;

/// Point coordinates in any of the accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum PointInput {
    /// One point.
    Single(DVec3),
    /// A list of points.
    Points(Vec<DVec3>),
    /// A list of `[x, y, z]` triples.
    Triples(Vec<[f64; 3]>),
    /// A flat coordinate array whose length is a multiple of three.
    Flat(Vec<f64>),
    /// A JSON point `{x, y, z}`, an array of such objects, an array of
    /// triples, or a flat numeric array.
    Json(Value),
}

impl From<DVec3> for PointInput {
    fn from(point: DVec3) -> Self {
        Self::Single(point)
    }
}

impl From<Vec<DVec3>> for PointInput {
    fn from(points: Vec<DVec3>) -> Self {
        Self::Points(points)
    }
}

impl From<&[DVec3]> for PointInput {
    fn from(points: &[DVec3]) -> Self {
        Self::Points(points.to_vec())
    }
}

impl From<Vec<[f64; 3]>> for PointInput {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::Triples(points)
    }
}

impl From<Vec<f64>> for PointInput {
    fn from(coords: Vec<f64>) -> Self {
        Self::Flat(coords)
    }
}

impl From<&[f64]> for PointInput {
    fn from(coords: &[f64]) -> Self {
        Self::Flat(coords.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for PointInput {
    fn from(coords: [f64; N]) -> Self {
        Self::Flat(coords.to_vec())
    }
}

impl From<Value> for PointInput {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

fn shape_error(message: String) -> GeoSceneError {
    log::error!("invalid coordinate input: {message}");
    GeoSceneError::InvalidCoordinateShape(message)
}

fn json_number(value: &Value, what: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| shape_error(format!("{what} is not a number")))
}

fn json_object_point(map: &serde_json::Map<String, Value>, out: &mut Vec<f64>) -> Result<()> {
    for axis in ["x", "y", "z"] {
        let component = map
            .get(axis)
            .ok_or_else(|| shape_error(format!("point is missing '{axis}'")))?;
        out.push(json_number(component, axis)?);
    }
    Ok(())
}

fn json_flat(value: &Value) -> Result<Vec<f64>> {
    match value {
        Value::Object(map) => {
            let mut out = Vec::with_capacity(3);
            json_object_point(map, &mut out)?;
            Ok(out)
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len() * 3);
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Object(map) => json_object_point(map, &mut out)?,
                    Value::Array(triple) => {
                        if triple.len() != 3 {
                            return Err(shape_error(format!(
                                "point {i} has {} components",
                                triple.len()
                            )));
                        }
                        for component in triple {
                            out.push(json_number(component, "component")?);
                        }
                    }
                    number => out.push(json_number(number, "coordinate")?),
                }
            }
            Ok(out)
        }
        other => Err(shape_error(format!("unsupported coordinate value {other}"))),
    }
}

impl PointInput {
    /// Converts the input into a flat coordinate array.
    ///
    /// Fails if any component is missing or non-numeric, or if a flat array's
    /// length is not a multiple of three.
    pub fn to_flat(&self) -> Result<Vec<f64>> {
        let flat = match self {
            Self::Single(p) => p.to_array().to_vec(),
            Self::Points(points) => points.iter().flat_map(|p| p.to_array()).collect(),
            Self::Triples(triples) => triples.iter().flatten().copied().collect(),
            Self::Flat(coords) => coords.clone(),
            Self::Json(value) => json_flat(value)?,
        };
        if flat.len() % 3 != 0 {
            return Err(shape_error(format!(
                "{} coordinates is not a whole number of points",
                flat.len()
            )));
        }
        if let Some(bad) = flat.iter().position(|c| !c.is_finite()) {
            return Err(shape_error(format!("coordinate {bad} is not finite")));
        }
        Ok(flat)
    }

    /// Converts the input into points.
    pub fn to_points(&self) -> Result<Vec<DVec3>> {
        Ok(self
            .to_flat()?
            .chunks_exact(3)
            .map(|c| DVec3::new(c[0], c[1], c[2]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_all_shapes_normalize_alike() {
        let expected = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let inputs: Vec<PointInput> = vec![
            vec![DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, 5.0, 6.0)].into(),
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].into(),
            expected.clone().into(),
            json!([{ "x": 1, "y": 2, "z": 3 }, { "x": 4, "y": 5, "z": 6 }]).into(),
            json!([[1, 2, 3], [4, 5, 6]]).into(),
            json!([1, 2, 3, 4, 5, 6]).into(),
        ];
        for input in inputs {
            assert_eq!(input.to_flat().unwrap(), expected);
        }
        assert_eq!(
            PointInput::from(json!({ "x": 1.5, "y": 0, "z": -2 })).to_flat().unwrap(),
            [1.5, 0.0, -2.0]
        );
    }

    #[test]
    fn test_missing_component_rejected() {
        let input = PointInput::from(json!([{ "x": 1, "y": 2, "z": 3 }, { "x": 4, "y": 5 }]));
        assert!(matches!(
            input.to_flat(),
            Err(GeoSceneError::InvalidCoordinateShape(_))
        ));
    }

    #[test]
    fn test_bad_lengths_rejected() {
        assert!(PointInput::from(vec![1.0, 2.0]).to_flat().is_err());
        assert!(PointInput::from(json!([[1, 2]])).to_flat().is_err());
        assert!(PointInput::from(json!("1,2,3")).to_flat().is_err());
        assert!(PointInput::from(vec![1.0, f64::NAN, 3.0]).to_flat().is_err());
    }

    #[test]
    fn test_to_points() {
        let points = PointInput::from([0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).to_points().unwrap();
        assert_eq!(points, [DVec3::new(0.0, 1.0, 2.0), DVec3::new(3.0, 4.0, 5.0)]);
    }
}
