//! Measurements in world space: best-fit plane, length and area.

use geoscene_core::{DVec3, Plane};
use nalgebra::Matrix3;

use super::{PointSequence, Shape};

impl PointSequence {
    /// World positions excluding a closing duplicate.
    fn user_points(&self) -> Vec<DVec3> {
        let mut points = self.points();
        points.truncate(self.user_point_count());
        points
    }

    /// Least-squares plane through the points.
    ///
    /// The normal is the eigenvector of the point covariance with the smallest
    /// eigenvalue, oriented so its largest component is positive. Returns
    /// `None` for fewer than three points.
    #[must_use]
    pub fn plane(&self) -> Option<Plane> {
        let points = self.user_points();
        if points.len() < 3 {
            log::warn!(
                "'{}' has {} points, a plane needs at least three",
                self.name,
                points.len()
            );
            return None;
        }
        let centroid = points.iter().copied().sum::<DVec3>() / points.len() as f64;
        let mut covariance = Matrix3::<f64>::zeros();
        for p in &points {
            let d = nalgebra::Vector3::new(p.x - centroid.x, p.y - centroid.y, p.z - centroid.z);
            covariance += d * d.transpose();
        }
        covariance /= points.len() as f64;

        let eigen = covariance.symmetric_eigen();
        let column = eigen.eigenvectors.column(eigen.eigenvalues.imin());
        let mut normal = DVec3::new(column[0], column[1], column[2]);
        let a = normal.abs();
        let dominant = if a.x >= a.y && a.x >= a.z {
            normal.x
        } else if a.y >= a.z {
            normal.y
        } else {
            normal.z
        };
        if dominant < 0.0 {
            normal = -normal;
        }
        Some(Plane::from_normal_and_point(normal, centroid))
    }

    /// Total length of the segments; zero for point clouds.
    #[must_use]
    pub fn length(&self) -> f64 {
        if self.shape == Shape::PointCloud {
            return 0.0;
        }
        self.points()
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// Area of the polygon formed by a polyline, measured on its best-fit
    /// plane. An open polyline is treated as implicitly closed.
    #[must_use]
    pub fn area(&self) -> f64 {
        if self.shape != Shape::Polyline {
            return 0.0;
        }
        let points = self.user_points();
        if points.len() < 3 {
            return 0.0;
        }
        let Some(plane) = self.plane() else {
            return 0.0;
        };
        let u = plane.normal.any_orthonormal_vector();
        let v = plane.normal.cross(u);
        // project relative to the centroid so survey-sized coordinates keep precision
        let centroid = points.iter().copied().sum::<DVec3>() / points.len() as f64;
        let projected: Vec<(f64, f64)> = points
            .iter()
            .map(|p| {
                let d = *p - centroid;
                (d.dot(u), d.dot(v))
            })
            .collect();
        let twice: f64 = projected
            .iter()
            .zip(projected.iter().cycle().skip(1))
            .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
            .sum();
        twice.abs() * 0.5
    }
}
