use crate::error::ConstructionError;
use crate::math::vec2::Vec2;

/// Geometric descriptor of a rigid body. Immutable once constructed; equality
/// compares the variant and its dimensions.
///
/// Polygonal variants are defined by a fixed local-space vertex layout centered
/// on the body's position; see [`local_vertices`](Self::local_vertices).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f64 },
    Box { width: f64, height: f64 },
    Triangle { width: f64, height: f64 },
    Pentagon { width: f64, height: f64 },
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConstructionError> {
    if value <= 0.0 {
        Err(ConstructionError::NonPositiveDimension { name, value })
    } else {
        Ok(value)
    }
}

impl Shape {
    pub fn circle(radius: f64) -> Result<Self, ConstructionError> {
        Ok(Shape::Circle {
            radius: positive("radius", radius)?,
        })
    }

    pub fn rect(width: f64, height: f64) -> Result<Self, ConstructionError> {
        Ok(Shape::Box {
            width: positive("width", width)?,
            height: positive("height", height)?,
        })
    }

    pub fn triangle(width: f64, height: f64) -> Result<Self, ConstructionError> {
        Ok(Shape::Triangle {
            width: positive("width", width)?,
            height: positive("height", height)?,
        })
    }

    pub fn pentagon(width: f64, height: f64) -> Result<Self, ConstructionError> {
        Ok(Shape::Pentagon {
            width: positive("width", width)?,
            height: positive("height", height)?,
        })
    }

    pub fn is_circle(&self) -> bool {
        matches!(self, Shape::Circle { .. })
    }

    /// Moment of inertia about the center of mass for a body of the given
    /// mass carrying this shape.
    pub fn rotational_inertia(&self, mass: f64) -> f64 {
        match *self {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Box { width, height } => mass * (width * width + height * height) / 12.0,
            Shape::Pentagon { width, height } => mass * (width * width + height * height) / 8.0,
            Shape::Triangle { width, height } => mass * (width * width + height * height) / 24.0,
        }
    }

    /// Reference vertices in local space, before the body's rotation and
    /// translation are applied. `None` for circles, which have no vertex list.
    pub fn local_vertices(&self) -> Option<Vec<Vec2>> {
        match *self {
            Shape::Circle { .. } => None,
            Shape::Box { width, height } => {
                let left = -width / 2.0;
                let right = left + width;
                let top = -height / 2.0;
                let bottom = top + height;
                Some(vec![
                    Vec2::new(left, top),
                    Vec2::new(right, top),
                    Vec2::new(right, bottom),
                    Vec2::new(left, bottom),
                ])
            }
            Shape::Triangle { width, height } => {
                // The apex sits two thirds of the height above the base so the
                // centroid lands on the body position.
                let left = -width / 2.0;
                let right = left + width;
                let top = -height / 3.0 * 2.0;
                let bottom = top + height;
                Some(vec![
                    Vec2::new(0.0, top),
                    Vec2::new(right, bottom),
                    Vec2::new(left, bottom),
                ])
            }
            Shape::Pentagon { height, .. } => {
                let apex = Vec2::new(0.0, -height / 2.0);
                Some(
                    (0..5)
                        .map(|k| apex.rotate((72.0 * k as f64).to_radians()))
                        .collect(),
                )
            }
        }
    }
}
