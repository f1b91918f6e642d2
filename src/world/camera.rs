use glam::Vec2;
use thiserror::Error;

/// Player view-point on the maze plane.
///
/// * Only **yaw** (heading) is simulated – the maze is flat, no pitch.
/// * `pos` is in map cells: `(x, y)` = `(column, row)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub pos: Vec2,
    pub yaw: f32, // radians (0 = +X, counter-clockwise)
}

/// Per-frame projection parameters shared by the ray caster and renderers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    /// Horizontal field of view in radians.
    pub fov: f32,
    /// Rays give up after this many map units.
    pub max_render_dist: f32,
    /// Raymarch step length in map units.
    pub precision: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov: 60_f32.to_radians(),
            max_render_dist: 32.0,
            precision: 0.01,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
}

impl CameraParams {
    /// Checked constructor; every field must be finite and `> 0`.
    pub fn new(fov: f32, max_render_dist: f32, precision: f32) -> Result<Self, ParamsError> {
        for (name, value) in [
            ("fov", fov),
            ("max_render_dist", max_render_dist),
            ("precision", precision),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ParamsError::NotPositive { name, value });
            }
        }
        Ok(Self {
            fov,
            max_render_dist,
            precision,
        })
    }

    /// Upper bound on raymarch iterations for a single ray.
    ///
    /// Zero when the distance or step is not a finite positive number, so
    /// a ray never marches forever.
    #[inline]
    pub fn max_steps(&self) -> usize {
        let steps = self.max_render_dist / self.precision;
        if self.precision > 0.0 && steps.is_finite() && steps > 0.0 {
            steps.ceil() as usize
        } else {
            0
        }
    }
}

impl Camera {
    pub fn new(pos: Vec2, yaw: f32) -> Self {
        Self { pos, yaw }
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks.
    #[inline(always)]
    pub fn forward(self) -> Vec2 {
        Vec2::from_angle(self.yaw)
    }

    /// Unit vector pointing to the camera's right (forward rotated by -90°).
    #[inline(always)]
    pub fn right(self) -> Vec2 {
        let f = self.forward();
        Vec2::new(f.y, -f.x)
    }

    /// Half of the projection plane for horizontal FoV `fov`.
    ///
    /// `forward - half_plane` is the leftmost ray, `forward + half_plane`
    /// the rightmost one.
    #[inline]
    pub fn half_plane(self, fov: f32) -> Vec2 {
        self.right() * (fov * 0.5).tan()
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` units and `side` (strafe, + right).
    pub fn step(&mut self, forward: f32, side: f32) {
        self.pos += self.forward() * forward + self.right() * side;
    }

    /// Rotate in place (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = Camera::new(Vec2::ZERO, 0.3);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!(f.dot(r).abs() < 1e-5);
    }

    #[test]
    fn right_is_clockwise_of_forward() {
        let cam = Camera::new(Vec2::ZERO, FRAC_PI_2);
        // facing +Y, right hand points to +X
        assert!((cam.right() - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn half_plane_at_90_deg_is_unit() {
        let cam = Camera::new(Vec2::ZERO, 0.0);
        assert!((cam.half_plane(FRAC_PI_2).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn turn_wraps_into_range() {
        let mut cam = Camera::new(Vec2::ZERO, 0.1);
        cam.turn(-0.2);
        assert!(cam.yaw > 6.0 && cam.yaw < std::f32::consts::TAU);
    }

    #[test]
    fn step_moves_along_heading() {
        let mut cam = Camera::new(Vec2::new(1.0, 1.0), 0.0);
        cam.step(2.0, 0.5);
        assert!((cam.pos - Vec2::new(3.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn max_steps_rounds_up() {
        let params = CameraParams {
            fov: 1.0,
            max_render_dist: 1.0,
            precision: 0.3,
        };
        assert_eq!(params.max_steps(), 4);
    }

    #[test]
    fn new_rejects_non_positive_values() {
        assert!(CameraParams::new(1.0, 32.0, 0.01).is_ok());
        assert_eq!(
            CameraParams::new(1.0, 32.0, 0.0),
            Err(ParamsError::NotPositive {
                name: "precision",
                value: 0.0
            })
        );
        assert!(CameraParams::new(1.0, -4.0, 0.01).is_err());
        assert!(CameraParams::new(f32::NAN, 32.0, 0.01).is_err());
        assert!(CameraParams::new(1.0, f32::INFINITY, 0.01).is_err());
    }

    #[test]
    fn degenerate_params_have_no_steps() {
        let zero = CameraParams {
            precision: 0.0,
            ..CameraParams::default()
        };
        assert_eq!(zero.max_steps(), 0);
        let negative = CameraParams {
            precision: -0.5,
            ..CameraParams::default()
        };
        assert_eq!(negative.max_steps(), 0);
        let nan = CameraParams {
            max_render_dist: f32::NAN,
            ..CameraParams::default()
        };
        assert_eq!(nan.max_steps(), 0);
    }
}
