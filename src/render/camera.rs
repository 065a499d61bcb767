use crate::config::CameraConfig;
use glam::{Mat4, Vec3};
use std::f32::consts::PI;

const MIN_POLAR: f32 = 1e-4;
const MIN_DISTANCE: f32 = 1e-3;
const ZOOM_STEP: f32 = 0.95;
const REST_EPSILON: f32 = 1e-5;

/// Orbit/pan/zoom camera circling a target point, with optional inertia.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    fov_y: f32,
    near: f32,
    far: f32,
    aspect: f32,
    damping: f32,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    zoom_scale: f32,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let target = Vec3::from(config.target);
        let offset = Vec3::from(config.position) - target;
        let radius = offset.length().max(MIN_DISTANCE);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        Self {
            target,
            radius,
            theta,
            phi,
            fov_y: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            aspect: sanitize_aspect(aspect),
            damping: config.damping.clamp(0.0, 1.0),
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            zoom_scale: 1.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_phi * self.theta.sin(),
                    self.phi.cos(),
                    sin_phi * self.theta.cos(),
                )
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = sanitize_aspect(width as f32 / height as f32);
        }
    }

    /// Drag by `dx`/`dy` pixels; a full viewport height turns one revolution.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.delta_theta -= 2.0 * PI * dx / height;
        self.delta_phi -= 2.0 * PI * dy / height;
    }

    /// Screen-space pan; the point under the cursor at target depth follows it.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let target_distance = self.radius * (self.fov_y / 2.0).tan();
        let view = self.view_matrix().inverse();
        let right = view.x_axis.truncate();
        let up = view.y_axis.truncate();
        let scale = 2.0 * target_distance / height;
        self.pan_offset += -right * dx * scale + up * dy * scale;
    }

    /// Positive steps move towards the target.
    pub fn zoom(&mut self, steps: f32) {
        self.zoom_scale *= ZOOM_STEP.powf(steps);
    }

    /// Applies accumulated input. With damping the motion carries on and decays
    /// over following frames; returns whether the camera is still moving.
    pub fn update(&mut self, dt: f32) -> bool {
        let blend = if self.damping > 0.0 {
            // Normalized to a 60 Hz frame so inertia feels the same at any rate.
            1.0 - (1.0 - self.damping).powf((dt * 60.0).max(0.0))
        } else {
            1.0
        };

        self.theta += self.delta_theta * blend;
        self.phi = (self.phi + self.delta_phi * blend).clamp(MIN_POLAR, PI - MIN_POLAR);
        self.target += self.pan_offset * blend;
        self.radius = (self.radius * self.zoom_scale).clamp(MIN_DISTANCE, self.far);
        self.zoom_scale = 1.0;

        let keep = 1.0 - blend;
        self.delta_theta *= keep;
        self.delta_phi *= keep;
        self.pan_offset *= keep;
        if self.delta_theta.abs() < REST_EPSILON {
            self.delta_theta = 0.0;
        }
        if self.delta_phi.abs() < REST_EPSILON {
            self.delta_phi = 0.0;
        }
        if self.pan_offset.length_squared() < REST_EPSILON * REST_EPSILON {
            self.pan_offset = Vec3::ZERO;
        }
        self.is_moving()
    }

    pub fn is_moving(&self) -> bool {
        self.delta_theta != 0.0 || self.delta_phi != 0.0 || self.pan_offset != Vec3::ZERO
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::OrbitCamera;
    use crate::config::CameraConfig;
    use glam::Vec3;

    fn camera(damping: f32) -> OrbitCamera {
        let config = CameraConfig {
            damping,
            ..CameraConfig::default()
        };
        OrbitCamera::new(&config, 16.0 / 9.0)
    }

    #[test]
    fn starts_at_the_configured_position() {
        let camera = camera(0.0);
        assert!(camera.eye().abs_diff_eq(Vec3::new(1.2, 2.0, 1.4), 1e-4));
        assert!(camera
            .view_projection()
            .to_cols_array()
            .iter()
            .all(|value| value.is_finite()));
    }

    #[test]
    fn rotation_keeps_distance_and_finite_values() {
        let mut camera = camera(0.0);
        let distance = camera.distance();
        camera.rotate(120.0, -45.0, 720.0);
        assert!(!camera.update(1.0 / 60.0));
        assert!((camera.eye().distance(camera.target) - distance).abs() < 1e-4);
        assert!(camera.eye().is_finite());
    }

    #[test]
    fn polar_angle_is_clamped_at_the_poles() {
        let mut camera = camera(0.0);
        camera.rotate(0.0, 10_000.0, 100.0);
        camera.update(1.0 / 60.0);
        let eye = camera.eye();
        assert!(eye.is_finite());
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn zoom_in_moves_closer() {
        let mut camera = camera(0.0);
        let before = camera.distance();
        camera.zoom(3.0);
        camera.update(1.0 / 60.0);
        assert!(camera.distance() < before);
        camera.zoom(-6.0);
        camera.update(1.0 / 60.0);
        assert!(camera.distance() > before);
    }

    #[test]
    fn pan_moves_the_target() {
        let mut camera = camera(0.0);
        camera.pan(50.0, 0.0, 720.0);
        camera.update(1.0 / 60.0);
        assert!(camera.target.length() > 0.0);
        assert!(camera.target.is_finite());
    }

    #[test]
    fn damping_decays_to_rest() {
        let mut camera = camera(0.1);
        camera.rotate(200.0, 0.0, 720.0);
        assert!(camera.update(1.0 / 60.0), "inertia carries past the first frame");
        let mut frames = 0;
        while camera.update(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 1_000, "damping never settled");
        }
        assert!(!camera.is_moving());
        assert!(camera.eye().is_finite());
    }

    #[test]
    fn degenerate_viewport_keeps_a_valid_aspect() {
        let mut camera = camera(0.0);
        camera.set_viewport(800, 0);
        assert!(camera.projection_matrix().is_finite());
    }
}
