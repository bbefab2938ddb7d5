use glam::Vec3;

/// Converts latitude/longitude in degrees to a point on a sphere whose center
/// sits `height` above the origin.
///
/// Uses the polar angle `phi = (90 - lat)` and azimuth `theta = (lon + 180)`,
/// with `x = -r sin(phi) cos(theta)`, `y = height + r cos(phi)`, `z = r sin(phi) sin(theta)`.
pub fn lat_lon_to_vec3(lat: f32, lon: f32, radius: f32, height: f32) -> Vec3 {
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();
    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        height + radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}
