use cgmath::{Deg, InnerSpace, Matrix, Matrix4, Point3, Vector3, Vector4};

/// Remaps cgmath's OpenGL clip depth [-1, 1] to wgpu's [0, 1]
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Right-handed perspective camera in wgpu clip space
pub fn view_projection(
    eye: Point3<f32>,
    target: Point3<f32>,
    fovy_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
) -> Matrix4<f32> {
    let view = Matrix4::look_at_rh(eye, target, Vector3::unit_y());
    let proj = cgmath::perspective(Deg(fovy_degrees), aspect, near, far);
    OPENGL_TO_WGPU_MATRIX * proj * view
}

/// Extract frustum planes from a view-projection matrix
///
/// Order: [left, right, bottom, top, near, far]. Planes are normalized so the
/// signed distance of a point is `dot(n, p) + d` in world units. The near plane
/// assumes wgpu's [0, 1] clip depth.
pub fn extract_frustum_planes(view_proj: &Matrix4<f32>) -> [[f32; 4]; 6] {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);

    let mut planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2];

    // Normalize planes
    for plane in &mut planes {
        let length = plane.truncate().magnitude();
        if length > 0.0 {
            *plane /= length;
        }
    }

    planes.map(|p: Vector4<f32>| [p.x, p.y, p.z, p.w])
}

/// Sphere versus frustum test, same rule as the LOD kernel
#[inline]
pub fn sphere_in_frustum(planes: &[[f32; 4]; 6], center: Vector3<f32>, radius: f32) -> bool {
    planes
        .iter()
        .all(|p| p[0] * center.x + p[1] * center.y + p[2] * center.z + p[3] >= -radius)
}
