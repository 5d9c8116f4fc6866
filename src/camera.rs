use maths_rs::Mat4f;
use maths_rs::Vec4f;

/// Left handed, y up perspective projection with depth mapped to 0..1, for column vectors (`proj * v`)
pub fn create_perspective_projection_lh_yup(fov: f32, aspect: f32, near: f32, far: f32) -> Mat4f {
    let y_scale = 1.0 / f32::tan(fov * 0.5);
    let x_scale = y_scale / aspect;
    Mat4f::from((
        Vec4f::new(x_scale, 0.0, 0.0, 0.0),
        Vec4f::new(0.0, y_scale, 0.0, 0.0),
        Vec4f::new(0.0, 0.0, far / (far - near), (-near * far) / (far - near)),
        Vec4f::new(0.0, 0.0, 1.0, 0.0)
    ))
}

pub fn create_translation_matrix(x: f32, y: f32, z: f32) -> Mat4f {
    Mat4f::from((
        Vec4f::new(1.0, 0.0, 0.0, x),
        Vec4f::new(0.0, 1.0, 0.0, y),
        Vec4f::new(0.0, 0.0, 1.0, z),
        Vec4f::new(0.0, 0.0, 0.0, 1.0)
    ))
}

/// Rotation of `theta` radians about the x axis
pub fn create_x_rotation_matrix(theta: f32) -> Mat4f {
    let (s, c) = f32::sin_cos(theta);
    Mat4f::from((
        Vec4f::new(1.0, 0.0, 0.0, 0.0),
        Vec4f::new(0.0, c, -s, 0.0),
        Vec4f::new(0.0, s, c, 0.0),
        Vec4f::new(0.0, 0.0, 0.0, 1.0)
    ))
}

/// Rotation of `theta` radians about the y axis
pub fn create_y_rotation_matrix(theta: f32) -> Mat4f {
    let (s, c) = f32::sin_cos(theta);
    Mat4f::from((
        Vec4f::new(c, 0.0, s, 0.0),
        Vec4f::new(0.0, 1.0, 0.0, 0.0),
        Vec4f::new(-s, 0.0, c, 0.0),
        Vec4f::new(0.0, 0.0, 0.0, 1.0)
    ))
}
