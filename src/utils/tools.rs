use crate::glm;

/// Checks if a number is a power of two. Zero is not.
pub fn is_power_of_two(n: u32) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Orthographic projection of a surface with the origin in the top left corner and y pointing down.
pub fn ortho_projection(width: u32, height: u32) -> glm::Mat4 {
    glm::ortho(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
}

/// Rotates a point around the origin and then moves it by ``offset``.
#[inline]
pub fn rotate_translate(point: glm::Vec2, cos: f32, sin: f32, offset: glm::Vec2) -> glm::Vec2 {
    glm::vec2(
        offset.x + point.x * cos - point.y * sin,
        offset.y + point.x * sin + point.y * cos,
    )
}

/// Maps a point in surface pixels to normalized device coordinates.
pub fn to_ndc(projection: &glm::Mat4, x: f32, y: f32) -> glm::Vec2 {
    let clip = projection * glm::vec4(x, y, 0.0, 1.0);
    clip.xy() / clip.w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn powers_of_two() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(512));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(600));
    }

    #[test]
    fn projection_maps_surface_corners() {
        let proj = ortho_projection(800, 600);
        assert!(glm::distance(&to_ndc(&proj, 0.0, 0.0), &glm::vec2(-1.0, 1.0)) < 1e-6);
        assert!(glm::distance(&to_ndc(&proj, 800.0, 600.0), &glm::vec2(1.0, -1.0)) < 1e-6);
        assert!(glm::distance(&to_ndc(&proj, 400.0, 300.0), &glm::vec2(0.0, 0.0)) < 1e-6);
    }

    #[test]
    fn rotation_is_counter_clockwise_in_math_terms() {
        let p = rotate_translate(glm::vec2(1.0, 0.0), 0.0, 1.0, glm::vec2(10.0, 10.0));
        assert!(glm::distance(&p, &glm::vec2(10.0, 11.0)) < 1e-6);
    }
}
