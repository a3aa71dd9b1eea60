use std::ops::Range;

use crate::point::Point;

pub fn random_color() -> macroquad::color::Color {
    use macroquad::color::Color;
    use macroquad::math::Vec4;
    use random_color::RandomColor;

    Color::from_vec(Vec4::from_array(RandomColor::new().to_f32_rgba_array()))
}

pub fn random_points(count: usize, bounds: (Range<f64>, Range<f64>)) -> Vec<Point> {
    use rand::Rng;
    let mut rng = rand::rng();
    let mut acc = Vec::with_capacity(count);
    for _ in 0..count {
        acc.push(Point::new(
            rng.random_range(bounds.0.clone()),
            rng.random_range(bounds.1.clone()),
        ));
    }
    acc
}
