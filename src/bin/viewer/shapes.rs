use macroquad::prelude::*;

use voronoi_sweep::common_traits::Draw;

#[derive(Clone, Debug)]
pub struct Dot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub clr: Color,
}

impl Draw for Dot {
    fn draw(&self) {
        draw_circle(self.x, self.y, self.radius, self.clr);
    }
}

#[derive(Clone, Debug)]
pub struct Line2D {
    pub ax: f32,
    pub ay: f32,
    pub bx: f32,
    pub by: f32,
    pub thickness: f32,
    pub clr: Color,
}

impl Draw for Line2D {
    fn draw(&self) {
        draw_line(self.ax, self.ay, self.bx, self.by, self.thickness, self.clr);
    }
}

pub enum Object {
    Point(Dot),
    LineObj(Line2D),
}

impl Draw for Object {
    fn draw(&self) {
        match self {
            Object::Point(p) => p.draw(),
            Object::LineObj(l) => l.draw(),
        }
    }
}
