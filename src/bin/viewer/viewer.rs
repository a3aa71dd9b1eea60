use macroquad::prelude::*;

pub mod shapes;

use genmap::GenMap;
use shapes::{Dot, Line2D, Object};

use voronoi_sweep::common_traits::Draw;
use voronoi_sweep::sites::parse_sites;
use voronoi_sweep::{compute_voronoi, utils, FortuneSweeper, Point, Site, VoronoiDiagram};

const WIDTH: f32 = 1200.0;
const HEIGHT: f32 = 900.0;
const SITE_RADIUS: f32 = 4.0;

struct State {
    pub objects: GenMap<Object>,
    pub clear_color: Color,
}

impl Default for State {
    fn default() -> Self {
        Self {
            objects: GenMap::with_capacity(1000),
            clear_color: BLACK,
        }
    }
}

impl State {
    fn clear(&mut self) {
        let handles: Vec<_> = self.objects.iter().collect();
        for h in handles {
            self.objects.remove(h);
        }
    }

    fn add_dot(&mut self, d: Dot) -> genmap::Handle {
        self.objects.insert(Object::Point(d))
    }

    fn add_line(&mut self, l: Line2D) -> genmap::Handle {
        self.objects.insert(Object::LineObj(l))
    }

    fn text_digest(&self) -> String {
        let line_cnt = self
            .objects
            .iter()
            .flat_map(|x| self.objects.get(x))
            .filter(|x| matches!(x, Object::LineObj(_)))
            .count();
        let dot_cnt = self
            .objects
            .iter()
            .flat_map(|x| self.objects.get(x))
            .filter(|x| matches!(x, Object::Point(_)))
            .count();
        let frametime = get_frame_time();
        format!(
            r"
num. of lines: {line_cnt}
num. of dots: {dot_cnt}
frametime: {frametime}
"
        )
    }
}

/// World-to-screen mapping derived from the diagram's recorded centroid
/// and major axis.
struct Camera {
    centroid: Point,
    major_axis: f64,
}

impl Camera {
    fn of(diagram: &VoronoiDiagram) -> Self {
        Camera {
            centroid: diagram.dcel.centroid,
            major_axis: diagram.dcel.major_axis,
        }
    }

    fn of_sites(sites: &[Site]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for s in sites {
            min_x = min_x.min(s.x());
            min_y = min_y.min(s.y());
            max_x = max_x.max(s.x());
            max_y = max_y.max(s.y());
        }
        Camera {
            centroid: Point::new((min_x + max_x) * 0.5, (min_y + max_y) * 0.5),
            major_axis: ((max_x - min_x).max(max_y - min_y)).max(1.0),
        }
    }

    fn to_screen(&self, p: Point) -> (f32, f32) {
        let sx = ((p.x() - self.centroid.x()) / self.major_axis) as f32;
        let sy = ((p.y() - self.centroid.y()) / self.major_axis) as f32;
        // world y grows upward, screen y downward
        (WIDTH * 0.5 + sx * HEIGHT * 0.45, HEIGHT * 0.5 - sy * HEIGHT * 0.45)
    }

    fn to_world(&self, x: f32, y: f32) -> Point {
        let sx = (x - WIDTH * 0.5) / (HEIGHT * 0.45);
        let sy = (HEIGHT * 0.5 - y) / (HEIGHT * 0.45);
        Point::new(
            self.centroid.x() + sx as f64 * self.major_axis,
            self.centroid.y() + sy as f64 * self.major_axis,
        )
    }
}

fn rebuild_scene(state: &mut State, camera: &Camera, sites: &[Site], diagram: &VoronoiDiagram) {
    state.clear();
    for seg in diagram.dcel.line_segments() {
        let (ax, ay) = camera.to_screen(seg[0]);
        let (bx, by) = camera.to_screen(seg[1]);
        state.add_line(Line2D { ax, ay, bx, by, thickness: 1.0, clr: LIGHTGRAY });
    }
    for v in &diagram.dcel.vertices {
        if v.is_boundary {
            continue;
        }
        let (x, y) = camera.to_screen(v.pos);
        state.add_dot(Dot { x, y, radius: 2.5, clr: SKYBLUE });
    }
    for s in sites {
        let (x, y) = camera.to_screen(s.pos);
        state.add_dot(Dot { x, y, radius: SITE_RADIUS, clr: utils::random_color() });
    }
}

fn animation_scene(state: &mut State, camera: &Camera, sweeper: &FortuneSweeper) {
    state.clear();
    for seg in sweeper.partial_segments() {
        let (ax, ay) = camera.to_screen(seg[0]);
        let (bx, by) = camera.to_screen(seg[1]);
        state.add_line(Line2D { ax, ay, bx, by, thickness: 1.0, clr: LIGHTGRAY });
    }
    for s in sweeper.sites() {
        let (x, y) = camera.to_screen(s.pos);
        state.add_dot(Dot { x, y, radius: SITE_RADIUS, clr: DARKGREEN });
    }
    let (_, sweep_screen) = camera.to_screen(Point::new(0.0, sweeper.sweep_y()));
    state.add_line(Line2D {
        ax: 0.0,
        ay: sweep_screen,
        bx: WIDTH,
        by: sweep_screen,
        thickness: 1.0,
        clr: RED,
    });
}

#[macroquad::main("Voronoi")]
async fn main() {
    request_new_screen_size(WIDTH, HEIGHT);

    stderrlog::new()
        .modules([module_path!().to_string(), "voronoi_sweep".to_string()])
        .verbosity(2)
        .init()
        .unwrap();

    let mut animate = false;
    let mut path: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--animate" => animate = true,
            other => path = Some(other.to_string()),
        }
    }

    let mut sites: Vec<Site> = match &path {
        Some(p) => match parse_sites(p) {
            Ok(sites) => sites,
            Err(err) => {
                eprintln!("ERROR: {err}");
                std::process::exit(1);
            }
        },
        None => utils::random_points(60, (0.0..100.0, 0.0..100.0))
            .into_iter()
            .enumerate()
            .map(|(i, p)| Site { pos: p, id: i as i64 + 1 })
            .collect(),
    };
    log::info!("viewer up with {} sites", sites.len());

    let mut state = State::default();
    let mut sweeper: Option<FortuneSweeper> = None;
    let mut diagram: Option<VoronoiDiagram> = None;
    let mut camera;

    if animate {
        let sw = FortuneSweeper::new(sites.clone());
        camera = Camera::of_sites(&sites);
        animation_scene(&mut state, &camera, &sw);
        sweeper = Some(sw);
    } else {
        let d = compute_voronoi(sites.clone());
        camera = Camera::of(&d);
        rebuild_scene(&mut state, &camera, &sites, &d);
        diagram = Some(d);
    }

    loop {
        if is_quit_requested() {
            break;
        }
        clear_background(state.clear_color);

        for handle in state.objects.iter() {
            if let Some(object) = state.objects.get(handle) {
                object.draw();
            }
        }

        let mut finished_now = false;
        if let Some(sw) = sweeper.as_mut() {
            // step the sweep one event at a time
            draw_text("SPACE: next event, ENTER: finish", 20.0, 20.0, 24.0, DARKGRAY);
            let mut advanced = false;
            if is_key_pressed(KeyCode::Space) {
                advanced = sw.step_next_event();
            }
            if is_key_pressed(KeyCode::Enter) {
                while sw.step_next_event() {}
                advanced = true;
            }
            if advanced {
                animation_scene(&mut state, &camera, sw);
                finished_now = sw.done();
            }
        }
        if finished_now {
            let finished = sweeper.take().expect("sweeper present");
            let d = finished.finish();
            camera = Camera::of(&d);
            rebuild_scene(&mut state, &camera, &sites, &d);
            diagram = Some(d);
        }
        if sweeper.is_none() && diagram.is_some() {
            draw_text("LMB: add site, R: digest", 20.0, 20.0, 24.0, DARKGRAY);

            if is_mouse_button_pressed(MouseButton::Left) {
                let (mx, my) = mouse_position();
                let p = camera.to_world(mx, my);
                sites.push(Site { pos: p, id: sites.len() as i64 + 1 });
                let d = compute_voronoi(sites.clone());
                camera = Camera::of(&d);
                rebuild_scene(&mut state, &camera, &sites, &d);
                diagram = Some(d);
            }
        }

        if is_key_released(KeyCode::R) {
            println!("{}", state.text_digest());
            if let Some(d) = &diagram {
                println!(
                    "V: {}, HE: {}, F: {}",
                    d.dcel.num_vertices(),
                    d.dcel.num_half_edges(),
                    d.dcel.num_faces()
                );
            }
        }

        next_frame().await
    }
}
