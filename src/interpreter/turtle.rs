//! Turtle graphics state
//!
//! Position starts at the origin, heading 0 points along +x and angles grow
//! counter-clockwise. Moving with the pen down records a line segment; nothing
//! is rendered here, hosts draw from [`TurtleState::segments`] or a snapshot.

use serde::{Deserialize, Serialize};

/// Colors selectable by index (`COLOR n`, `PENCOLOR n`)
pub const PALETTE: [&str; 15] = [
    "black", "blue", "red", "green", "yellow", "magenta", "cyan", "white", "gray", "orange",
    "purple", "brown", "pink", "lightblue", "lightgreen",
];

const DEFAULT_COLOR: &str = "black";
const DEFAULT_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// A line drawn while the pen was down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub color: String,
    pub width: f64,
}

/* ===================== Turtle ===================== */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    position: Point,
    /// Degrees in [0, 360)
    heading: f64,
    pen_down: bool,
    color: String,
    width: f64,
    visible: bool,
    segments: Vec<Segment>,
}

/// Serialisable copy of the turtle for hosts
pub type TurtleSnapshot = TurtleState;

impl Default for TurtleState {
    fn default() -> Self {
        TurtleState {
            position: Point::default(),
            heading: 0.0,
            pen_down: true,
            color: DEFAULT_COLOR.to_string(),
            width: DEFAULT_WIDTH,
            visible: true,
            segments: Vec::new(),
        }
    }
}

impl TurtleState {
    pub fn new() -> Self {
        Self::default()
    }

    /* ----- movement ----- */

    pub fn forward(&mut self, distance: f64) {
        let (dx, dy) = direction(self.heading);
        let to = Point::new(
            self.position.x + distance * dx,
            self.position.y + distance * dy,
        );
        self.move_to(to);
    }

    pub fn back(&mut self, distance: f64) {
        self.forward(-distance);
    }

    /// Rotate counter-clockwise by `degrees`
    pub fn turn(&mut self, degrees: f64) {
        self.set_heading(self.heading + degrees);
    }

    pub fn left(&mut self, degrees: f64) {
        self.turn(degrees);
    }

    pub fn right(&mut self, degrees: f64) {
        self.turn(-degrees);
    }

    pub fn set_heading(&mut self, degrees: f64) {
        self.heading = degrees.rem_euclid(360.0);
    }

    /// Jump to a position, drawing when the pen is down
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.move_to(Point::new(x, y));
    }

    pub fn set_x(&mut self, x: f64) {
        self.move_to(Point::new(x, self.position.y));
    }

    pub fn set_y(&mut self, y: f64) {
        self.move_to(Point::new(self.position.x, y));
    }

    fn move_to(&mut self, to: Point) {
        if self.pen_down {
            self.segments.push(Segment {
                from: self.position,
                to,
                color: self.color.clone(),
                width: self.width,
            });
        }
        self.position = to;
    }

    /* ----- pen ----- */

    pub fn pen_up(&mut self) {
        self.pen_down = false;
    }

    pub fn pen_down(&mut self) {
        self.pen_down = true;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Select a palette color; out-of-range indices wrap
    pub fn set_color_index(&mut self, index: i64) {
        let slot = index.rem_euclid(PALETTE.len() as i64) as usize;
        self.color = PALETTE[slot].to_string();
    }

    /// Pen width, never thinner than 1
    pub fn set_width(&mut self, width: f64) {
        self.width = if width.is_finite() {
            width.max(1.0)
        } else {
            DEFAULT_WIDTH
        };
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /* ----- resets ----- */

    /// Return to the origin facing heading 0, without drawing
    pub fn home(&mut self) {
        self.position = Point::default();
        self.heading = 0.0;
    }

    /// Erase the drawing and go home; pen color and width are kept
    pub fn clear(&mut self) {
        self.segments.clear();
        self.home();
    }

    /// Erase the drawing but leave the turtle where it is
    pub fn clean(&mut self) {
        self.segments.clear();
    }

    /// Restore every default
    pub fn reset(&mut self) {
        *self = TurtleState::default();
    }

    /* ----- accessors ----- */

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn snapshot(&self) -> TurtleSnapshot {
        self.clone()
    }
}

/// Unit vector for a heading; cardinal headings are exact
fn direction(heading: f64) -> (f64, f64) {
    match heading {
        h if h == 0.0 => (1.0, 0.0),
        h if h == 90.0 => (0.0, 1.0),
        h if h == 180.0 => (-1.0, 0.0),
        h if h == 270.0 => (0.0, -1.0),
        h => {
            let rad = h.to_radians();
            (rad.cos(), rad.sin())
        }
    }
}
