//! Path data, path geometry, and the `<path>` element.
//!
//! `d` strings parse into [`PathCommand`]s. [`PathGeometry`] flattens the
//! commands into line segments with cumulative lengths so text layout can
//! ask for the point and tangent at any distance along the path.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::f32::consts::PI;
use std::rc::Rc;

use rustkit_dom::{ElementBehavior, Node, QualName};
use tracing::{trace, warn};

use crate::config::SvgConfig;
use crate::transform::Transform2D;

// ==================== Path Data ====================

/// One path data command. `rel` marks the lowercase (relative) form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { rel: bool, x: f32, y: f32 },
    LineTo { rel: bool, x: f32, y: f32 },
    HorizontalTo { rel: bool, x: f32 },
    VerticalTo { rel: bool, y: f32 },
    CubicTo { rel: bool, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32 },
    SmoothCubicTo { rel: bool, x2: f32, y2: f32, x: f32, y: f32 },
    QuadTo { rel: bool, x1: f32, y1: f32, x: f32, y: f32 },
    SmoothQuadTo { rel: bool, x: f32, y: f32 },
    ArcTo {
        rel: bool,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        x: f32,
        y: f32,
    },
    ClosePath,
}

/// Parsed `d` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    pub commands: Vec<PathCommand>,
    /// Byte offset of the first error, if parsing stopped early.
    pub error_at: Option<usize>,
}

impl PathData {
    /// Parse path data. On error, the commands before it are kept.
    pub fn parse(d: &str) -> Self {
        let mut lexer = Lexer::new(d);
        let mut commands = Vec::new();
        let mut current: Option<u8> = None;

        let error_at = loop {
            lexer.skip_whitespace();
            let Some(next) = lexer.peek() else {
                break None;
            };

            let letter = if next.is_ascii_alphabetic() {
                lexer.pos += 1;
                next
            } else {
                // Implicit repeat of the previous command.
                match current {
                    Some(b'Z' | b'z') | None => break Some(lexer.pos),
                    Some(b'M') => b'L',
                    Some(b'm') => b'l',
                    Some(c) => c,
                }
            };
            if commands.is_empty() && !matches!(letter, b'M' | b'm') {
                break Some(lexer.pos);
            }

            let start = lexer.pos;
            match parse_command(&mut lexer, letter) {
                Some(command) => {
                    commands.push(command);
                    current = Some(letter);
                }
                None => break Some(start),
            }
        };

        if let Some(pos) = error_at {
            warn!(pos, d, "path data error, keeping commands before it");
        }
        Self { commands, error_at }
    }
}

fn parse_command(lexer: &mut Lexer<'_>, letter: u8) -> Option<PathCommand> {
    let rel = letter.is_ascii_lowercase();
    Some(match letter.to_ascii_uppercase() {
        b'M' => PathCommand::MoveTo {
            rel,
            x: lexer.number()?,
            y: lexer.number()?,
        },
        b'L' => PathCommand::LineTo {
            rel,
            x: lexer.number()?,
            y: lexer.number()?,
        },
        b'H' => PathCommand::HorizontalTo {
            rel,
            x: lexer.number()?,
        },
        b'V' => PathCommand::VerticalTo {
            rel,
            y: lexer.number()?,
        },
        b'C' => PathCommand::CubicTo {
            rel,
            x1: lexer.number()?,
            y1: lexer.number()?,
            x2: lexer.number()?,
            y2: lexer.number()?,
            x: lexer.number()?,
            y: lexer.number()?,
        },
        b'S' => PathCommand::SmoothCubicTo {
            rel,
            x2: lexer.number()?,
            y2: lexer.number()?,
            x: lexer.number()?,
            y: lexer.number()?,
        },
        b'Q' => PathCommand::QuadTo {
            rel,
            x1: lexer.number()?,
            y1: lexer.number()?,
            x: lexer.number()?,
            y: lexer.number()?,
        },
        b'T' => PathCommand::SmoothQuadTo {
            rel,
            x: lexer.number()?,
            y: lexer.number()?,
        },
        b'A' => PathCommand::ArcTo {
            rel,
            rx: lexer.number()?,
            ry: lexer.number()?,
            x_axis_rotation: lexer.number()?,
            large_arc: lexer.flag()?,
            sweep: lexer.flag()?,
            x: lexer.number()?,
            y: lexer.number()?,
        },
        b'Z' => PathCommand::ClosePath,
        _ => return None,
    })
}

struct Lexer<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Whitespace with at most one comma.
    fn skip_separator(&mut self) {
        self.skip_whitespace();
        if self.peek() == Some(b',') {
            self.pos += 1;
            self.skip_whitespace();
        }
    }

    fn number(&mut self) -> Option<f32> {
        self.skip_separator();
        let start = self.pos;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let int_start = self.pos;
        self.eat_digits();
        let mut has_digits = self.pos > int_start;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            let frac_start = self.pos;
            self.eat_digits();
            has_digits |= self.pos > frac_start;
        }
        if !has_digits {
            self.pos = start;
            return None;
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            self.eat_digits();
            if self.pos == exp_start {
                self.pos = mark;
            }
        }
        self.text[start..self.pos].parse().ok()
    }

    /// Arc flags are a single `0` or `1` and need no separator after them.
    fn flag(&mut self) -> Option<bool> {
        self.skip_separator();
        let flag = match self.peek()? {
            b'0' => false,
            b'1' => true,
            _ => return None,
        };
        self.pos += 1;
        Some(flag)
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }
}

// ==================== Geometry ====================

/// A position on a path with its tangent direction (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    start: (f32, f32),
    end: (f32, f32),
    /// Distance along the path at `start`.
    offset: f32,
    length: f32,
}

/// A flattened path. Moves between subpaths add no length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathGeometry {
    segments: Vec<Segment>,
    length: f32,
}

impl PathGeometry {
    /// Flatten `commands`, splitting each curve or arc into `curve_segments` lines.
    pub fn from_commands(commands: &[PathCommand], curve_segments: usize) -> Self {
        let mut builder = Flattener::new(curve_segments.max(1));
        for command in commands {
            builder.command(command);
        }
        Self::from_subpaths(&builder.subpaths)
    }

    fn from_subpaths(subpaths: &[Vec<(f32, f32)>]) -> Self {
        let mut segments = Vec::new();
        let mut length = 0.0;
        for points in subpaths {
            for pair in points.windows(2) {
                let (start, end) = (pair[0], pair[1]);
                let seg_len = (end.0 - start.0).hypot(end.1 - start.1);
                if seg_len <= f32::EPSILON {
                    continue;
                }
                segments.push(Segment {
                    start,
                    end,
                    offset: length,
                    length: seg_len,
                });
                length += seg_len;
            }
        }
        Self { segments, length }
    }

    /// Apply an affine transform to every point.
    pub fn transformed(&self, transform: &Transform2D) -> Self {
        if transform.is_identity() {
            return self.clone();
        }
        // Rebuild subpaths so lengths are measured after the transform.
        let mut subpaths: Vec<Vec<(f32, f32)>> = Vec::new();
        let mut last_end: Option<(f32, f32)> = None;
        for seg in &self.segments {
            if last_end != Some(seg.start) {
                subpaths.push(vec![transform.apply(seg.start.0, seg.start.1)]);
            }
            if let Some(points) = subpaths.last_mut() {
                points.push(transform.apply(seg.end.0, seg.end.1));
            }
            last_end = Some(seg.end);
        }
        Self::from_subpaths(&subpaths)
    }

    /// Total length in user units.
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Point and tangent at `distance` along the path, `None` off the path.
    pub fn point_at_length(&self, distance: f32) -> Option<PathPoint> {
        if self.segments.is_empty() || !(0.0..=self.length).contains(&distance) {
            return None;
        }
        let index = self
            .segments
            .partition_point(|seg| seg.offset + seg.length < distance)
            .min(self.segments.len() - 1);
        let seg = &self.segments[index];
        let t = ((distance - seg.offset) / seg.length).clamp(0.0, 1.0);
        let (dx, dy) = (seg.end.0 - seg.start.0, seg.end.1 - seg.start.1);
        Some(PathPoint {
            x: seg.start.0 + dx * t,
            y: seg.start.1 + dy * t,
            angle: dy.atan2(dx),
        })
    }
}

/// Turns commands into polylines, one per subpath.
struct Flattener {
    curve_segments: usize,
    subpaths: Vec<Vec<(f32, f32)>>,
    current: (f32, f32),
    subpath_start: (f32, f32),
    /// Second control point of the previous cubic, for `S`.
    last_cubic: Option<(f32, f32)>,
    /// Control point of the previous quadratic, for `T`.
    last_quad: Option<(f32, f32)>,
}

impl Flattener {
    fn new(curve_segments: usize) -> Self {
        Self {
            curve_segments,
            subpaths: Vec::new(),
            current: (0.0, 0.0),
            subpath_start: (0.0, 0.0),
            last_cubic: None,
            last_quad: None,
        }
    }

    fn resolve(&self, rel: bool, x: f32, y: f32) -> (f32, f32) {
        if rel {
            (self.current.0 + x, self.current.1 + y)
        } else {
            (x, y)
        }
    }

    fn reflect(&self, control: Option<(f32, f32)>) -> (f32, f32) {
        match control {
            Some((cx, cy)) => (2.0 * self.current.0 - cx, 2.0 * self.current.1 - cy),
            None => self.current,
        }
    }

    fn push(&mut self, point: (f32, f32)) {
        match self.subpaths.last_mut() {
            Some(points) => points.push(point),
            None => self.subpaths.push(vec![self.current, point]),
        }
    }

    fn command(&mut self, command: &PathCommand) {
        let mut cubic = None;
        let mut quad = None;

        match *command {
            PathCommand::MoveTo { rel, x, y } => {
                self.current = self.resolve(rel, x, y);
                self.subpath_start = self.current;
                self.subpaths.push(vec![self.current]);
            }
            PathCommand::LineTo { rel, x, y } => {
                let to = self.resolve(rel, x, y);
                self.line_to(to);
            }
            PathCommand::HorizontalTo { rel, x } => {
                let x = if rel { self.current.0 + x } else { x };
                self.line_to((x, self.current.1));
            }
            PathCommand::VerticalTo { rel, y } => {
                let y = if rel { self.current.1 + y } else { y };
                self.line_to((self.current.0, y));
            }
            PathCommand::CubicTo { rel, x1, y1, x2, y2, x, y } => {
                let c1 = self.resolve(rel, x1, y1);
                let c2 = self.resolve(rel, x2, y2);
                let to = self.resolve(rel, x, y);
                self.cubic_to(c1, c2, to);
                cubic = Some(c2);
            }
            PathCommand::SmoothCubicTo { rel, x2, y2, x, y } => {
                let c1 = self.reflect(self.last_cubic);
                let c2 = self.resolve(rel, x2, y2);
                let to = self.resolve(rel, x, y);
                self.cubic_to(c1, c2, to);
                cubic = Some(c2);
            }
            PathCommand::QuadTo { rel, x1, y1, x, y } => {
                let c = self.resolve(rel, x1, y1);
                let to = self.resolve(rel, x, y);
                self.quad_to(c, to);
                quad = Some(c);
            }
            PathCommand::SmoothQuadTo { rel, x, y } => {
                let c = self.reflect(self.last_quad);
                let to = self.resolve(rel, x, y);
                self.quad_to(c, to);
                quad = Some(c);
            }
            PathCommand::ArcTo {
                rel,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let to = self.resolve(rel, x, y);
                self.arc_to(rx, ry, x_axis_rotation, large_arc, sweep, to);
            }
            PathCommand::ClosePath => {
                let start = self.subpath_start;
                self.line_to(start);
                // A command after Z starts a new subpath at the same point.
                self.subpaths.push(vec![start]);
            }
        }

        self.last_cubic = cubic;
        self.last_quad = quad;
    }

    fn line_to(&mut self, to: (f32, f32)) {
        self.push(to);
        self.current = to;
    }

    fn cubic_to(&mut self, c1: (f32, f32), c2: (f32, f32), to: (f32, f32)) {
        let p0 = self.current;
        let n = self.curve_segments;
        for i in 1..=n {
            let t = i as f32 / n as f32;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            self.push((
                a * p0.0 + b * c1.0 + c * c2.0 + d * to.0,
                a * p0.1 + b * c1.1 + c * c2.1 + d * to.1,
            ));
        }
        self.current = to;
    }

    fn quad_to(&mut self, c: (f32, f32), to: (f32, f32)) {
        let p0 = self.current;
        let n = self.curve_segments;
        for i in 1..=n {
            let t = i as f32 / n as f32;
            let mt = 1.0 - t;
            self.push((
                mt * mt * p0.0 + 2.0 * mt * t * c.0 + t * t * to.0,
                mt * mt * p0.1 + 2.0 * mt * t * c.1 + t * t * to.1,
            ));
        }
        self.current = to;
    }

    /// Endpoint-to-center arc conversion, then sampling.
    fn arc_to(
        &mut self,
        rx: f32,
        ry: f32,
        x_axis_rotation: f32,
        large_arc: bool,
        sweep: bool,
        to: (f32, f32),
    ) {
        let from = self.current;
        if from == to {
            return;
        }
        let (mut rx, mut ry) = (rx.abs(), ry.abs());
        if rx == 0.0 || ry == 0.0 {
            self.line_to(to);
            return;
        }

        let phi = x_axis_rotation * PI / 180.0;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let dx2 = (from.0 - to.0) / 2.0;
        let dy2 = (from.1 - to.1) / 2.0;
        let x1p = cos_phi * dx2 + sin_phi * dy2;
        let y1p = -sin_phi * dx2 + cos_phi * dy2;

        let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
        if lambda > 1.0 {
            let scale = lambda.sqrt();
            rx *= scale;
            ry *= scale;
        }

        let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
        let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        let coef = sign * (num / den).max(0.0).sqrt();
        let cxp = coef * rx * y1p / ry;
        let cyp = -coef * ry * x1p / rx;
        let cx = cos_phi * cxp - sin_phi * cyp + (from.0 + to.0) / 2.0;
        let cy = sin_phi * cxp + cos_phi * cyp + (from.1 + to.1) / 2.0;

        let u = ((x1p - cxp) / rx, (y1p - cyp) / ry);
        let v = ((-x1p - cxp) / rx, (-y1p - cyp) / ry);
        let theta1 = vector_angle((1.0, 0.0), u);
        let mut delta = vector_angle(u, v);
        if !sweep && delta > 0.0 {
            delta -= 2.0 * PI;
        } else if sweep && delta < 0.0 {
            delta += 2.0 * PI;
        }

        let n = self.curve_segments;
        for i in 1..n {
            let theta = theta1 + delta * i as f32 / n as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            self.push((
                cx + rx * cos_phi * cos_t - ry * sin_phi * sin_t,
                cy + rx * sin_phi * cos_t + ry * cos_phi * sin_t,
            ));
        }
        // End exactly on the requested point.
        self.line_to(to);
    }
}

fn vector_angle(u: (f32, f32), v: (f32, f32)) -> f32 {
    (u.0 * v.1 - u.1 * v.0).atan2(u.0 * v.0 + u.1 * v.1)
}

// ==================== <path> Element ====================

/// Behavior for SVG `<path>`: keeps `d`, `pathLength` and `transform`
/// parsed. Referrers are notified of changes by the document.
#[derive(Debug, Default)]
pub struct PathElement {
    data: RefCell<PathData>,
    path_length: Cell<Option<f32>>,
    transform: Cell<Transform2D>,
}

impl PathElement {
    pub fn create(_name: &QualName) -> Rc<dyn ElementBehavior> {
        Rc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<PathCommand> {
        self.data.borrow().commands.clone()
    }

    /// Author-supplied path length (`pathLength`), if valid.
    pub fn path_length(&self) -> Option<f32> {
        self.path_length.get()
    }

    pub fn transform(&self) -> Transform2D {
        self.transform.get()
    }

    /// Flattened geometry in the user space of the path's parent.
    pub fn geometry(&self, config: &SvgConfig) -> PathGeometry {
        PathGeometry::from_commands(&self.data.borrow().commands, config.curve_segments)
            .transformed(&self.transform.get())
    }
}

impl ElementBehavior for PathElement {
    fn parse_attribute(&self, element: &Rc<Node>, name: &QualName, value: Option<&str>) {
        if !name.ns.is_empty() {
            return;
        }
        match &*name.local {
            "d" => {
                let data = value.map(PathData::parse).unwrap_or_default();
                trace!(element = element.id.raw(), commands = data.commands.len(), "path data");
                *self.data.borrow_mut() = data;
            }
            "pathLength" => {
                let length = value.and_then(|text| match text.trim().parse::<f32>() {
                    Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
                    _ => {
                        warn!(element = element.id.raw(), value = text, "invalid pathLength");
                        None
                    }
                });
                self.path_length.set(length);
            }
            "transform" => {
                self.transform
                    .set(value.map(Transform2D::parse).unwrap_or_default());
            }
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
