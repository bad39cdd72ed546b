use crate::geometry::math::Rect;
use crate::geometry::tolerance::CIRCLE_KAPPA;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// One drawing command. Control points precede the end point, as in SVG.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo { to: Vec2 },
    LineTo { to: Vec2 },
    QuadTo { ctrl: Vec2, to: Vec2 },
    CubicTo { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
    Close,
}

impl PathCommand {
    /// Every coordinate the command carries.
    pub fn points(&self) -> impl Iterator<Item = Vec2> {
        let pts: [Option<Vec2>; 3] = match *self {
            PathCommand::MoveTo { to } | PathCommand::LineTo { to } => [Some(to), None, None],
            PathCommand::QuadTo { ctrl, to } => [Some(ctrl), Some(to), None],
            PathCommand::CubicTo { ctrl1, ctrl2, to } => [Some(ctrl1), Some(ctrl2), Some(to)],
            PathCommand::Close => [None, None, None],
        };
        pts.into_iter().flatten()
    }
}

/// A sequence of subpaths, the interchange format for operands and results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub commands: Vec<PathCommand>,
    #[serde(default)]
    pub fill_rule: FillRule,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::MoveTo { to: Vec2::new(x, y) });
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::LineTo { to: Vec2::new(x, y) });
        self
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::QuadTo { ctrl: Vec2::new(cx, cy), to: Vec2::new(x, y) });
        self
    }

    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::CubicTo {
            ctrl1: Vec2::new(c1x, c1y),
            ctrl2: Vec2::new(c2x, c2y),
            to: Vec2::new(x, y),
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of subpaths (one per `MoveTo`).
    pub fn contour_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo { .. }))
            .count()
    }

    /// Box around every coordinate, control points included.
    pub fn control_bounds(&self) -> Rect {
        Rect::from_points(self.commands.iter().flat_map(|c| c.points()))
    }

    /// Axis-aligned rectangle: top-left, top-right, bottom-right, bottom-left.
    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Path {
        let mut p = Path::new();
        p.move_to(x, y)
            .line_to(x + w, y)
            .line_to(x + w, y + h)
            .line_to(x, y + h)
            .close();
        p
    }

    pub fn circle(center: Vec2, radius: f64) -> Path {
        Path::oval(Rect::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        ))
    }

    /// Ellipse inscribed in `r`, four cubics starting at the leftmost point.
    pub fn oval(r: Rect) -> Path {
        let c = r.center();
        let rx = r.width() * 0.5;
        let ry = r.height() * 0.5;
        let kx = rx * CIRCLE_KAPPA;
        let ky = ry * CIRCLE_KAPPA;
        let mut p = Path::new();
        p.move_to(c.x - rx, c.y)
            .cubic_to(c.x - rx, c.y + ky, c.x - kx, c.y + ry, c.x, c.y + ry)
            .cubic_to(c.x + kx, c.y + ry, c.x + rx, c.y + ky, c.x + rx, c.y)
            .cubic_to(c.x + rx, c.y - ky, c.x + kx, c.y - ry, c.x, c.y - ry)
            .cubic_to(c.x - kx, c.y - ry, c.x - rx, c.y - ky, c.x - rx, c.y)
            .close();
        p
    }
}
