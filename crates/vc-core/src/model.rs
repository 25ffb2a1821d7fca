//! Drawable entity model for Visual Composer canvases.
//!
//! Every entity carries a transform (position, rotation, scale, flips),
//! a style (fill, stroke, shadow), opacity, visibility and lock flags,
//! and a type-specific `EntityKind`. All types here are plain values:
//! they are cloned into snapshots and compared by content.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        [self.r, self.g, self.b, self.a].iter().all(|v| v.is_finite())
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: Color,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Paint applied to an entity. `None` fields are not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub shadow: Option<Shadow>,
}

impl Style {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Default::default()
        }
    }

    fn is_finite(&self) -> bool {
        self.fill.is_none_or(|c| c.is_finite())
            && self
                .stroke
                .as_ref()
                .is_none_or(|s| s.color.is_finite() && s.width.is_finite())
            && self.shadow.as_ref().is_none_or(|s| {
                s.color.is_finite()
                    && s.blur.is_finite()
                    && s.offset_x.is_finite()
                    && s.offset_y.is_finite()
            })
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: u16, // 100..900
    pub italic: bool,
    pub underline: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Arial".into(),
            size: 24.0,
            weight: 400,
            italic: false,
            underline: false,
        }
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// A single path command, as produced by the brush tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),            // control, end
    CubicTo(f32, f32, f32, f32, f32, f32), // c1, c2, end
    Close,
}

impl PathCmd {
    fn is_finite(&self) -> bool {
        match self {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => x.is_finite() && y.is_finite(),
            PathCmd::QuadTo(a, b, c, d) => [a, b, c, d].iter().all(|v| v.is_finite()),
            PathCmd::CubicTo(a, b, c, d, e, f) => [a, b, c, d, e, f].iter().all(|v| v.is_finite()),
            PathCmd::Close => true,
        }
    }
}

// ─── Entities ────────────────────────────────────────────────────────────

/// What an entity draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Root of the canvas. Exactly one per canvas, never serialized.
    Root,

    /// Container whose children move with it.
    Group,

    Rect {
        width: f32,
        height: f32,
        corner_radius: f32,
    },

    /// Ellipse / circle.
    Ellipse { rx: f32, ry: f32 },

    /// Straight line from the entity origin to `(x2, y2)` in local space.
    Line { x2: f32, y2: f32 },

    Text {
        content: String,
        font: FontSpec,
        align: TextAlign,
    },

    /// Raster image. `source` is a URL or data URI; pixels live outside the scene.
    Image {
        source: String,
        width: f32,
        height: f32,
    },

    /// Freeform path (brush tool output).
    Path { commands: Vec<PathCmd> },
}

impl EntityKind {
    /// Short lowercase name, used as the prefix for generated ids.
    pub fn type_name(&self) -> &'static str {
        match self {
            EntityKind::Root => "root",
            EntityKind::Group => "group",
            EntityKind::Rect { .. } => "rect",
            EntityKind::Ellipse { .. } => "ellipse",
            EntityKind::Line { .. } => "line",
            EntityKind::Text { .. } => "text",
            EntityKind::Image { .. } => "image",
            EntityKind::Path { .. } => "path",
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            EntityKind::Root | EntityKind::Group => true,
            EntityKind::Rect {
                width,
                height,
                corner_radius,
            } => width.is_finite() && height.is_finite() && corner_radius.is_finite(),
            EntityKind::Ellipse { rx, ry } => rx.is_finite() && ry.is_finite(),
            EntityKind::Line { x2, y2 } => x2.is_finite() && y2.is_finite(),
            EntityKind::Text { font, .. } => font.size.is_finite(),
            EntityKind::Image { width, height, .. } => width.is_finite() && height.is_finite(),
            EntityKind::Path { commands } => commands.iter().all(PathCmd::is_finite),
        }
    }
}

/// Placement of an entity relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    /// Rotation in degrees, clockwise.
    pub angle: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Transform {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.angle, self.scale_x, self.scale_y]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

/// A single drawable object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub transform: Transform,
    pub style: Style,
    /// 0.0 (transparent) ..= 1.0 (opaque).
    pub opacity: f32,
    pub visible: bool,
    pub locked: bool,
    /// Layer the entity belongs to, if layers are in use.
    pub layer: Option<EntityId>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            transform: Transform::default(),
            style: Style::default(),
            opacity: 1.0,
            visible: true,
            locked: false,
            layer: None,
        }
    }

    /// Create an entity with a generated id derived from its kind.
    pub fn anonymous(kind: EntityKind) -> Self {
        Self::new(EntityId::with_prefix(kind.type_name()), kind)
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.x = x;
        self.transform.y = y;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn rect(id: &str, width: f32, height: f32) -> Self {
        Self::new(
            EntityId::intern(id),
            EntityKind::Rect {
                width,
                height,
                corner_radius: 0.0,
            },
        )
    }

    pub fn ellipse(id: &str, rx: f32, ry: f32) -> Self {
        Self::new(EntityId::intern(id), EntityKind::Ellipse { rx, ry })
    }

    pub fn text(id: &str, content: &str) -> Self {
        Self::new(
            EntityId::intern(id),
            EntityKind::Text {
                content: content.into(),
                font: FontSpec::default(),
                align: TextAlign::default(),
            },
        )
    }

    /// Whether every numeric attribute is finite. Entities that fail this
    /// cannot be captured losslessly and are rejected at serialization.
    pub fn is_finite(&self) -> bool {
        self.opacity.is_finite()
            && self.transform.is_finite()
            && self.style.is_finite()
            && self.kind.is_finite()
    }
}

// ─── Layers ──────────────────────────────────────────────────────────────

/// A named layer, as listed in the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: EntityId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
}

impl Layer {
    pub fn new(name: &str) -> Self {
        Self {
            id: EntityId::with_prefix("layer"),
            name: name.into(),
            visible: true,
            locked: false,
        }
    }
}
