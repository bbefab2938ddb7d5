//! Typeface JSON fonts: glyph outlines as compact path strings.
//!
//! Each glyph carries an advance (`ha`) and an outline string `o` made of
//! `m x y`, `l x y`, `q x y cx cy` and `b x y c1x c1y c2x c2y` commands in
//! font units. Curve commands list the end point before the control points.

use std::collections::HashMap;

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

use crate::triangulate::signed_area;

/// Errors produced while loading a typeface.
#[derive(Debug, Error)]
pub enum TypefaceError {
    #[error("invalid typeface JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("typeface resolution must be positive, got {0}")]
    InvalidResolution(f32),

    #[error("glyph {glyph:?}: malformed outline near `{token}`")]
    Outline { glyph: char, token: String },
}

#[derive(Deserialize)]
struct TypefaceJson {
    glyphs: HashMap<String, GlyphJson>,
    resolution: f32,
    #[serde(rename = "familyName", default)]
    family_name: String,
    #[serde(rename = "boundingBox", default)]
    bounding_box: BoundingBoxJson,
    #[serde(rename = "underlineThickness", default)]
    underline_thickness: f32,
}

#[derive(Deserialize)]
struct GlyphJson {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Deserialize, Default)]
struct BoundingBoxJson {
    #[serde(rename = "yMin", default)]
    y_min: f32,
    #[serde(rename = "yMax", default)]
    y_max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
    CubicTo { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
}

#[derive(Debug, Clone)]
struct Glyph {
    advance: f32,
    commands: Vec<PathCommand>,
}

/// A filled region: one outer contour and the holes cut from it.
///
/// Contours are open point lists (the last point connects back to the first).
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub outer: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

/// A parsed typeface font.
#[derive(Debug, Clone)]
pub struct Typeface {
    family_name: String,
    resolution: f32,
    line_height: f32,
    glyphs: HashMap<char, Glyph>,
}

impl Typeface {
    /// Parses a typeface JSON document.
    pub fn from_json(json: &str) -> Result<Self, TypefaceError> {
        Self::from_raw(serde_json::from_str(json)?)
    }

    /// Parses a typeface JSON document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypefaceError> {
        Self::from_raw(serde_json::from_slice(bytes)?)
    }

    fn from_raw(raw: TypefaceJson) -> Result<Self, TypefaceError> {
        if !(raw.resolution > 0.0) {
            return Err(TypefaceError::InvalidResolution(raw.resolution));
        }

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                continue;
            };
            let commands = match glyph.o.as_deref() {
                Some(outline) => parse_outline(ch, outline)?,
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: glyph.ha,
                    commands,
                },
            );
        }

        Ok(Self {
            family_name: raw.family_name,
            resolution: raw.resolution,
            line_height: raw.bounding_box.y_max - raw.bounding_box.y_min + raw.underline_thickness,
            glyphs,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Font units per em.
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Lays out `text` at `size` world units per em and returns its filled
    /// shapes, with curves flattened into `curve_segments` pieces.
    ///
    /// Glyphs advance along +X; `\n` starts a new line below. Characters with
    /// no glyph fall back to `?`, or are skipped if the font lacks that too.
    pub fn shapes(&self, text: &str, size: f32, curve_segments: u32) -> Vec<Shape> {
        let scale = size / self.resolution;
        let divisions = curve_segments.max(1);
        let mut offset = Vec2::ZERO;
        let mut shapes = Vec::new();

        for ch in text.chars() {
            if ch == '\n' {
                offset.x = 0.0;
                offset.y -= self.line_height * scale;
                continue;
            }
            let Some(glyph) = self.glyphs.get(&ch).or_else(|| self.glyphs.get(&'?')) else {
                tracing::warn!(character = %ch, family = %self.family_name, "no glyph for character");
                continue;
            };
            let contours = flatten(&glyph.commands, scale, offset, divisions);
            shapes.extend(group_contours(contours));
            offset.x += glyph.advance * scale;
        }
        shapes
    }
}

fn parse_outline(glyph: char, outline: &str) -> Result<Vec<PathCommand>, TypefaceError> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();

    let point = |tokens: &mut std::str::SplitWhitespace<'_>| -> Result<Vec2, TypefaceError> {
        let mut coord = || {
            let token = tokens.next().unwrap_or("<end>");
            token.parse::<f32>().map_err(|_| TypefaceError::Outline {
                glyph,
                token: token.to_string(),
            })
        };
        let x = coord()?;
        let y = coord()?;
        Ok(Vec2::new(x, y))
    };

    while let Some(action) = tokens.next() {
        let command = match action {
            "m" => PathCommand::MoveTo(point(&mut tokens)?),
            "l" => PathCommand::LineTo(point(&mut tokens)?),
            "q" => {
                let to = point(&mut tokens)?;
                let ctrl = point(&mut tokens)?;
                PathCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = point(&mut tokens)?;
                let ctrl1 = point(&mut tokens)?;
                let ctrl2 = point(&mut tokens)?;
                PathCommand::CubicTo { ctrl1, ctrl2, to }
            }
            // Close markers and stray tokens carry no geometry.
            _ => continue,
        };
        commands.push(command);
    }
    Ok(commands)
}

/// Converts path commands into closed point contours in world units.
fn flatten(commands: &[PathCommand], scale: f32, offset: Vec2, divisions: u32) -> Vec<Vec<Vec2>> {
    let map = |p: Vec2| p * scale + offset;
    let mut contours = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                if current.len() > 2 {
                    contours.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push(map(p));
            }
            PathCommand::LineTo(p) => current.push(map(p)),
            PathCommand::QuadTo { ctrl, to } => {
                let start = current.last().copied().unwrap_or(map(to));
                let (ctrl, to) = (map(ctrl), map(to));
                for step in 1..=divisions {
                    let t = step as f32 / divisions as f32;
                    let mt = 1.0 - t;
                    current.push(start * (mt * mt) + ctrl * (2.0 * mt * t) + to * (t * t));
                }
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                let start = current.last().copied().unwrap_or(map(to));
                let (c1, c2, to) = (map(ctrl1), map(ctrl2), map(to));
                for step in 1..=divisions {
                    let t = step as f32 / divisions as f32;
                    let mt = 1.0 - t;
                    current.push(
                        start * (mt * mt * mt)
                            + c1 * (3.0 * mt * mt * t)
                            + c2 * (3.0 * mt * t * t)
                            + to * (t * t * t),
                    );
                }
            }
        }
    }
    if current.len() > 2 {
        contours.push(current);
    }
    contours
}

/// Sorts contours into solids (clockwise) and holes (counter-clockwise), and
/// attaches each hole to the solid that contains it.
fn group_contours(contours: Vec<Vec<Vec2>>) -> Vec<Shape> {
    if contours.len() == 1 {
        return contours
            .into_iter()
            .map(|outer| Shape {
                outer,
                holes: Vec::new(),
            })
            .collect();
    }

    let mut shapes: Vec<Shape> = Vec::new();
    let mut holes: Vec<(usize, Vec<Vec2>)> = Vec::new();
    for contour in contours {
        if signed_area(&contour) < 0.0 {
            shapes.push(Shape {
                outer: contour,
                holes: Vec::new(),
            });
        } else {
            holes.push((shapes.len(), contour));
        }
    }

    if shapes.is_empty() {
        return holes
            .into_iter()
            .map(|(_, outer)| Shape {
                outer,
                holes: Vec::new(),
            })
            .collect();
    }

    for (solids_before, hole) in holes {
        let owner = shapes
            .iter()
            .position(|s| point_in_polygon(hole[0], &s.outer))
            .unwrap_or(solids_before.saturating_sub(1));
        shapes[owner].holes.push(hole);
    }
    shapes
}

fn point_in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + n - 1) % n];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tiny font: `o` is a square with a square hole, `l` a bar, `?` a dot.
    pub(crate) const TEST_FONT: &str = r#"{
        "familyName": "Test Sans",
        "resolution": 1000,
        "boundingBox": { "yMin": -200, "xMin": 0, "yMax": 800, "xMax": 700 },
        "underlineThickness": 50,
        "glyphs": {
            "o": {
                "ha": 700,
                "o": "m 0 0 l 0 700 l 600 700 l 600 0 l 0 0 m 150 150 l 450 150 l 450 550 l 150 550 l 150 150 z"
            },
            "l": { "ha": 300, "o": "m 0 0 l 0 700 l 200 700 l 200 0 z" },
            "?": { "ha": 400, "o": "m 0 0 l 0 100 l 100 100 l 100 0" },
            "c": { "ha": 500, "o": "m 0 0 q 400 0 200 400 b 0 200 400 200 0 0" },
            " ": { "ha": 250 }
        }
    }"#;

    #[test]
    fn test_parse_metadata() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        assert_eq!(font.family_name(), "Test Sans");
        assert_eq!(font.resolution(), 1000.0);
        assert_eq!(font.glyph_count(), 5);
        assert!(font.has_glyph('o'));
        assert!(!font.has_glyph('x'));
    }

    #[test]
    fn test_glyph_with_hole() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let shapes = font.shapes("o", 1.0, 12);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].holes.len(), 1);
        assert!(signed_area(&shapes[0].outer) < 0.0);
        // Scaled by size / resolution.
        assert!(shapes[0].outer.iter().any(|p| (p.y - 0.7).abs() < 1e-5));
    }

    #[test]
    fn test_advance_offsets_glyphs() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let shapes = font.shapes("o l", 2.0, 12);
        assert_eq!(shapes.len(), 2);
        let min_x = shapes[1].outer.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        // (700 + 250) font units at 2 / 1000 per unit.
        assert!((min_x - 1.9).abs() < 1e-5);
    }

    #[test]
    fn test_newline_moves_down() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let shapes = font.shapes("l\nl", 1.0, 12);
        assert_eq!(shapes.len(), 2);
        let min_y = shapes[1].outer.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        assert!((min_y + 1.05).abs() < 1e-5);
        let min_x = shapes[1].outer.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        assert!(min_x.abs() < 1e-6);
    }

    #[test]
    fn test_missing_glyph_falls_back_to_question_mark() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let shapes = font.shapes("x", 1.0, 12);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].outer.len(), 4);
    }

    #[test]
    fn test_curves_are_flattened() {
        let font = Typeface::from_json(TEST_FONT).unwrap();
        let shapes = font.shapes("c", 1000.0, 12);
        assert_eq!(shapes.len(), 1);
        let outer = &shapes[0].outer;
        assert_eq!(outer.len(), 1 + 12 + 12);
        // Quadratic ends at its end point, cubic ends at (0, 200).
        assert!((outer[12] - Vec2::new(400.0, 0.0)).length() < 1e-3);
        assert!((outer[24] - Vec2::new(0.0, 200.0)).length() < 1e-3);
    }

    #[test]
    fn test_malformed_outline() {
        let json = r#"{"resolution": 1000, "glyphs": {"a": {"ha": 1, "o": "m 0 zero"}}}"#;
        let err = Typeface::from_json(json).unwrap_err();
        assert!(matches!(err, TypefaceError::Outline { glyph: 'a', .. }));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let json = r#"{"resolution": 0, "glyphs": {}}"#;
        assert!(matches!(
            Typeface::from_json(json),
            Err(TypefaceError::InvalidResolution(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Typeface::from_json("not json"),
            Err(TypefaceError::Json(_))
        ));
    }
}
