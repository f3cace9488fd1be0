//! # Scene Graph
//!
//! A flat scene graph: every object lives in the scene's object store and is
//! rendered only while its id is in the ordered list of attached children.
//! Detaching keeps the object (and its id) alive so it can be re-attached.

use glam::Vec3;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Linear RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Linear blend towards `other` by `t`
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

/// Exponential squared fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Fog {
    pub fn exp2(color: Color, density: f32) -> Self {
        Self { color, density }
    }

    /// Fraction of fog color mixed in at `distance` from the camera
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

/// Stroke style of a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineMaterial {
    Basic {
        color: Color,
        linewidth: f32,
    },
    Dashed {
        color: Color,
        linewidth: f32,
        dash_size: f32,
        gap_size: f32,
    },
}

impl LineMaterial {
    pub fn color(&self) -> Color {
        match self {
            LineMaterial::Basic { color, .. } | LineMaterial::Dashed { color, .. } => *color,
        }
    }

    pub fn linewidth(&self) -> f32 {
        match self {
            LineMaterial::Basic { linewidth, .. } | LineMaterial::Dashed { linewidth, .. } => {
                *linewidth
            }
        }
    }

    pub fn is_dashed(&self) -> bool {
        matches!(self, LineMaterial::Dashed { .. })
    }
}

/// Polyline through `vertices` in order
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub vertices: Vec<Vec3>,
    pub material: LineMaterial,
}

impl Line {
    pub fn new(vertices: Vec<Vec3>, material: LineMaterial) -> Self {
        Self { vertices, material }
    }

    /// Cumulative distance along the line at each vertex.
    ///
    /// Dashed materials lay out dashes along these distances.
    pub fn line_distances(&self) -> Vec<f32> {
        let mut total = 0.0;
        let mut distances = Vec::with_capacity(self.vertices.len());
        for (i, vertex) in self.vertices.iter().enumerate() {
            if i > 0 {
                total += vertex.distance(self.vertices[i - 1]);
            }
            distances.push(total);
        }
        distances
    }

    pub fn length(&self) -> f32 {
        self.line_distances().last().copied().unwrap_or(0.0)
    }

    /// Mean of all vertices, or the origin for an empty line
    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Light arriving from `position` towards the origin
    Directional { color: Color, position: Vec3 },
    Ambient { color: Color },
}

impl Light {
    pub fn color(&self) -> Color {
        match self {
            Light::Directional { color, .. } | Light::Ambient { color } => *color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneObjectKind {
    Line(Line),
    Light(Light),
}

/// Scene object handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub kind: SceneObjectKind,
}

impl SceneObject {
    pub fn as_line(&self) -> Option<&Line> {
        match &self.kind {
            SceneObjectKind::Line(line) => Some(line),
            SceneObjectKind::Light(_) => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            SceneObjectKind::Light(light) => Some(light),
            SceneObjectKind::Line(_) => None,
        }
    }
}

/// Root scene node
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub background: Option<Color>,
    pub fog: Option<Fog>,
    objects: BTreeMap<ObjectId, SceneObject>,
    children: Vec<ObjectId>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object without attaching it
    pub fn insert(&mut self, name: impl Into<String>, kind: SceneObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        debug!("Inserted scene object {} ({})", id, name);
        self.objects.insert(id, SceneObject { id, name, kind });
        id
    }

    /// Store and attach an object
    pub fn add(&mut self, name: impl Into<String>, kind: SceneObjectKind) -> ObjectId {
        let id = self.insert(name, kind);
        self.children.push(id);
        id
    }

    /// Attach objects in order. Already attached ids are left in place.
    pub fn attach(&mut self, ids: &[ObjectId]) {
        for id in ids {
            if !self.objects.contains_key(id) {
                warn!("Ignoring attach of unknown scene object {}", id);
                continue;
            }
            if !self.children.contains(id) {
                self.children.push(*id);
            }
        }
    }

    /// Detach objects. Ids that are not attached are ignored.
    pub fn detach(&mut self, ids: &[ObjectId]) {
        self.children.retain(|child| !ids.contains(child));
    }

    pub fn is_attached(&self, id: ObjectId) -> bool {
        self.children.contains(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    pub fn line(&self, id: ObjectId) -> Option<&Line> {
        self.get(id).and_then(SceneObject::as_line)
    }

    /// Attached child ids in render order
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Attached objects in render order
    pub fn visible_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.children.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn stats(&self) -> SceneStats {
        let mut stats = SceneStats {
            objects: self.objects.len(),
            attached: self.children.len(),
            ..SceneStats::default()
        };
        for object in self.visible_objects() {
            match &object.kind {
                SceneObjectKind::Line(line) => {
                    stats.lines += 1;
                    stats.vertices += line.vertices.len();
                }
                SceneObjectKind::Light(_) => stats.lights += 1,
            }
        }
        stats
    }
}

/// Counts over the scene; `lines`, `lights` and `vertices` cover attached objects only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub objects: usize,
    pub attached: usize,
    pub lines: usize,
    pub lights: usize,
    pub vertices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(to: Vec3) -> SceneObjectKind {
        SceneObjectKind::Line(Line::new(
            vec![Vec3::ZERO, to],
            LineMaterial::Basic {
                color: Color::BLACK,
                linewidth: 1.0,
            },
        ))
    }

    #[test]
    fn test_color_hex() {
        let blue = Color::from_hex(0x002288);
        assert_eq!(blue.r, 0.0);
        assert!((blue.g - 34.0 / 255.0).abs() < 1e-6);
        assert_eq!(blue.to_hex(), 0x002288);
        assert_eq!(Color::WHITE.to_hex(), 0xffffff);
    }

    #[test]
    fn test_fog_factor_grows_with_distance() {
        let fog = Fog::exp2(Color::from_hex(0xcccccc), 0.002);
        assert_eq!(fog.factor(0.0), 0.0);
        assert!(fog.factor(50.0) < fog.factor(500.0));
        assert!(fog.factor(1.0e6) <= 1.0);
    }

    #[test]
    fn test_line_distances() {
        let line = Line::new(
            vec![Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0), Vec3::new(3.0, 4.0, 10.0)],
            LineMaterial::Basic {
                color: Color::BLACK,
                linewidth: 1.0,
            },
        );
        assert_eq!(line.line_distances(), vec![0.0, 5.0, 15.0]);
        assert_eq!(line.length(), 15.0);
        assert_eq!(line.centroid(), Vec3::new(2.0, 8.0 / 3.0, 10.0 / 3.0));
    }

    #[test]
    fn test_empty_line() {
        let line = Line::new(
            Vec::new(),
            LineMaterial::Basic {
                color: Color::BLACK,
                linewidth: 1.0,
            },
        );
        assert!(line.line_distances().is_empty());
        assert_eq!(line.length(), 0.0);
        assert_eq!(line.centroid(), Vec3::ZERO);
    }

    #[test]
    fn test_attach_and_detach_are_idempotent() {
        let mut scene = Scene::new();
        let a = scene.add("a", segment(Vec3::X));
        let b = scene.add("b", segment(Vec3::Y));

        scene.attach(&[a, b]);
        assert_eq!(scene.children(), &[a, b]);

        scene.detach(&[a]);
        scene.detach(&[a]);
        assert_eq!(scene.children(), &[b]);
        assert!(scene.get(a).is_some());

        scene.attach(&[a]);
        assert_eq!(scene.children(), &[b, a]);
    }

    #[test]
    fn test_insert_does_not_attach() {
        let mut scene = Scene::new();
        let id = scene.insert("hidden", segment(Vec3::Z));
        assert!(!scene.is_attached(id));
        assert_eq!(scene.visible_objects().count(), 0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_stats_count_attached_only() {
        let mut scene = Scene::new();
        let line = scene.add("line", segment(Vec3::X));
        scene.add(
            "ambient",
            SceneObjectKind::Light(Light::Ambient {
                color: Color::from_hex(0x222222),
            }),
        );
        scene.detach(&[line]);

        let stats = scene.stats();
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.attached, 1);
        assert_eq!(stats.lines, 0);
        assert_eq!(stats.lights, 1);
        assert_eq!(stats.vertices, 0);
    }
}
