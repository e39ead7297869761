use super::config::SolverConfig;
use super::constraint::{ConstraintId, ConstraintKind};
use super::error::{ConfigError, GraphError};
use super::graph::ConstraintGraph;
use crate::geometry::{Circle2, Isometry2, Point2, Segment2, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of an entity inside a sketch's arena.
/// Slots are never reused, so a handle stays unambiguous after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Point,
    Line,
    Circle,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "Point"),
            Self::Line => write!(f, "Line"),
            Self::Circle => write!(f, "Circle"),
        }
    }
}

/// Shape data expressed in the entity's local frame.
/// A point sits at the origin of its frame, a circle's center likewise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityGeometry {
    Point,
    Line { start: Point2, end: Point2 },
    Circle { radius: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub geometry: EntityGeometry,
    /// Local transform. The solver only reads and writes its translation,
    /// except for lines whose endpoints are rewritten in place.
    pub transform: Isometry2,
    /// Position is given and never solved.
    #[serde(default)]
    pub fixed: bool,
    /// Set by interactive editing on the entity being dragged.
    #[serde(default)]
    pub moved: bool,
    /// Number of constraints referring to this entity.
    #[serde(skip)]
    refs: usize,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self.geometry {
            EntityGeometry::Point => EntityKind::Point,
            EntityGeometry::Line { .. } => EntityKind::Line,
            EntityGeometry::Circle { .. } => EntityKind::Circle,
        }
    }

    pub fn refs(&self) -> usize {
        self.refs
    }

    /// Origin of the local frame in sketch coordinates.
    pub fn position(&self) -> Point2 {
        Point2::from(self.transform.translation.vector)
    }

    pub fn set_position(&mut self, p: Point2) {
        self.transform.translation.vector = p.coords;
    }

    pub fn translate(&mut self, offset: &Vector2) {
        self.transform.translation.vector += offset;
    }

    /// World-space segment of a line entity.
    pub fn segment(&self) -> Option<Segment2> {
        match &self.geometry {
            EntityGeometry::Line { start, end } => Some(Segment2::new(
                self.transform.transform_point(start),
                self.transform.transform_point(end),
            )),
            _ => None,
        }
    }

    /// Rewrites a line's local endpoints so its world segment equals `seg`.
    pub fn set_segment(&mut self, seg: &Segment2) {
        if let EntityGeometry::Line { start, end } = &mut self.geometry {
            *start = self.transform.inverse_transform_point(&seg.start);
            *end = self.transform.inverse_transform_point(&seg.end);
        }
    }

    pub fn circle(&self) -> Option<Circle2> {
        match self.geometry {
            EntityGeometry::Circle { radius } => Some(Circle2::new(self.position(), radius)),
            _ => None,
        }
    }
}

/// Owning storage for a sketch's entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityArena {
    slots: Vec<Option<Entity>>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, geometry: EntityGeometry, transform: Isometry2) -> EntityId {
        let id = EntityId(self.slots.len() as u32);
        self.slots.push(Some(Entity {
            id,
            name: name.into(),
            geometry,
            transform,
            fixed: false,
            moved: false,
            refs: 0,
        }));
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Live entities in handle order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label used in diagnostics: the name when set, the handle otherwise.
    pub fn label(&self, id: EntityId) -> String {
        match self.get(id) {
            Some(e) if !e.name.is_empty() => e.name.clone(),
            _ => id.to_string(),
        }
    }

    pub(crate) fn retain(&mut self, id: EntityId) {
        if let Some(e) = self.get_mut(id) {
            e.refs += 1;
        }
    }

    pub(crate) fn release(&mut self, id: EntityId) {
        if let Some(e) = self.get_mut(id) {
            e.refs = e.refs.saturating_sub(1);
        }
    }

    /// Frees a slot. Refused while any constraint still refers to it.
    pub fn remove(&mut self, id: EntityId) -> Result<Entity, GraphError> {
        let refs = self.get(id).ok_or(GraphError::UnknownEntity(id))?.refs;
        if refs > 0 {
            return Err(GraphError::EntityInUse { id, refs });
        }
        self.slots[id.0 as usize]
            .take()
            .ok_or(GraphError::UnknownEntity(id))
    }

    fn clear_refs(&mut self) {
        for e in self.slots.iter_mut().flatten() {
            e.refs = 0;
        }
    }

    /// Every live entity sits in the slot its handle names.
    fn check_slots(&self) -> Result<(), GraphError> {
        for (slot, entity) in self.slots.iter().enumerate() {
            if let Some(e) = entity {
                if e.id.0 as usize != slot {
                    return Err(GraphError::MisplacedEntity { slot, id: e.id });
                }
            }
        }
        Ok(())
    }
}

/// A 2D parametric sketch: owned entities plus the constraint graph over them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    pub name: String,
    pub(crate) entities: EntityArena,
    pub(crate) graph: ConstraintGraph,
    #[serde(default)]
    pub config: SolverConfig,
}

impl Sketch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn entities(&self) -> &EntityArena {
        &self.entities
    }

    pub fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn add_point(&mut self, name: impl Into<String>, pos: [f64; 2]) -> EntityId {
        let tf = Isometry2::translation(pos[0], pos[1]);
        self.entities.insert(name, EntityGeometry::Point, tf)
    }

    /// Adds a line whose frame origin is its start point.
    pub fn add_line(&mut self, name: impl Into<String>, start: [f64; 2], end: [f64; 2]) -> EntityId {
        let tf = Isometry2::translation(start[0], start[1]);
        let geometry = EntityGeometry::Line {
            start: Point2::origin(),
            end: Point2::new(end[0] - start[0], end[1] - start[1]),
        };
        self.entities.insert(name, geometry, tf)
    }

    pub fn add_circle(&mut self, name: impl Into<String>, center: [f64; 2], radius: f64) -> EntityId {
        let tf = Isometry2::translation(center[0], center[1]);
        self.entities.insert(name, EntityGeometry::Circle { radius }, tf)
    }

    pub fn set_fixed(&mut self, id: EntityId, fixed: bool) -> Result<(), GraphError> {
        self.entities.get_mut(id).ok_or(GraphError::UnknownEntity(id))?.fixed = fixed;
        Ok(())
    }

    pub fn set_moved(&mut self, id: EntityId, moved: bool) -> Result<(), GraphError> {
        self.entities.get_mut(id).ok_or(GraphError::UnknownEntity(id))?.moved = moved;
        Ok(())
    }

    pub fn set_position(&mut self, id: EntityId, pos: [f64; 2]) -> Result<(), GraphError> {
        self.entities
            .get_mut(id)
            .ok_or(GraphError::UnknownEntity(id))?
            .set_position(Point2::new(pos[0], pos[1]));
        Ok(())
    }

    pub fn position(&self, id: EntityId) -> Option<Point2> {
        self.entities.get(id).map(|e| e.position())
    }

    /// Adds a constraint and registers it as a back-reference on both
    /// endpoints.
    pub fn add_constraint(
        &mut self,
        kind: ConstraintKind,
        first: EntityId,
        second: EntityId,
        value: f64,
    ) -> Result<ConstraintId, GraphError> {
        for id in [first, second] {
            if !self.entities.contains(id) {
                return Err(GraphError::UnknownEntity(id));
            }
        }
        let id = self.graph.add(kind, first, second, value)?;
        self.entities.retain(first);
        self.entities.retain(second);
        Ok(id)
    }

    pub fn del_constraint(&mut self, id: ConstraintId) -> Result<(), GraphError> {
        let removed = self.graph.remove(id).ok_or(GraphError::UnknownConstraint(id))?;
        for n in removed.nodes {
            self.entities.release(n);
        }
        Ok(())
    }

    /// Updates the numeric payload of an existing constraint, the only field
    /// that may change in place.
    pub fn set_constraint_value(&mut self, id: ConstraintId, value: f64) -> Result<(), GraphError> {
        self.graph.set_value(id, value)
    }

    /// Deletes an entity together with every constraint touching it.
    pub fn delete_entity(&mut self, id: EntityId) -> Result<Entity, GraphError> {
        if !self.entities.contains(id) {
            return Err(GraphError::UnknownEntity(id));
        }
        let touching: Vec<ConstraintId> = self.graph.incident(id).map(|c| c.id).collect();
        for cid in touching {
            self.del_constraint(cid)?;
        }
        self.entities.remove(id)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a sketch, validates every constraint against the loaded
    /// entities and rebuilds entity back-references.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut sketch: Sketch = serde_json::from_str(json)?;
        sketch.entities.check_slots()?;
        sketch.entities.clear_refs();

        let loaded = std::mem::take(&mut sketch.graph);
        let mut graph = ConstraintGraph::new();
        for c in loaded.iter() {
            if let Some(&missing) = c.nodes.iter().find(|&&n| !sketch.entities.contains(n)) {
                return Err(GraphError::UnknownEntity(missing).into());
            }
            graph.check(c)?;
            graph.insert(*c);
            for n in c.nodes {
                sketch.entities.retain(n);
            }
        }
        graph.adopt_ids(&loaded);
        sketch.graph = graph;
        Ok(sketch)
    }
}
