//! Levels
//!
//! A level is an ordered list of placed instances. This module also holds
//! race validation (one start, one finish), checkpoint ordering and the
//! editing-session container [`LevelDatabase`].

use uuid::Uuid;

use crate::persistence::{self, PersistenceError};
use crate::registry::TemplateRegistry;
use crate::types::{ObjectInstance, RaceRole, TemplateLink, Value, Vector3, CHECKPOINT_INDEX_FIELD};

/// Race layout problems; only the first one found is reported
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Level has no start area")]
    MissingStart,

    #[error("Level has {0} start areas, expected exactly one")]
    MultipleStart(usize),

    #[error("Level has no finish area")]
    MissingFinish,

    #[error("Level has {0} finish areas, expected exactly one")]
    MultipleFinish(usize),
}

/// An instance whose logic key the registry does not know
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No template for logic key '{logic_key}' (object {instance_id})")]
pub struct UnresolvedTemplateError {
    pub instance_id: Uuid,
    pub logic_key: String,
}

/// A named, ordered collection of placed objects.
///
/// On disk a level is a versioned document, see [`persistence::serialize`].
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub name: String,
    pub objects: Vec<ObjectInstance>,
}

impl Level {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: Vec::new(),
        }
    }

    /// Append `instance` unless an object with the same id is present
    pub fn add_object(&mut self, instance: ObjectInstance) -> bool {
        if self.find(instance.id).is_some() {
            return false;
        }
        self.objects.push(instance);
        true
    }

    pub fn remove_object(&mut self, id: Uuid) -> Option<ObjectInstance> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(index))
    }

    pub fn find(&self, id: Uuid) -> Option<&ObjectInstance> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut ObjectInstance> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Re-establish every instance's template link from its logic key.
    ///
    /// Unknown keys (including an empty key) leave the instance in place,
    /// marked unresolved, and are returned so the caller can report them.
    pub fn relink(&mut self, registry: &TemplateRegistry) -> Vec<UnresolvedTemplateError> {
        let mut unresolved = Vec::new();

        for instance in &mut self.objects {
            if instance.key_guessed {
                tracing::warn!(
                    "Object {} uses guessed logic key '{}'",
                    instance.id,
                    instance.logic_key
                );
            }

            match registry.resolve(&instance.logic_key) {
                Some(template) => instance.set_link(TemplateLink::Resolved(template)),
                None => {
                    tracing::warn!(
                        "No template for logic key '{}', keeping object {} unresolved",
                        instance.logic_key,
                        instance.id
                    );
                    instance.set_link(TemplateLink::Unresolved);
                    unresolved.push(UnresolvedTemplateError {
                        instance_id: instance.id,
                        logic_key: instance.logic_key.clone(),
                    });
                }
            }
        }

        unresolved
    }

    fn with_role(&self, role: RaceRole) -> impl Iterator<Item = &ObjectInstance> {
        self.objects
            .iter()
            .filter(move |o| o.race_role() == Some(role))
    }

    /// Check the race layout: exactly one start and one finish area
    pub fn validate(&self) -> Result<(), ValidationError> {
        let starts = self.with_role(RaceRole::Start).count();
        let finishes = self.with_role(RaceRole::Finish).count();

        match starts {
            0 => return Err(ValidationError::MissingStart),
            1 => {}
            n => return Err(ValidationError::MultipleStart(n)),
        }
        match finishes {
            0 => Err(ValidationError::MissingFinish),
            1 => Ok(()),
            n => Err(ValidationError::MultipleFinish(n)),
        }
    }

    /// Position of the first start area
    pub fn start_position(&self) -> Option<Vector3> {
        self.with_role(RaceRole::Start).next().map(|o| o.position)
    }

    /// Checkpoint ids ordered by distance from the start area.
    ///
    /// Without a start area distances are measured from the origin. Equal
    /// distances keep placement order.
    pub fn checkpoint_order(&self) -> Vec<Uuid> {
        self.ranked_checkpoints()
            .into_iter()
            .map(|index| self.objects[index].id)
            .collect()
    }

    /// Positions in `objects` of every checkpoint, nearest to the start first
    fn ranked_checkpoints(&self) -> Vec<usize> {
        let origin = self.start_position().unwrap_or(Vector3::ZERO);
        let mut checkpoints: Vec<(f32, usize)> = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.race_role() == Some(RaceRole::Checkpoint))
            .map(|(index, o)| (o.position.distance(origin), index))
            .collect();
        checkpoints.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        checkpoints.into_iter().map(|(_, index)| index).collect()
    }

    /// Store each checkpoint's rank as its `_checkpointIndex` override.
    ///
    /// Returns the number of checkpoints indexed.
    pub fn calculate_checkpoint_indices(&mut self) -> usize {
        if self.start_position().is_none() {
            tracing::warn!(
                "Level '{}' has no start area, ordering checkpoints from the origin",
                self.name
            );
        }

        let ranked = self.ranked_checkpoints();
        for (rank, &index) in ranked.iter().enumerate() {
            self.objects[index].set_override_value(CHECKPOINT_INDEX_FIELD, &Value::Int(rank as i64));
        }
        ranked.len()
    }
}

// ============================================================================
// Editing session
// ============================================================================

type Listener = Box<dyn Fn(Option<&Level>) + Send + Sync>;

/// The level being edited, with change notification
#[derive(Default)]
pub struct LevelDatabase {
    current: Option<Level>,
    listeners: Vec<Listener>,
    loading: bool,
}

impl std::fmt::Debug for LevelDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelDatabase")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .field("loading", &self.loading)
            .finish()
    }
}

impl LevelDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Level> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Level> {
        self.current.as_mut()
    }

    /// Register a callback run after every change
    pub fn on_level_changed<F>(&mut self, listener: F)
    where
        F: Fn(Option<&Level>) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// While loading, change notifications are suppressed
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn notify(&self) {
        if self.loading {
            return;
        }
        for listener in &self.listeners {
            listener(self.current.as_ref());
        }
    }

    fn level_mut(&mut self) -> &mut Level {
        self.current.get_or_insert_with(|| Level::new("New Level"))
    }

    pub fn create_new_level(&mut self, name: &str) {
        self.current = Some(Level::new(name));
        self.notify();
    }

    pub fn set_level_name(&mut self, name: &str) {
        self.level_mut().name = name.to_string();
        self.notify();
    }

    /// Add an object, creating a level first if there is none
    pub fn add_object(&mut self, instance: ObjectInstance) -> bool {
        let added = self.level_mut().add_object(instance);
        if added {
            self.notify();
        }
        added
    }

    pub fn remove_object(&mut self, id: Uuid) -> Option<ObjectInstance> {
        let removed = self.current.as_mut()?.remove_object(id)?;
        self.notify();
        Some(removed)
    }

    /// Remove every object, keeping the level itself
    pub fn clear(&mut self) {
        if let Some(level) = &mut self.current {
            level.objects.clear();
        }
        self.notify();
    }

    /// Replace the current level with a parsed document.
    ///
    /// On a parse error the current level is kept. Listeners are notified
    /// once, after the load completes.
    pub fn load_from_json(
        &mut self,
        json: &str,
        registry: &TemplateRegistry,
    ) -> Result<Vec<UnresolvedTemplateError>, PersistenceError> {
        let was_loading = self.loading;
        self.loading = true;

        let result = persistence::deserialize(json).map(|mut level| {
            let unresolved = level.relink(registry);
            self.current = Some(level);
            unresolved
        });

        self.loading = was_loading;
        match &result {
            Ok(_) => self.notify(),
            Err(e) => tracing::error!("Failed to load level from JSON: {}", e),
        }
        result
    }

    /// Relink, order checkpoints and validate before entering play.
    ///
    /// Returns the number of checkpoints indexed. A validation error blocks
    /// play but leaves the level editable.
    pub fn prepare_for_play(&mut self, registry: &TemplateRegistry) -> Result<usize, ValidationError> {
        let Some(level) = self.current.as_mut() else {
            return Err(ValidationError::MissingStart);
        };

        level.relink(registry);
        let count = level.calculate_checkpoint_indices();
        let result = level.validate().map(|()| count);
        self.notify();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BuiltinContent, MemoryContent};
    use crate::types::{ObjectTemplate, TemplateKind, Transform};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn registry() -> TemplateRegistry {
        TemplateRegistry::new(BuiltinContent)
    }

    fn place(level: &mut Level, registry: &TemplateRegistry, key: &str, at: Vector3) -> Uuid {
        let template = registry.resolve(key).unwrap();
        let instance = ObjectInstance::new(template, Transform::at(at));
        let id = instance.id;
        level.add_object(instance);
        id
    }

    fn checkpoint_index(level: &Level, id: Uuid) -> Option<String> {
        level
            .find(id)
            .and_then(|o| o.get_override(CHECKPOINT_INDEX_FIELD))
            .map(|o| o.value.clone())
    }

    #[test]
    fn test_add_and_remove() {
        let mut level = Level::new("Test");
        let instance = ObjectInstance::unlinked("Bumper", Transform::IDENTITY);
        let id = instance.id;

        assert!(level.add_object(instance.clone()));
        assert!(!level.add_object(instance));
        assert_eq!(level.objects.len(), 1);

        assert!(level.remove_object(id).is_some());
        assert!(level.remove_object(id).is_none());
    }

    #[test]
    fn test_validate_complete_level() {
        let registry = registry();
        let mut level = Level::new("Race");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        place(&mut level, &registry, "FinishArea", Vector3::new(0.0, 0.0, 50.0));
        assert_eq!(level.validate(), Ok(()));
    }

    #[test]
    fn test_missing_start_takes_priority() {
        let registry = registry();
        let mut level = Level::new("Race");
        assert_eq!(level.validate(), Err(ValidationError::MissingStart));

        place(&mut level, &registry, "FinishArea", Vector3::ZERO);
        place(&mut level, &registry, "FinishArea", Vector3::ZERO);
        assert_eq!(level.validate(), Err(ValidationError::MissingStart));
    }

    #[test]
    fn test_multiple_start_and_finish() {
        let registry = registry();
        let mut level = Level::new("Race");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        assert_eq!(level.validate(), Err(ValidationError::MultipleStart(2)));

        let mut level = Level::new("Race");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        assert_eq!(level.validate(), Err(ValidationError::MissingFinish));
        place(&mut level, &registry, "FinishArea", Vector3::ZERO);
        place(&mut level, &registry, "FinishArea", Vector3::ZERO);
        place(&mut level, &registry, "FinishArea", Vector3::ZERO);
        assert_eq!(level.validate(), Err(ValidationError::MultipleFinish(3)));
    }

    #[test]
    fn test_checkpoints_by_distance() {
        let registry = registry();
        let mut level = Level::new("Race");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        let far = place(&mut level, &registry, "Checkpoint", Vector3::new(0.0, 0.0, 5.0));
        let near = place(&mut level, &registry, "Checkpoint", Vector3::new(1.0, 0.0, 0.0));
        let mid = place(&mut level, &registry, "Checkpoint", Vector3::new(0.0, 3.0, 0.0));

        assert_eq!(level.calculate_checkpoint_indices(), 3);
        assert_eq!(checkpoint_index(&level, far).as_deref(), Some("2"));
        assert_eq!(checkpoint_index(&level, near).as_deref(), Some("0"));
        assert_eq!(checkpoint_index(&level, mid).as_deref(), Some("1"));
        assert_eq!(level.checkpoint_order(), vec![near, mid, far]);
    }

    #[test]
    fn test_checkpoint_indices_idempotent() {
        let registry = registry();
        let mut level = Level::new("Race");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        let a = place(&mut level, &registry, "Checkpoint", Vector3::new(0.0, 0.0, 10.0));
        let b = place(&mut level, &registry, "Checkpoint", Vector3::new(0.0, 0.0, 20.0));
        let bumper = place(&mut level, &registry, "Bumper", Vector3::new(0.0, 0.0, 1.0));

        level.calculate_checkpoint_indices();
        let snapshot = crate::persistence::serialize(&level).unwrap();
        level.calculate_checkpoint_indices();
        assert_eq!(crate::persistence::serialize(&level).unwrap(), snapshot);

        for id in [a, b] {
            let count = level
                .find(id)
                .unwrap()
                .overrides
                .iter()
                .filter(|o| o.name == CHECKPOINT_INDEX_FIELD)
                .count();
            assert_eq!(count, 1);
        }

        // inserting a nearer checkpoint only shifts checkpoint indices
        let c = place(&mut level, &registry, "Checkpoint", Vector3::new(0.0, 0.0, 5.0));
        level.calculate_checkpoint_indices();
        assert_eq!(checkpoint_index(&level, c).as_deref(), Some("0"));
        assert_eq!(checkpoint_index(&level, a).as_deref(), Some("1"));
        assert_eq!(checkpoint_index(&level, b).as_deref(), Some("2"));
        assert!(level.find(bumper).unwrap().overrides.is_empty());
    }

    #[test]
    fn test_checkpoint_ties_keep_placement_order() {
        let registry = registry();
        let mut level = Level::new("Race");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        let first = place(&mut level, &registry, "Checkpoint", Vector3::new(3.0, 0.0, 0.0));
        let second = place(&mut level, &registry, "Checkpoint", Vector3::new(-3.0, 0.0, 0.0));
        assert_eq!(level.checkpoint_order(), vec![first, second]);
    }

    #[test]
    fn test_checkpoints_sharing_an_id_are_all_indexed() {
        let registry = registry();
        let mut level = Level::new("Race");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        let template = registry.resolve("Checkpoint").unwrap();
        let far = ObjectInstance::new(template.clone(), Transform::at(Vector3::new(0.0, 0.0, 5.0)));
        let mut near = ObjectInstance::new(template, Transform::at(Vector3::new(0.0, 0.0, 1.0)));
        near.id = far.id;
        // add_object refuses the copy, hand-edited documents do not
        level.objects.push(far);
        level.objects.push(near);

        assert_eq!(level.calculate_checkpoint_indices(), 2);
        let index = |i: usize| {
            level.objects[i]
                .get_override(CHECKPOINT_INDEX_FIELD)
                .map(|o| o.value.clone())
        };
        assert_eq!(index(1).as_deref(), Some("1"));
        assert_eq!(index(2).as_deref(), Some("0"));
    }

    #[test]
    fn test_checkpoints_without_start_use_origin() {
        let registry = registry();
        let mut level = Level::new("Race");
        let far = place(&mut level, &registry, "Checkpoint", Vector3::new(9.0, 0.0, 0.0));
        let near = place(&mut level, &registry, "Checkpoint", Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(level.start_position(), None);
        assert_eq!(level.calculate_checkpoint_indices(), 2);
        assert_eq!(checkpoint_index(&level, near).as_deref(), Some("0"));
        assert_eq!(checkpoint_index(&level, far).as_deref(), Some("1"));
    }

    #[test]
    fn test_unresolved_instances_are_skipped() {
        let registry = registry();
        let mut level = Level::new("Race");
        level.add_object(ObjectInstance::unlinked("StartArea", Transform::IDENTITY));
        level.add_object(ObjectInstance::unlinked("FinishArea", Transform::IDENTITY));
        let ramp = ObjectInstance::unlinked("Ramp", Transform::IDENTITY);
        let ramp_id = ramp.id;
        level.add_object(ramp);

        // nothing is linked before relink
        assert_eq!(level.validate(), Err(ValidationError::MissingStart));

        let unresolved = level.relink(&registry);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].logic_key, "Ramp");
        assert_eq!(unresolved[0].instance_id, ramp_id);

        let ramp = level.find(ramp_id).unwrap();
        assert!(ramp.is_unresolved());
        assert_eq!(level.objects.len(), 3);
        assert_eq!(level.validate(), Ok(()));
        assert_eq!(level.calculate_checkpoint_indices(), 0);
    }

    #[test]
    fn test_empty_key_is_unresolved() {
        let registry = registry();
        let mut level = Level::new("Race");
        level.add_object(ObjectInstance::unlinked("", Transform::IDENTITY));
        let unresolved = level.relink(&registry);
        assert_eq!(unresolved.len(), 1);
        assert!(level.objects[0].is_unresolved());
    }

    #[test]
    fn test_role_by_key_fallback() {
        let registry = TemplateRegistry::new(MemoryContent::new(vec![
            ObjectTemplate::new("StartArea", "Start", TemplateKind::StaticPlatform),
            ObjectTemplate::new("FinishArea", "Finish", TemplateKind::StaticPlatform),
        ]));
        let mut level = Level::new("Keys");
        place(&mut level, &registry, "StartArea", Vector3::ZERO);
        place(&mut level, &registry, "FinishArea", Vector3::ZERO);
        assert_eq!(level.validate(), Ok(()));
    }

    #[test]
    fn test_database_notifies() {
        let registry = registry();
        let changes = Arc::new(AtomicUsize::new(0));
        let mut db = LevelDatabase::new();
        let counter = changes.clone();
        db.on_level_changed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let instance = ObjectInstance::new(registry.resolve("Bumper").unwrap(), Transform::IDENTITY);
        let id = instance.id;
        assert!(db.add_object(instance.clone()));
        assert_eq!(db.current().unwrap().name, "New Level");
        assert!(!db.add_object(instance));
        assert_eq!(changes.load(Ordering::SeqCst), 1);

        db.set_level_name("Renamed");
        assert!(db.remove_object(id).is_some());
        assert!(db.remove_object(id).is_none());
        assert_eq!(changes.load(Ordering::SeqCst), 3);

        db.set_loading(true);
        db.clear();
        assert_eq!(changes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_database_load_from_json() {
        let registry = registry();
        let changes = Arc::new(AtomicUsize::new(0));
        let mut db = LevelDatabase::new();
        let counter = changes.clone();
        db.on_level_changed(move |level| {
            assert!(level.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let json = r#"{
            "version": 1,
            "levelName": "Loaded",
            "objects": [ { "logicKey": "Bumper" }, { "logicKey": "Ramp" } ]
        }"#;
        let unresolved = db.load_from_json(json, &registry).unwrap();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(db.current().unwrap().name, "Loaded");
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert!(!db.is_loading());

        assert!(db.load_from_json("{ not json", &registry).is_err());
        assert_eq!(db.current().unwrap().name, "Loaded");
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prepare_for_play() {
        let registry = registry();
        let mut db = LevelDatabase::new();
        assert_eq!(db.prepare_for_play(&registry), Err(ValidationError::MissingStart));

        db.create_new_level("Race");
        db.add_object(ObjectInstance::unlinked("StartArea", Transform::IDENTITY));
        db.add_object(ObjectInstance::unlinked(
            "Checkpoint",
            Transform::at(Vector3::new(0.0, 0.0, 4.0)),
        ));
        assert_eq!(db.prepare_for_play(&registry), Err(ValidationError::MissingFinish));

        // still editable after a failed validation
        db.add_object(ObjectInstance::unlinked(
            "FinishArea",
            Transform::at(Vector3::new(0.0, 0.0, 8.0)),
        ));
        assert_eq!(db.prepare_for_play(&registry), Ok(1));
    }
}
