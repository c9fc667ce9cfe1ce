//! Object templates
//!
//! A template is the shared, immutable definition behind every placed object:
//! its visual, its default physical body and the default value of each
//! parameter a designer may override per instance.

use serde::{Deserialize, Serialize};

use super::math::Vector3;
use super::value::{EnumKind, FromValue, Value, ValueType};

/// Logic key of the race start area
pub const START_AREA_KEY: &str = "StartArea";
/// Logic key of the race finish area
pub const FINISH_AREA_KEY: &str = "FinishArea";
/// Logic key of race checkpoints
pub const CHECKPOINT_KEY: &str = "Checkpoint";
/// Override written by checkpoint ordering
pub const CHECKPOINT_INDEX_FIELD: &str = "_checkpointIndex";

/// Marks a declared field as overridable per instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelEditable {
    /// `false` for fields that are written by tooling (e.g. checkpoint index)
    /// rather than edited by hand. Resolution treats both the same.
    pub show_in_inspector: bool,
}

/// A field declared by a template type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub value_type: ValueType,
    pub editable: Option<LevelEditable>,
}

impl FieldDecl {
    pub const fn editable(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            editable: Some(LevelEditable { show_in_inspector: true }),
        }
    }

    pub const fn hidden(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            editable: Some(LevelEditable { show_in_inspector: false }),
        }
    }

    pub const fn fixed(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            editable: None,
        }
    }
}

/// Parameters contributed by one template subtype
pub trait TemplateParams {
    /// Append this subtype's fields in declaration order
    fn declare_fields(fields: &mut Vec<FieldDecl>);

    /// Template default for a declared field
    fn field_value(&self, name: &str) -> Option<Value>;
}

fn unit_scale() -> Vector3 {
    Vector3::ONE
}

// ============================================================================
// Areas
// ============================================================================

/// Trigger volume shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AreaShape {
    #[default]
    #[serde(alias = "Box")]
    Box,
    #[serde(alias = "Sphere")]
    Sphere,
    #[serde(alias = "Capsule")]
    Capsule,
}

impl AreaShape {
    pub fn as_str(self) -> &'static str {
        match self {
            AreaShape::Box => "Box",
            AreaShape::Sphere => "Sphere",
            AreaShape::Capsule => "Capsule",
        }
    }
}

impl From<AreaShape> for Value {
    fn from(shape: AreaShape) -> Self {
        Value::Enum(EnumKind::AreaShape, shape.as_str())
    }
}

impl FromValue for AreaShape {
    fn from_value(value: Value) -> Option<Self> {
        match value.coerce(ValueType::Enum(EnumKind::AreaShape))? {
            Value::Enum(_, "Box") => Some(AreaShape::Box),
            Value::Enum(_, "Sphere") => Some(AreaShape::Sphere),
            Value::Enum(_, "Capsule") => Some(AreaShape::Capsule),
            _ => None,
        }
    }
}

/// Generic trigger volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AreaParams {
    pub shape: AreaShape,
    pub center: Vector3,
    pub area_size: Vector3,
    pub radius: f32,
    pub capsule_height: f32,
    /// 0 = X, 1 = Y, 2 = Z
    pub capsule_direction: i64,
}

impl Default for AreaParams {
    fn default() -> Self {
        Self {
            shape: AreaShape::Box,
            center: Vector3::ZERO,
            area_size: Vector3::ONE,
            radius: 1.0,
            capsule_height: 2.0,
            capsule_direction: 1,
        }
    }
}

impl TemplateParams for AreaParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        fields.extend([
            FieldDecl::fixed("_shape", ValueType::Enum(EnumKind::AreaShape)),
            FieldDecl::editable("_center", ValueType::Vector3),
            FieldDecl::editable("_areaSize", ValueType::Vector3),
            FieldDecl::editable("_radius", ValueType::Float),
            FieldDecl::editable("_capsuleHeight", ValueType::Float),
            FieldDecl::editable("_capsuleDirection", ValueType::Int),
        ]);
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        let value = match name {
            "_shape" => self.shape.into(),
            "_center" => self.center.into(),
            "_areaSize" => self.area_size.into(),
            "_radius" => self.radius.into(),
            "_capsuleHeight" => self.capsule_height.into(),
            "_capsuleDirection" => self.capsule_direction.into(),
            _ => return None,
        };
        Some(value)
    }
}

/// Race start area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartAreaParams {
    pub area: AreaParams,
    pub countdown_duration: f32,
}

impl Default for StartAreaParams {
    fn default() -> Self {
        Self {
            area: AreaParams::default(),
            countdown_duration: 3.0,
        }
    }
}

impl TemplateParams for StartAreaParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        AreaParams::declare_fields(fields);
        fields.push(FieldDecl::editable("_countdownDuration", ValueType::Float));
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "_countdownDuration" => Some(self.countdown_duration.into()),
            _ => self.area.field_value(name),
        }
    }
}

/// Race finish area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinishAreaParams {
    pub area: AreaParams,
    pub end_race_delay: f32,
}

impl Default for FinishAreaParams {
    fn default() -> Self {
        Self {
            area: AreaParams::default(),
            end_race_delay: 10.0,
        }
    }
}

impl TemplateParams for FinishAreaParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        AreaParams::declare_fields(fields);
        fields.push(FieldDecl::editable("_endRaceDelay", ValueType::Float));
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "_endRaceDelay" => Some(self.end_race_delay.into()),
            _ => self.area.field_value(name),
        }
    }
}

/// Race checkpoint; its index is derived from the level layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckpointParams {
    pub area: AreaParams,
    pub checkpoint_index: i64,
}

impl TemplateParams for CheckpointParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        AreaParams::declare_fields(fields);
        fields.push(FieldDecl::hidden(CHECKPOINT_INDEX_FIELD, ValueType::Int));
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            CHECKPOINT_INDEX_FIELD => Some(self.checkpoint_index.into()),
            _ => self.area.field_value(name),
        }
    }
}

// ============================================================================
// Platforms
// ============================================================================

/// Platform moving back and forth between two local offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovingPlatformParams {
    pub start_offset: Vector3,
    pub end_offset: Vector3,
    pub travel_time: f32,
    pub wait_delay: f32,
}

impl Default for MovingPlatformParams {
    fn default() -> Self {
        Self {
            start_offset: Vector3::ZERO,
            end_offset: Vector3::new(0.0, 0.0, 5.0),
            travel_time: 3.0,
            wait_delay: 1.0,
        }
    }
}

impl TemplateParams for MovingPlatformParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        fields.extend([
            FieldDecl::editable("_startOffset", ValueType::Vector3),
            FieldDecl::editable("_endOffset", ValueType::Vector3),
            FieldDecl::editable("_travelTime", ValueType::Float),
            FieldDecl::editable("_waitDelay", ValueType::Float),
        ]);
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        let value = match name {
            "_startOffset" => self.start_offset.into(),
            "_endOffset" => self.end_offset.into(),
            "_travelTime" => self.travel_time.into(),
            "_waitDelay" => self.wait_delay.into(),
            _ => return None,
        };
        Some(value)
    }
}

/// Trampoline with a trigger on its top surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JumperParams {
    pub jump_strength: f32,
    pub trigger_center: Vector3,
    pub trigger_size: Vector3,
}

impl Default for JumperParams {
    fn default() -> Self {
        Self {
            jump_strength: 20.0,
            trigger_center: Vector3::new(0.0, 0.5, 0.0),
            trigger_size: Vector3::new(2.0, 0.2, 2.0),
        }
    }
}

impl TemplateParams for JumperParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        fields.extend([
            FieldDecl::editable("_jumpStrength", ValueType::Float),
            FieldDecl::editable("_triggerCenter", ValueType::Vector3),
            FieldDecl::editable("_triggerSize", ValueType::Vector3),
        ]);
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        let value = match name {
            "_jumpStrength" => self.jump_strength.into(),
            "_triggerCenter" => self.trigger_center.into(),
            "_triggerSize" => self.trigger_size.into(),
            _ => return None,
        };
        Some(value)
    }
}

// ============================================================================
// Traps
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BumperParams {
    pub strength: f32,
}

impl Default for BumperParams {
    fn default() -> Self {
        Self { strength: 15.0 }
    }
}

impl TemplateParams for BumperParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        fields.push(FieldDecl::editable("_strength", ValueType::Float));
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "_strength" => Some(self.strength.into()),
            _ => None,
        }
    }
}

/// Wind zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlowerParams {
    pub wind_strength: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle: Option<String>,
    pub zone_center: Vector3,
    pub zone_size: Vector3,
}

impl Default for BlowerParams {
    fn default() -> Self {
        Self {
            wind_strength: 10.0,
            particle: None,
            zone_center: Vector3::new(0.0, 1.0, 2.0),
            zone_size: Vector3::new(2.0, 2.0, 4.0),
        }
    }
}

impl TemplateParams for BlowerParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        fields.extend([
            FieldDecl::editable("_windStrength", ValueType::Float),
            FieldDecl::fixed("_particle", ValueType::Handle),
            FieldDecl::editable("_zoneCenter", ValueType::Vector3),
            FieldDecl::editable("_zoneSize", ValueType::Vector3),
        ]);
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        let value = match name {
            "_windStrength" => self.wind_strength.into(),
            "_particle" => Value::Handle(self.particle.clone()?),
            "_zoneCenter" => self.zone_center.into(),
            "_zoneSize" => self.zone_size.into(),
            _ => return None,
        };
        Some(value)
    }
}

/// Turret that sweeps an arc and fires at players in range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LauncherParams {
    pub rotation_speed: f32,
    pub fire_rate: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<String>,
    pub search_angle_range: f32,
    pub detection_range: f32,
}

impl Default for LauncherParams {
    fn default() -> Self {
        Self {
            rotation_speed: 90.0,
            fire_rate: 1.0,
            bullet: None,
            search_angle_range: 45.0,
            detection_range: 10.0,
        }
    }
}

impl TemplateParams for LauncherParams {
    fn declare_fields(fields: &mut Vec<FieldDecl>) {
        fields.extend([
            FieldDecl::editable("_rotationSpeed", ValueType::Float),
            FieldDecl::editable("_fireRate", ValueType::Float),
            FieldDecl::fixed("_bullet", ValueType::Handle),
            FieldDecl::editable("_searchAngleRange", ValueType::Float),
            FieldDecl::editable("_detectionRange", ValueType::Float),
        ]);
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        let value = match name {
            "_rotationSpeed" => self.rotation_speed.into(),
            "_fireRate" => self.fire_rate.into(),
            "_bullet" => Value::Handle(self.bullet.clone()?),
            "_searchAngleRange" => self.search_angle_range.into(),
            "_detectionRange" => self.detection_range.into(),
            _ => return None,
        };
        Some(value)
    }
}

// ============================================================================
// Template
// ============================================================================

/// Concrete template type, used as the schema cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateType {
    StaticPlatform,
    MovingPlatform,
    Jumper,
    Area,
    StartArea,
    FinishArea,
    Checkpoint,
    DeadZone,
    Bumper,
    Blower,
    Launcher,
}

impl TemplateType {
    pub const ALL: &'static [TemplateType] = &[
        TemplateType::StaticPlatform,
        TemplateType::MovingPlatform,
        TemplateType::Jumper,
        TemplateType::Area,
        TemplateType::StartArea,
        TemplateType::FinishArea,
        TemplateType::Checkpoint,
        TemplateType::DeadZone,
        TemplateType::Bumper,
        TemplateType::Blower,
        TemplateType::Launcher,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateType::StaticPlatform => "staticPlatform",
            TemplateType::MovingPlatform => "movingPlatform",
            TemplateType::Jumper => "jumper",
            TemplateType::Area => "area",
            TemplateType::StartArea => "startArea",
            TemplateType::FinishArea => "finishArea",
            TemplateType::Checkpoint => "checkpoint",
            TemplateType::DeadZone => "deadZone",
            TemplateType::Bumper => "bumper",
            TemplateType::Blower => "blower",
            TemplateType::Launcher => "launcher",
        }
    }

    /// Every field the type declares, editable or not, common fields first
    pub fn declared_fields(self) -> Vec<FieldDecl> {
        let mut fields = vec![
            FieldDecl::fixed("_visual", ValueType::Handle),
            FieldDecl::editable("_pivotCorrection", ValueType::Vector3),
            FieldDecl::editable("_visualScale", ValueType::Vector3),
            FieldDecl::fixed("_physicsCenter", ValueType::Vector3),
            FieldDecl::fixed("_physicsSize", ValueType::Vector3),
        ];

        match self {
            TemplateType::StaticPlatform => {}
            TemplateType::MovingPlatform => MovingPlatformParams::declare_fields(&mut fields),
            TemplateType::Jumper => JumperParams::declare_fields(&mut fields),
            TemplateType::Area | TemplateType::DeadZone => AreaParams::declare_fields(&mut fields),
            TemplateType::StartArea => StartAreaParams::declare_fields(&mut fields),
            TemplateType::FinishArea => FinishAreaParams::declare_fields(&mut fields),
            TemplateType::Checkpoint => CheckpointParams::declare_fields(&mut fields),
            TemplateType::Bumper => BumperParams::declare_fields(&mut fields),
            TemplateType::Blower => BlowerParams::declare_fields(&mut fields),
            TemplateType::Launcher => LauncherParams::declare_fields(&mut fields),
        }

        fields
    }
}

impl std::fmt::Display for TemplateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// Subtype-specific template data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TemplateKind {
    StaticPlatform,
    MovingPlatform(MovingPlatformParams),
    Jumper(JumperParams),
    Area(AreaParams),
    StartArea(StartAreaParams),
    FinishArea(FinishAreaParams),
    Checkpoint(CheckpointParams),
    DeadZone(AreaParams),
    Bumper(BumperParams),
    Blower(BlowerParams),
    Launcher(LauncherParams),
}

impl TemplateKind {
    pub fn template_type(&self) -> TemplateType {
        match self {
            TemplateKind::StaticPlatform => TemplateType::StaticPlatform,
            TemplateKind::MovingPlatform(_) => TemplateType::MovingPlatform,
            TemplateKind::Jumper(_) => TemplateType::Jumper,
            TemplateKind::Area(_) => TemplateType::Area,
            TemplateKind::StartArea(_) => TemplateType::StartArea,
            TemplateKind::FinishArea(_) => TemplateType::FinishArea,
            TemplateKind::Checkpoint(_) => TemplateType::Checkpoint,
            TemplateKind::DeadZone(_) => TemplateType::DeadZone,
            TemplateKind::Bumper(_) => TemplateType::Bumper,
            TemplateKind::Blower(_) => TemplateType::Blower,
            TemplateKind::Launcher(_) => TemplateType::Launcher,
        }
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match self {
            TemplateKind::StaticPlatform => None,
            TemplateKind::MovingPlatform(p) => p.field_value(name),
            TemplateKind::Jumper(p) => p.field_value(name),
            TemplateKind::Area(p) | TemplateKind::DeadZone(p) => p.field_value(name),
            TemplateKind::StartArea(p) => p.field_value(name),
            TemplateKind::FinishArea(p) => p.field_value(name),
            TemplateKind::Checkpoint(p) => p.field_value(name),
            TemplateKind::Bumper(p) => p.field_value(name),
            TemplateKind::Blower(p) => p.field_value(name),
            TemplateKind::Launcher(p) => p.field_value(name),
        }
    }
}

/// Role an object plays in race validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceRole {
    Start,
    Finish,
    Checkpoint,
}

/// Shared definition of a placeable object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTemplate {
    /// Stable key that instances store instead of a template reference
    pub logic_key: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Visual asset (mesh/prefab) name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<String>,

    /// Offset applied to the visual so its pivot sits on the object origin
    #[serde(default)]
    pub pivot_correction: Vector3,

    #[serde(default = "unit_scale")]
    pub visual_scale: Vector3,

    /// Solid body center, local space
    #[serde(default)]
    pub physics_center: Vector3,

    /// Solid body size, local space
    #[serde(default = "unit_scale")]
    pub physics_size: Vector3,

    pub kind: TemplateKind,
}

impl ObjectTemplate {
    pub fn new(logic_key: &str, name: &str, kind: TemplateKind) -> Self {
        Self {
            logic_key: logic_key.to_string(),
            name: name.to_string(),
            visual: None,
            pivot_correction: Vector3::ZERO,
            visual_scale: Vector3::ONE,
            physics_center: Vector3::ZERO,
            physics_size: Vector3::ONE,
            kind,
        }
    }

    pub fn template_type(&self) -> TemplateType {
        self.kind.template_type()
    }

    /// Template default for a declared field, editable or not.
    ///
    /// Returns `None` for unknown fields and for unset handles.
    pub fn default_value(&self, name: &str) -> Option<Value> {
        match name {
            "_visual" => self.visual.clone().map(Value::Handle),
            "_pivotCorrection" => Some(self.pivot_correction.into()),
            "_visualScale" => Some(self.visual_scale.into()),
            "_physicsCenter" => Some(self.physics_center.into()),
            "_physicsSize" => Some(self.physics_size.into()),
            _ => self.kind.field_value(name),
        }
    }

    /// Asset names this template refers to
    pub fn asset_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.visual.iter().map(String::as_str).collect();
        match &self.kind {
            TemplateKind::Blower(p) => names.extend(p.particle.as_deref()),
            TemplateKind::Launcher(p) => names.extend(p.bullet.as_deref()),
            _ => {}
        }
        names
    }

    /// Race role by subtype, falling back to the well-known logic keys
    pub fn race_role(&self) -> Option<RaceRole> {
        match self.kind {
            TemplateKind::StartArea(_) => return Some(RaceRole::Start),
            TemplateKind::FinishArea(_) => return Some(RaceRole::Finish),
            TemplateKind::Checkpoint(_) => return Some(RaceRole::Checkpoint),
            _ => {}
        }

        match self.logic_key.as_str() {
            START_AREA_KEY => Some(RaceRole::Start),
            FINISH_AREA_KEY => Some(RaceRole::Finish),
            CHECKPOINT_KEY => Some(RaceRole::Checkpoint),
            _ => None,
        }
    }
}
