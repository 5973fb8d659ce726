//! Session files.

use crate::objects::{
    DiffuseDesc, FaceDesc, MaskDesc, ObjectDesc, ReceiverDesc, SourceDesc,
};
use crate::SceneError;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tascar_core::SPEED_OF_SOUND;
use tracing::debug;

/// Session metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    /// Session name.
    pub name: String,
    /// Session duration in seconds.
    pub duration: f64,
    /// Loop the session.
    #[serde(rename = "loop")]
    pub looped: bool,
    /// License of the scene content.
    pub license: String,
    /// Attribution of the scene content.
    pub attribution: String,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            duration: 60.0,
            looped: false,
            license: String::new(),
            attribution: String::new(),
        }
    }
}

/// One acoustic scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDesc {
    /// Scene name.
    pub name: String,
    /// Speed of sound in m/s.
    pub c: f64,
    /// Highest image source order generated.
    pub ismorder: u32,
    /// Render this scene.
    pub active: bool,
    /// Sound sources.
    pub source: Vec<SourceDesc>,
    /// Receivers.
    pub receiver: Vec<ReceiverDesc>,
    /// Reflecting faces.
    pub face: Vec<FaceDesc>,
    /// Diffuse sound fields.
    pub diffuse: Vec<DiffuseDesc>,
    /// Masks.
    pub mask: Vec<MaskDesc>,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            c: SPEED_OF_SOUND,
            ismorder: 1,
            active: true,
            source: Vec::new(),
            receiver: Vec::new(),
            face: Vec::new(),
            diffuse: Vec::new(),
            mask: Vec::new(),
        }
    }
}

impl SceneDesc {
    /// Every named object of the scene.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectDesc> {
        self.source
            .iter()
            .map(|o| &o.object)
            .chain(self.receiver.iter().map(|o| &o.object))
            .chain(self.face.iter().map(|o| &o.object))
            .chain(self.diffuse.iter().map(|o| &o.object))
            .chain(self.mask.iter().map(|o| &o.object))
    }

    /// Input port names: one per sound, then four per diffuse field.
    pub fn input_ports(&self) -> Vec<String> {
        let mut ports = Vec::new();
        for src in &self.source {
            for snd in src.sounds() {
                if snd.name.is_empty() {
                    ports.push(src.object.name.clone());
                } else {
                    ports.push(format!("{}.{}", src.object.name, snd.name));
                }
            }
        }
        for d in &self.diffuse {
            ports.extend(d.port_names());
        }
        ports
    }

    /// Output port names of every receiver, in document order.
    pub fn output_ports(&self) -> Vec<String> {
        self.receiver.iter().flat_map(|r| r.port_names()).collect()
    }

    /// Check names, receivers, faces and trajectories.
    pub fn validate(&self, base_dir: &Path) -> Result<(), SceneError> {
        let mut seen = HashSet::new();
        for obj in self.objects() {
            if !seen.insert(obj.name.as_str()) {
                return Err(SceneError::Invalid(format!(
                    "duplicate object name '{}' in scene '{}'",
                    obj.name, self.name
                )));
            }
            obj.build_dynobject(base_dir)?;
        }
        for src in &self.source {
            let mut sounds = HashSet::new();
            for snd in &src.sound {
                if !sounds.insert(snd.name.as_str()) {
                    return Err(SceneError::Invalid(format!(
                        "duplicate sound name '{}' in source '{}'",
                        snd.name, src.object.name
                    )));
                }
            }
        }
        for rec in &self.receiver {
            let needed = rec.kind.min_speakers();
            if rec.kind.is_speaker_based() && rec.speaker.len() < needed {
                return Err(SceneError::Invalid(format!(
                    "receiver '{}' of type {} needs at least {} speakers, got {}",
                    rec.object.name,
                    rec.kind.name(),
                    needed,
                    rec.speaker.len()
                )));
            }
        }
        for face in &self.face {
            face.polygon()?;
        }
        if !(self.c > 0.0) {
            return Err(SceneError::Invalid(format!(
                "scene '{}' has non-positive speed of sound {}",
                self.name, self.c
            )));
        }
        Ok(())
    }
}

/// A complete session file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Session metadata.
    pub session: SessionInfo,
    /// Scenes.
    pub scene: Vec<SceneDesc>,
    /// Directory that relative paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Session {
    /// Parse a session from a TOML string; relative paths resolve against the working directory.
    pub fn parse_str(input: &str) -> Result<Self, SceneError> {
        Self::parse_str_in(input, Path::new("."))
    }

    /// Parse a session; relative paths resolve against `base_dir`.
    pub fn parse_str_in(input: &str, base_dir: &Path) -> Result<Self, SceneError> {
        let mut session: Session = toml::from_str(input)?;
        session.base_dir = base_dir.to_path_buf();
        for scene in &mut session.scene {
            for rec in &mut scene.receiver {
                rec.resolve_layout(base_dir)?;
            }
        }
        session.validate()?;
        debug!(
            scenes = session.scene.len(),
            base_dir = %base_dir.display(),
            "Loaded session"
        );
        Ok(session)
    }

    /// Load a session file from disk.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        let base_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::parse_str_in(&data, &base_dir)
    }

    /// Validate every scene.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.scene.is_empty() {
            return Err(SceneError::Invalid("session has no scene".into()));
        }
        for scene in &self.scene {
            scene.validate(&self.base_dir)?;
        }
        Ok(())
    }

    /// Scene by name, or the first scene if `name` is empty.
    pub fn scene(&self, name: &str) -> Option<&SceneDesc> {
        if name.is_empty() {
            self.scene.first()
        } else {
            self.scene.iter().find(|s| s.name == name)
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ReceiverKind;

    const BASIC: &str = r#"
        [session]
        name = "basic"
        duration = 2

        [[scene]]
        name = "room"

        [[scene.source]]
        name = "src"
        position = [[0, 2, 0, 0]]
        [[scene.source.sound]]
        name = "0"

        [[scene.diffuse]]
        name = "amb"

        [[scene.receiver]]
        name = "out"
        type = "omni"
    "#;

    #[test]
    fn parses_basic_session() {
        let session = Session::parse_str(BASIC).expect("valid session");
        assert_eq!(session.session.duration, 2.0);
        let scene = session.scene("").expect("first scene");
        assert_eq!(scene.c, 340.0);
        assert_eq!(
            scene.input_ports(),
            vec!["src.0", "amb.0w", "amb.1x", "amb.1y", "amb.1z"]
        );
        assert_eq!(scene.output_ports(), vec!["out.0"]);
        assert!(session.scene("room").is_some());
        assert!(session.scene("hall").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let toml = format!("{BASIC}\n[[scene.face]]\nname = \"src\"\n");
        let err = Session::parse_str(&toml).unwrap_err();
        assert!(matches!(err, SceneError::Invalid(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn rejects_unknown_receiver_type() {
        let toml = BASIC.replace("type = \"omni\"", "type = \"wfs\"");
        assert!(matches!(
            Session::parse_str(&toml),
            Err(SceneError::Parse(_))
        ));
    }

    #[test]
    fn rejects_speaker_receiver_without_layout() {
        let toml = BASIC.replace("type = \"omni\"", "type = \"vbap\"");
        let err = Session::parse_str(&toml).unwrap_err();
        assert!(matches!(err, SceneError::Invalid(msg) if msg.contains("speakers")));
    }

    #[test]
    fn rejects_bad_trajectory() {
        let toml = BASIC.replace("[[0, 2, 0, 0]]", "[[1, 2, 0, 0], [0, 1, 0, 0]]");
        let err = Session::parse_str(&toml).unwrap_err();
        assert!(matches!(err, SceneError::Geometry { .. }));
    }

    #[test]
    fn resolves_layout_relative_to_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("ring.toml"),
            "[[speaker]]\naz = 0\n[[speaker]]\naz = 120\n[[speaker]]\naz = -120\n",
        )
        .expect("write layout");
        let toml = BASIC.replace(
            "type = \"omni\"",
            "type = \"hoa2d\"\nlayout = \"ring.toml\"",
        );
        let path = dir.path().join("s.toml");
        fs::write(&path, toml).expect("write session");
        let session = Session::load_file(&path).expect("valid session");
        let rec = &session.scene[0].receiver[0];
        assert_eq!(rec.kind, ReceiverKind::Hoa2d);
        assert_eq!(rec.channels(), 3);
    }

    #[test]
    fn serializes_and_reparses() {
        let session = Session::parse_str(BASIC).expect("valid session");
        let text = session.to_toml().expect("serialize");
        let again = Session::parse_str(&text).expect("reparse");
        assert_eq!(again.scene[0].source[0].object.name, "src");
    }
}
