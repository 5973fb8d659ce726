//! Scene objects: sources, sounds, receivers, faces, diffuse fields and masks.

use crate::layout::{SpeakerDesc, SpeakerLayout};
use crate::SceneError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tascar_core::{
    DVec3, DynObject, Euler, EulerTrack, Interpolation, Polygon, PosExt, PositionTrack, DEG2RAD,
};

/// Layer mask with every layer set.
pub const ALL_LAYERS: u32 = u32::MAX;

/// Properties shared by every object that moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDesc {
    /// Object name, unique within its scene.
    pub name: String,
    /// Location key frames `[t, x, y, z]`.
    pub position: Vec<Vec<f64>>,
    /// Orientation key frames `[t, rz, ry, rx]` in degrees.
    pub orientation: Vec<Vec<f64>>,
    /// Session time of object time zero and start of activity.
    pub start: f64,
    /// End of activity; ignored when not after `start`.
    pub end: f64,
    /// Location offset.
    pub dlocation: [f64; 3],
    /// Orientation offset `[rz, ry, rx]` in degrees.
    pub dorientation: [f64; 3],
    /// Silence this object.
    pub mute: bool,
    /// Render only solo objects when any object is solo.
    pub solo: bool,
    /// Location interpolation mode.
    pub interpolation: Interpolation,
    /// Loop period of the trajectories in seconds (0 disables looping).
    #[serde(rename = "loop")]
    pub loop_period: f64,
    /// Orientation follows travel direction over this distance (0 disables).
    pub sampledorientation: f64,
    /// Re-time the location track to this constant speed (0 keeps timing).
    pub velocity: f64,
    /// Location trajectory as a `t,x,y,z` file, relative to the session file.
    pub csvfile: Option<PathBuf>,
}

impl ObjectDesc {
    /// Object with a name and a fixed position.
    pub fn at(name: &str, p: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            position: vec![vec![0.0, p[0], p[1], p[2]]],
            ..Self::default()
        }
    }

    /// Build the trajectories; relative CSV paths resolve against `base_dir`.
    pub fn build_dynobject(&self, base_dir: &Path) -> Result<DynObject, SceneError> {
        let geo = |e| SceneError::geometry(&self.name, e);
        let mut location = match &self.csvfile {
            Some(file) => {
                let path = base_dir.join(file);
                let text = fs::read_to_string(&path).map_err(|e| SceneError::io(&path, e))?;
                PositionTrack::from_csv(&text).map_err(geo)?
            }
            None if self.position.is_empty() => PositionTrack::constant(DVec3::ZERO),
            None => PositionTrack::from_rows(&self.position).map_err(geo)?,
        };
        location.set_interpolation(self.interpolation);
        if self.velocity > 0.0 {
            location.set_velocity_const(self.velocity);
        }
        location.loop_period = self.loop_period;
        let mut orientation = EulerTrack::from_rows_deg(&self.orientation).map_err(geo)?;
        orientation.loop_period = self.loop_period;
        let [dz, dy, dx] = self.dorientation;
        Ok(DynObject::new(
            location,
            orientation,
            self.start,
            DVec3::from_array(self.dlocation),
            Euler::from_degrees(dz, dy, dx),
            self.sampledorientation,
        ))
    }
}

/// Source directivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directivity {
    /// Equal gain in every direction.
    #[default]
    Omni,
    /// First-order cardioid facing the source x-axis.
    Cardioid,
}

/// Distance law of a sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GainModel {
    /// Gain falls with `1/r` (clamped at 0.1 m).
    #[default]
    #[serde(rename = "1/r")]
    InverseDistance,
    /// No distance attenuation.
    #[serde(rename = "1")]
    Unity,
}

/// A sound emitter attached to a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundDesc {
    /// Sound name, unique within its source.
    pub name: String,
    /// Local x position.
    pub x: f64,
    /// Local y position.
    pub y: f64,
    /// Local z position.
    pub z: f64,
    /// Local azimuth in degrees (used with `r`).
    pub az: f64,
    /// Local elevation in degrees (used with `r`).
    pub el: f64,
    /// Local radius; when set, overrides the cartesian position.
    pub r: Option<f64>,
    /// Local orientation, z angle in degrees.
    pub rz: f64,
    /// Local orientation, y angle in degrees.
    pub ry: f64,
    /// Local orientation, x angle in degrees.
    pub rx: f64,
    /// Input gain in dB.
    pub gain: f64,
    /// Directivity pattern.
    #[serde(rename = "type")]
    pub directivity: Directivity,
    /// Distance law.
    pub gainmodel: GainModel,
    /// Apply air absorption.
    pub airabsorption: bool,
    /// Apply propagation delay.
    pub delayline: bool,
    /// Maximum distance in metres; longer paths are not rendered.
    pub maxdist: f64,
    /// Level threshold in dB SPL below which fragments are dropped (0 disables).
    pub minlevel: f64,
    /// Sinc interpolation order of the delay line.
    pub sincorder: usize,
    /// Physical size in metres, used for the source width.
    pub size: f64,
    /// Render layer mask.
    pub layers: u32,
    /// Lowest image source order rendered.
    pub ismmin: u32,
    /// Highest image source order rendered.
    pub ismmax: u32,
}

impl Default for SoundDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            az: 0.0,
            el: 0.0,
            r: None,
            rz: 0.0,
            ry: 0.0,
            rx: 0.0,
            gain: 0.0,
            directivity: Directivity::Omni,
            gainmodel: GainModel::InverseDistance,
            airabsorption: true,
            delayline: true,
            maxdist: 3700.0,
            minlevel: 0.0,
            sincorder: 0,
            size: 0.0,
            layers: ALL_LAYERS,
            ismmin: 0,
            ismmax: u32::MAX,
        }
    }
}

impl SoundDesc {
    /// Position relative to the parent source.
    pub fn local_position(&self) -> DVec3 {
        match self.r {
            Some(r) => DVec3::from_sphere(r, self.az * DEG2RAD, self.el * DEG2RAD),
            None => DVec3::new(self.x, self.y, self.z),
        }
    }

    /// Orientation relative to the parent source.
    pub fn local_orientation(&self) -> Euler {
        Euler::from_degrees(self.rz, self.ry, self.rx)
    }
}

/// A sound source with one or more sounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDesc {
    /// Trajectories and activity.
    #[serde(flatten)]
    pub object: ObjectDesc,
    /// Sounds; a source without sounds gets a single unnamed one.
    pub sound: Vec<SoundDesc>,
}

impl SourceDesc {
    /// Sounds, with the implicit default sound for sound-less sources.
    pub fn sounds(&self) -> Vec<SoundDesc> {
        if self.sound.is_empty() {
            vec![SoundDesc::default()]
        } else {
            self.sound.clone()
        }
    }
}

/// Receiver (panning) type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverKind {
    /// Single omnidirectional channel.
    #[default]
    Omni,
    /// Single cardioid channel facing the receiver x-axis.
    Cardioid,
    /// Nearest speaker panning.
    Nsp,
    /// Two-dimensional vector base amplitude panning.
    Vbap,
    /// Amplitude panning on the first two speakers.
    Stereo,
    /// Horizontal first-order Ambisonics (W, X, Y).
    Amb1h0v,
    /// Full first-order Ambisonics (W, X, Y, Z).
    Amb1h1v,
    /// Two-dimensional higher-order Ambisonics decoded to speakers.
    Hoa2d,
}

impl ReceiverKind {
    /// Type name as written in session files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Omni => "omni",
            Self::Cardioid => "cardioid",
            Self::Nsp => "nsp",
            Self::Vbap => "vbap",
            Self::Stereo => "stereo",
            Self::Amb1h0v => "amb1h0v",
            Self::Amb1h1v => "amb1h1v",
            Self::Hoa2d => "hoa2d",
        }
    }

    /// True for types that render to a loudspeaker layout.
    pub fn is_speaker_based(&self) -> bool {
        matches!(self, Self::Nsp | Self::Vbap | Self::Stereo | Self::Hoa2d)
    }

    /// Minimum number of speakers the type needs.
    pub fn min_speakers(&self) -> usize {
        match self {
            Self::Nsp => 1,
            Self::Vbap | Self::Stereo => 2,
            Self::Hoa2d => 3,
            _ => 0,
        }
    }

    /// Output channels for a layout of `speakers` speakers.
    pub fn channels(&self, speakers: usize) -> usize {
        match self {
            Self::Omni | Self::Cardioid => 1,
            Self::Amb1h0v => 3,
            Self::Amb1h1v => 4,
            Self::Nsp | Self::Vbap | Self::Stereo | Self::Hoa2d => speakers,
        }
    }

    /// Channel names for the Ambisonics types.
    pub fn channel_labels(&self) -> &'static [&'static str] {
        match self {
            Self::Amb1h0v => &["0w", "1x", "1y"],
            Self::Amb1h1v => &["0w", "1x", "1y", "1z"],
            _ => &[],
        }
    }
}

/// A receiver (listener or microphone array).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverDesc {
    /// Trajectories and activity.
    #[serde(flatten)]
    pub object: ObjectDesc,
    /// Panning type.
    #[serde(rename = "type")]
    pub kind: ReceiverKind,
    /// Output gain in dB.
    pub gain: f64,
    /// Size of a volumetric receiver; zero for point receivers.
    pub volumetric: [f64; 3],
    /// Average distance inside a volumetric receiver; derived from the volume if not positive.
    pub avgdist: f64,
    /// Fade-out length at the boundary of a volumetric receiver; negative uses `1/r` law.
    pub falloff: f64,
    /// Delay compensation in seconds.
    pub delaycomp: f64,
    /// Render point sources.
    pub point: bool,
    /// Render diffuse sound fields.
    pub diffuse: bool,
    /// Render image sources.
    pub image: bool,
    /// Lowest image source order rendered.
    pub ismmin: u32,
    /// Highest image source order rendered.
    pub ismmax: u32,
    /// Render layer mask.
    pub layers: u32,
    /// Mute while the transport is stopped.
    pub muteonstop: bool,
    /// Duration of layer fades in seconds.
    pub layerfadelen: f64,
    /// Gain of diffuse fields in dB.
    pub diffusegain: f64,
    /// Ambisonics order of `hoa2d` (0 uses the highest order the layout supports).
    pub order: u32,
    /// Apply max-rE weights (`hoa2d`).
    pub maxre: bool,
    /// Decoder rotation in degrees (`hoa2d`); defaults to the negative mean layout rotation.
    pub rotation: Option<f64>,
    /// Drive every speaker (`nsp`).
    pub useall: bool,
    /// Layout file, relative to the session file.
    pub layout: Option<PathBuf>,
    /// Gain of the first-order components of the diffuse decoder.
    pub xyzgain: f64,
    /// Apply speaker density weights to diffuse rendering.
    pub densitycorr: bool,
    /// Inline speakers; replaced by the layout file when one is given.
    pub speaker: Vec<SpeakerDesc>,
}

impl Default for ReceiverDesc {
    fn default() -> Self {
        Self {
            object: ObjectDesc::default(),
            kind: ReceiverKind::Omni,
            gain: 0.0,
            volumetric: [0.0; 3],
            avgdist: 0.0,
            falloff: -1.0,
            delaycomp: 0.0,
            point: true,
            diffuse: true,
            image: true,
            ismmin: 0,
            ismmax: u32::MAX,
            layers: ALL_LAYERS,
            muteonstop: false,
            layerfadelen: 1.0,
            diffusegain: 0.0,
            order: 0,
            maxre: false,
            rotation: None,
            useall: false,
            layout: None,
            xyzgain: 1.0,
            densitycorr: true,
            speaker: Vec::new(),
        }
    }
}

impl ReceiverDesc {
    /// Replace inline speakers by the referenced layout file, if any.
    pub fn resolve_layout(&mut self, base_dir: &Path) -> Result<(), SceneError> {
        if let Some(file) = &self.layout {
            let layout = SpeakerLayout::load_file(base_dir.join(file))?;
            self.speaker = layout.speaker;
            self.xyzgain = layout.xyzgain;
            self.densitycorr = layout.densitycorr;
        }
        Ok(())
    }

    /// Speaker layout as used by the renderer.
    pub fn speaker_layout(&self) -> SpeakerLayout {
        SpeakerLayout {
            name: self.object.name.clone(),
            xyzgain: self.xyzgain,
            densitycorr: self.densitycorr,
            speaker: self.speaker.clone(),
        }
    }

    /// Number of output channels.
    pub fn channels(&self) -> usize {
        self.kind.channels(self.speaker.len())
    }

    /// Output port names, `<receiver>.<channel>`.
    pub fn port_names(&self) -> Vec<String> {
        let labels = self.kind.channel_labels();
        (0..self.channels())
            .map(|k| {
                let label = match labels.get(k) {
                    Some(l) => l.to_string(),
                    None => match self.speaker.get(k) {
                        Some(spk) if !spk.label.is_empty() => spk.label.clone(),
                        _ => k.to_string(),
                    },
                };
                format!("{}.{}", self.object.name, label)
            })
            .collect()
    }
}

/// A reflecting polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDesc {
    /// Trajectories and activity.
    #[serde(flatten)]
    pub object: ObjectDesc,
    /// Width of a rectangular face (along local y).
    pub width: f64,
    /// Height of a rectangular face (along local z).
    pub height: f64,
    /// Local vertices; overrides width and height when given.
    pub vertices: Vec<[f64; 3]>,
    /// Reflection coefficient.
    pub reflectivity: f64,
    /// Damping coefficient of the reflection low-pass.
    pub damping: f64,
    /// Move image sources onto the edge when the reflection point is outside the face.
    pub edgereflection: bool,
    /// Relative amount of scattering.
    pub scattering: f64,
}

impl Default for FaceDesc {
    fn default() -> Self {
        Self {
            object: ObjectDesc::default(),
            width: 1.0,
            height: 2.0,
            vertices: Vec::new(),
            reflectivity: 1.0,
            damping: 0.0,
            edgereflection: true,
            scattering: 0.0,
        }
    }
}

impl FaceDesc {
    /// Local polygon of the face.
    pub fn polygon(&self) -> Result<Polygon, SceneError> {
        if self.vertices.is_empty() {
            Ok(Polygon::rectangle(self.width, self.height))
        } else {
            Polygon::from_vertices(self.vertices.iter().map(|v| DVec3::from_array(*v)).collect())
                .map_err(|e| SceneError::geometry(&self.object.name, e))
        }
    }
}

/// A first-order Ambisonics diffuse sound field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffuseDesc {
    /// Trajectories and activity.
    #[serde(flatten)]
    pub object: ObjectDesc,
    /// Size of the field box.
    pub size: [f64; 3],
    /// Fade-out length at the box boundary in metres.
    pub falloff: f64,
    /// Render layer mask.
    pub layers: u32,
    /// Input gain in dB.
    pub gain: f64,
}

impl Default for DiffuseDesc {
    fn default() -> Self {
        Self {
            object: ObjectDesc::default(),
            size: [1.0; 3],
            falloff: 1.0,
            layers: ALL_LAYERS,
            gain: 0.0,
        }
    }
}

impl DiffuseDesc {
    /// Input port names in W, X, Y, Z order.
    pub fn port_names(&self) -> Vec<String> {
        ["0w", "1x", "1y", "1z"]
            .iter()
            .map(|c| format!("{}.{}", self.object.name, c))
            .collect()
    }
}

/// A box that attenuates receivers inside or outside of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskDesc {
    /// Trajectories and activity.
    #[serde(flatten)]
    pub object: ObjectDesc,
    /// Size of the mask box.
    pub size: [f64; 3],
    /// Fade length at the box boundary in metres.
    pub falloff: f64,
    /// Attenuate inside instead of outside the box.
    pub inside: bool,
}

impl Default for MaskDesc {
    fn default() -> Self {
        Self {
            object: ObjectDesc::default(),
            size: [1.0; 3],
            falloff: 1.0,
            inside: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_defaults() {
        let snd: SoundDesc = toml::from_str("name = \"s\"").expect("valid sound");
        assert_eq!(snd.maxdist, 3700.0);
        assert_eq!(snd.gainmodel, GainModel::InverseDistance);
        assert!(snd.airabsorption && snd.delayline);
        assert_eq!(snd.layers, ALL_LAYERS);
    }

    #[test]
    fn spherical_sound_position() {
        let snd: SoundDesc = toml::from_str("r = 2\naz = 90").expect("valid sound");
        assert!((snd.local_position() - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn gain_model_names() {
        let snd: SoundDesc = toml::from_str("gainmodel = \"1\"").expect("valid sound");
        assert_eq!(snd.gainmodel, GainModel::Unity);
        assert!(toml::from_str::<SoundDesc>("gainmodel = \"1/r2\"").is_err());
    }

    #[test]
    fn receiver_ports_use_labels() {
        let mut rec = ReceiverDesc {
            object: ObjectDesc::at("out", [0.0; 3]),
            kind: ReceiverKind::Nsp,
            ..ReceiverDesc::default()
        };
        rec.speaker = vec![
            SpeakerDesc {
                label: "L".into(),
                ..SpeakerDesc::at_azimuth(30.0)
            },
            SpeakerDesc::at_azimuth(-30.0),
        ];
        assert_eq!(rec.port_names(), vec!["out.L", "out.1"]);
        rec.kind = ReceiverKind::Amb1h0v;
        assert_eq!(rec.port_names(), vec!["out.0w", "out.1x", "out.1y"]);
    }

    #[test]
    fn face_polygon_from_vertices() {
        let face = FaceDesc {
            vertices: vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            ..FaceDesc::default()
        };
        assert!(matches!(face.polygon(), Err(SceneError::Geometry { .. })));
        assert!((FaceDesc::default().polygon().expect("rectangle").area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn dynobject_uses_trajectory() {
        let obj = ObjectDesc {
            name: "moving".into(),
            position: vec![vec![0.0, 0.0, 0.0, 0.0], vec![2.0, 4.0, 0.0, 0.0]],
            dorientation: [90.0, 0.0, 0.0],
            ..ObjectDesc::default()
        };
        let mut dynobj = obj.build_dynobject(Path::new(".")).expect("valid object");
        let pose = dynobj.geometry_update(1.0);
        assert!((pose.position.x - 2.0).abs() < 1e-12);
        assert!((pose.orientation.z - 90.0 * DEG2RAD).abs() < 1e-12);
    }

    #[test]
    fn dynobject_applies_start_and_offsets() {
        let obj = ObjectDesc {
            name: "late".into(),
            position: vec![vec![0.0, 0.0, 0.0, 0.0], vec![1.0, 1.0, 0.0, 0.0]],
            start: 2.0,
            dlocation: [0.0, 0.0, 1.5],
            ..ObjectDesc::default()
        };
        let mut dynobj = obj.build_dynobject(Path::new(".")).expect("valid object");
        assert_eq!(dynobj.pose().position, DVec3::new(0.0, 0.0, 1.5));
        let pose = dynobj.geometry_update(2.5);
        assert!((pose.position - DVec3::new(0.5, 0.0, 1.5)).length() < 1e-12);
    }
}
