//! Runtime scene objects.
//!
//! These are built from the scene description once per render and hold
//! everything that changes while rendering: poses, activity, audio
//! buffers and receiver gain state.

use crate::receivermod::{self, PanState, ReceiverModule};
use crate::RenderError;
use std::f64::consts::PI;
use std::fmt;
use std::path::Path;
use tascar_audio::{Amb1Wave, LevelMeter, Wave};
use tascar_core::{
    db2lin, make_friendly_number, ChunkConfig, DVec3, DynObject, Euler, Polygon, Pose, PosExt,
    Shoebox,
};
use tascar_scene::{
    DiffuseDesc, Directivity, FaceDesc, GainModel, MaskDesc, ObjectDesc, ReceiverDesc, SoundDesc,
    SourceDesc,
};
use tracing::debug;

/// Time constant of the input level meters in seconds.
const LEVEL_TC: f64 = 1.0;

/// Trajectory, activity and mute/solo state shared by every object.
#[derive(Debug, Clone)]
pub struct ObjectState {
    /// Object name.
    pub name: String,
    /// Trajectories.
    pub dynobject: DynObject,
    /// Muted objects are inactive.
    pub mute: bool,
    /// Solo flag.
    pub solo: bool,
    start: f64,
    end: f64,
    active: bool,
}

impl ObjectState {
    /// Build trajectories; relative CSV files resolve against `base_dir`.
    pub fn new(desc: &ObjectDesc, base_dir: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            name: desc.name.clone(),
            dynobject: desc.build_dynobject(base_dir)?,
            mute: desc.mute,
            solo: desc.solo,
            start: desc.start,
            end: desc.end,
            active: !desc.mute,
        })
    }

    /// Evaluate the trajectories at session time `t`.
    pub fn geometry_update(&mut self, t: f64) -> Pose {
        self.dynobject.geometry_update(t)
    }

    /// Update activity at session time `t`; `anysolo` is true if any object of the scene is solo.
    pub fn update_activity(&mut self, t: f64, anysolo: bool) {
        self.active = !self.mute
            && (!anysolo || self.solo)
            && self.start <= t
            && (self.end <= self.start || t <= self.end);
    }

    /// Activity computed by the last [`update_activity`](Self::update_activity).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last evaluated pose.
    pub fn pose(&self) -> Pose {
        self.dynobject.pose()
    }
}

/// A sound: one input channel placed relative to its source.
#[derive(Debug, Clone)]
pub struct Sound {
    /// Sound name.
    pub name: String,
    /// Input port name.
    pub port: String,
    /// Position in source coordinates.
    pub local_position: DVec3,
    /// Orientation relative to the source.
    pub local_orientation: Euler,
    /// Linear input gain.
    pub gain: f32,
    /// Directivity pattern.
    pub directivity: Directivity,
    /// Distance law.
    pub gainmodel: GainModel,
    /// Apply air absorption.
    pub airabsorption: bool,
    /// Apply propagation delay.
    pub delayline: bool,
    /// Longest rendered path in metres.
    pub maxdist: f64,
    /// Linear RMS threshold below which fragments are dropped (0 disables).
    pub minlevel: f32,
    /// Sinc interpolation order.
    pub sincorder: usize,
    /// Physical size in metres.
    pub size: f64,
    /// Layer mask.
    pub layers: u32,
    /// Lowest rendered image order.
    pub ismmin: u32,
    /// Highest rendered image order.
    pub ismmax: u32,
    /// Global position.
    pub position: DVec3,
    /// Global orientation.
    pub orientation: Euler,
    /// True while the parent source is active.
    pub active: bool,
    /// Current input fragment, gain applied.
    pub input: Wave,
    level: LevelMeter,
}

impl Sound {
    /// Runtime sound of source `source`.
    pub fn new(desc: &SoundDesc, source: &str, cfg: &ChunkConfig) -> Self {
        let port = if desc.name.is_empty() {
            source.to_string()
        } else {
            format!("{source}.{}", desc.name)
        };
        let minlevel = if desc.minlevel > 0.0 {
            (2e-5 * db2lin(desc.minlevel)) as f32
        } else {
            0.0
        };
        Self {
            name: desc.name.clone(),
            port,
            local_position: desc.local_position(),
            local_orientation: desc.local_orientation(),
            gain: db2lin(desc.gain) as f32,
            directivity: desc.directivity,
            gainmodel: desc.gainmodel,
            airabsorption: desc.airabsorption,
            delayline: desc.delayline,
            maxdist: desc.maxdist,
            minlevel,
            sincorder: desc.sincorder,
            size: desc.size,
            layers: desc.layers,
            ismmin: desc.ismmin,
            ismmax: desc.ismmax,
            position: DVec3::ZERO,
            orientation: Euler::ZERO,
            active: true,
            input: Wave::new(cfg.fragment_size),
            level: LevelMeter::new(cfg.sample_rate, LEVEL_TC),
        }
    }

    /// Place the sound relative to its source pose.
    pub fn update_pose(&mut self, parent: Pose) {
        self.position = parent.position + parent.orientation.rotate(self.local_position);
        self.orientation = parent.orientation + self.local_orientation;
    }

    /// Load one input fragment.
    pub fn set_input(&mut self, x: &[f32]) {
        self.input.copy_from(x);
        for v in self.input.iter_mut() {
            *v = make_friendly_number(*v * self.gain);
        }
        self.level.update(&self.input);
    }

    /// Input level in dB SPL.
    pub fn level(&self) -> f32 {
        self.level.spldb()
    }

    /// True if image order `order` is inside this sound's range.
    pub fn renders_order(&self, order: u32) -> bool {
        self.ismmin <= order && order <= self.ismmax
    }
}

/// A moving source carrying one or more sounds.
#[derive(Debug, Clone)]
pub struct Source {
    /// Trajectory and activity.
    pub object: ObjectState,
    /// Sounds in port order.
    pub sounds: Vec<Sound>,
}

impl Source {
    /// Runtime source.
    pub fn new(desc: &SourceDesc, cfg: &ChunkConfig, base_dir: &Path) -> Result<Self, RenderError> {
        let object = ObjectState::new(&desc.object, base_dir)?;
        let mut sounds: Vec<Sound> = desc
            .sounds()
            .iter()
            .map(|snd| Sound::new(snd, &desc.object.name, cfg))
            .collect();
        for snd in &mut sounds {
            snd.update_pose(object.pose());
        }
        Ok(Self { object, sounds })
    }

    /// Move the source and its sounds to session time `t`.
    pub fn geometry_update(&mut self, t: f64) {
        let pose = self.object.geometry_update(t);
        for snd in &mut self.sounds {
            snd.update_pose(pose);
        }
    }

    /// Update source and sound activity.
    pub fn update_activity(&mut self, t: f64, anysolo: bool) {
        self.object.update_activity(t, anysolo);
        let active = self.object.is_active();
        for snd in &mut self.sounds {
            snd.active = active;
        }
    }
}

/// Receiver-relative geometry of a sound path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefPoint {
    /// Source position in receiver coordinates.
    pub prel: DVec3,
    /// Path length in metres.
    pub distance: f64,
    /// Distance gain.
    pub gain: f64,
}

fn hann_falloff(d: f64, falloff: f64) -> f64 {
    let x = if falloff > 0.0 {
        (d / falloff).min(1.0)
    } else if d > 0.0 {
        1.0
    } else {
        0.0
    };
    0.5 + 0.5 * (PI * x).cos()
}

/// A receiver with its panning module, output channels and gain state.
pub struct Receiver {
    /// Trajectory and activity.
    pub object: ObjectState,
    /// Panning module.
    pub module: Box<dyn ReceiverModule>,
    /// Output channels of the current fragment.
    pub outputs: Vec<Wave>,
    /// Output port names.
    pub ports: Vec<String>,
    /// Linear output gain.
    pub gain: f32,
    /// Size of a volumetric receiver.
    pub volumetric: DVec3,
    /// Average distance inside the volume.
    pub avgdist: f64,
    /// Fade length at the volume boundary; not positive uses the distance law.
    pub falloff: f64,
    /// Delay compensation in seconds.
    pub delaycomp: f64,
    /// Render point sources.
    pub render_point: bool,
    /// Render diffuse fields.
    pub render_diffuse: bool,
    /// Render image sources.
    pub render_image: bool,
    /// Lowest rendered image order.
    pub ismmin: u32,
    /// Highest rendered image order.
    pub ismmax: u32,
    /// Layer mask.
    pub layers: u32,
    /// Mute while the transport is stopped.
    pub muteonstop: bool,
    /// Layer fade duration in seconds.
    pub layerfadelen: f64,
    /// Linear gain of diffuse fields.
    pub diffusegain: f32,
    /// Global position.
    pub position: DVec3,
    /// Global orientation.
    pub orientation: Euler,
    x_gain: f32,
    next_gain: f32,
    gain_zero: bool,
    scatter: Amb1Wave,
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("name", &self.object.name)
            .field("kind", &self.module.kind())
            .field("channels", &self.outputs.len())
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl Receiver {
    /// Runtime receiver for a block configuration.
    pub fn new(desc: &ReceiverDesc, cfg: &ChunkConfig, base_dir: &Path) -> Result<Self, RenderError> {
        let object = ObjectState::new(&desc.object, base_dir)?;
        let mut module = receivermod::create(desc)?;
        module.prepare(cfg);
        let channels = module.channels();
        let volumetric = DVec3::from_array(desc.volumetric);
        let avgdist = if desc.avgdist > 0.0 {
            desc.avgdist
        } else {
            0.5 * volumetric.box_volume().cbrt()
        };
        let pose = object.pose();
        debug!(
            receiver = %desc.object.name,
            kind = desc.kind.name(),
            channels,
            "Created receiver"
        );
        Ok(Self {
            object,
            module,
            outputs: vec![Wave::new(cfg.fragment_size); channels],
            ports: desc.port_names(),
            gain: db2lin(desc.gain) as f32,
            volumetric,
            avgdist,
            falloff: desc.falloff,
            delaycomp: desc.delaycomp,
            render_point: desc.point,
            render_diffuse: desc.diffuse,
            render_image: desc.image,
            ismmin: desc.ismmin,
            ismmax: desc.ismmax,
            layers: desc.layers,
            muteonstop: desc.muteonstop,
            layerfadelen: desc.layerfadelen,
            diffusegain: db2lin(desc.diffusegain) as f32,
            position: pose.position,
            orientation: pose.orientation,
            x_gain: 1.0,
            next_gain: 1.0,
            gain_zero: false,
            scatter: Amb1Wave::new(cfg.fragment_size),
        })
    }

    /// Move the receiver to session time `t`.
    pub fn geometry_update(&mut self, t: f64) {
        let pose = self.object.geometry_update(t);
        self.position = pose.position;
        self.orientation = pose.orientation;
    }

    /// True if the receiver is active.
    pub fn is_active(&self) -> bool {
        self.object.is_active()
    }

    /// True if image order `order` is inside the receiver's range.
    pub fn renders_order(&self, order: u32) -> bool {
        self.ismmin <= order && order <= self.ismmax
    }

    /// Geometry of a path whose physical source is `psrc_physical` and whose
    /// (possibly mirrored) apparent source is `psrc_virtual`.
    ///
    /// Image sources (`image`) are muted when the physical source is farther
    /// away than the image.
    pub fn update_refpoint(
        &self,
        psrc_physical: DVec3,
        psrc_virtual: DVec3,
        image: bool,
        gainmodel: GainModel,
    ) -> RefPoint {
        let (prel, distance, gain) = if self.volumetric.has_volume() {
            let prel = self.orientation.rotate_inverse(psrc_physical - self.position);
            let distance = prel.length();
            let d = Shoebox::new(DVec3::ZERO, self.volumetric, Euler::ZERO)
                .next_point(prel)
                .length();
            let gain = if self.falloff > 0.0 {
                hann_falloff(d, self.falloff) / self.avgdist.max(0.1)
            } else {
                match gainmodel {
                    GainModel::InverseDistance => 1.0 / (d + self.avgdist).max(1.0),
                    GainModel::Unity => 1.0 / self.avgdist.max(1.0),
                }
            };
            (prel, distance, gain)
        } else {
            let prel = self.orientation.rotate_inverse(psrc_virtual - self.position);
            let distance = prel.length();
            let mut gain = match gainmodel {
                GainModel::InverseDistance => 1.0 / distance.max(0.1),
                GainModel::Unity => 1.0,
            };
            if image && (psrc_physical - self.position).length() > distance {
                gain = 0.0;
            }
            (prel, distance, gain)
        };
        let gain = if gain.is_finite() { gain } else { 0.0 };
        RefPoint {
            prel,
            distance,
            gain,
        }
    }

    /// Set the mask gain reached at the end of the next fragment.
    pub fn set_next_gain(&mut self, g: f32) {
        self.next_gain = g;
        self.gain_zero = self.next_gain == 0.0 && self.x_gain == 0.0;
    }

    /// True if the receiver stays silent for the whole fragment.
    pub fn gain_zero(&self) -> bool {
        self.gain_zero
    }

    /// Silence outputs and the scattering buffer.
    pub fn clear_output(&mut self) {
        for ch in &mut self.outputs {
            ch.clear();
        }
        self.scatter.clear();
    }

    /// Pan a point source into the outputs; `scattering` feeds the diffuse scatter buffer.
    pub fn add_pointsource(
        &mut self,
        prel: DVec3,
        width: f64,
        scattering: f32,
        chunk: &[f32],
        state: &mut PanState,
    ) {
        if scattering > 0.0 {
            self.scatter.add_panned(prel, chunk, scattering);
        }
        self.module
            .add_pointsource(prel, width, chunk, &mut self.outputs, state);
    }

    /// Add a diffuse field already rotated into receiver coordinates.
    pub fn add_diffuse(&mut self, chunk: &Amb1Wave) {
        self.module.add_diffuse(chunk, &mut self.outputs);
    }

    /// Render scattering and run the module post-processing.
    pub fn postproc(&mut self) {
        self.module.add_diffuse(&self.scatter, &mut self.outputs);
        self.module.postproc(&mut self.outputs);
    }

    /// Apply the mask gain, interpolated across the fragment.
    pub fn apply_gain(&mut self) {
        let n = self.outputs.first().map_or(0, |ch| ch.len());
        if n > 0 && !(self.x_gain == 1.0 && self.next_gain == 1.0) {
            let dg = (self.next_gain - self.x_gain) / n as f32;
            let mut g = self.x_gain;
            for k in 0..n {
                g += dg;
                for ch in &mut self.outputs {
                    ch[k] *= g;
                }
            }
        }
        self.x_gain = self.next_gain;
    }
}

/// A reflecting face.
#[derive(Debug, Clone)]
pub struct Face {
    /// Trajectory and activity.
    pub object: ObjectState,
    /// Polygon in global coordinates.
    pub polygon: Polygon,
    /// Reflection coefficient.
    pub reflectivity: f64,
    /// Damping coefficient.
    pub damping: f64,
    /// Move image sources onto the edge for off-face reflections.
    pub edgereflection: bool,
    /// Relative amount of scattering.
    pub scattering: f32,
}

impl Face {
    /// Runtime face.
    pub fn new(desc: &FaceDesc, base_dir: &Path) -> Result<Self, RenderError> {
        let object = ObjectState::new(&desc.object, base_dir)?;
        let mut polygon = desc.polygon()?;
        let pose = object.pose();
        polygon.apply_rot_loc(pose.position, pose.orientation);
        Ok(Self {
            object,
            polygon,
            reflectivity: desc.reflectivity,
            damping: desc.damping,
            edgereflection: desc.edgereflection,
            scattering: desc.scattering as f32,
        })
    }

    /// Move the face to session time `t`.
    pub fn geometry_update(&mut self, t: f64) {
        let pose = self.object.geometry_update(t);
        self.polygon.apply_rot_loc(pose.position, pose.orientation);
    }

    /// One-pole reflection filter, `y = y·damping + x·reflectivity·(1−damping)`.
    pub fn apply_reflection_filter(&self, audio: &mut [f32], state: &mut f64) {
        let c1 = self.reflectivity * (1.0 - self.damping);
        for v in audio.iter_mut() {
            *state = *state * self.damping + f64::from(*v) * c1;
            *v = *state as f32;
        }
    }
}

/// A first-order Ambisonics diffuse sound field.
#[derive(Debug, Clone)]
pub struct DiffuseField {
    /// Trajectory and activity.
    pub object: ObjectState,
    /// Box size.
    pub size: DVec3,
    /// Fade length at the box boundary in metres.
    pub falloff: f64,
    /// Layer mask.
    pub layers: u32,
    /// Linear input gain.
    pub gain: f32,
    /// Current fragment in world orientation.
    pub audio: Amb1Wave,
    level: LevelMeter,
}

impl DiffuseField {
    /// Runtime diffuse field.
    pub fn new(desc: &DiffuseDesc, cfg: &ChunkConfig, base_dir: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            object: ObjectState::new(&desc.object, base_dir)?,
            size: DVec3::from_array(desc.size),
            falloff: desc.falloff,
            layers: desc.layers,
            gain: db2lin(desc.gain) as f32,
            audio: Amb1Wave::new(cfg.fragment_size),
            level: LevelMeter::new(cfg.sample_rate, LEVEL_TC),
        })
    }

    /// Load one fragment of W, X, Y, Z input given in field coordinates.
    pub fn set_input(&mut self, channels: [&[f32]; 4]) {
        for (dst, src) in self.audio.channels_mut().into_iter().zip(channels) {
            dst.copy_from(src);
            for v in dst.iter_mut() {
                *v = make_friendly_number(*v);
            }
        }
        self.level.update(&self.audio.w);
        self.audio.rotate(&self.object.pose().orientation);
        self.audio.scale(self.gain);
    }

    /// Level of the W channel in dB SPL.
    pub fn level(&self) -> f32 {
        self.level.spldb()
    }

    /// Field box at its current pose.
    pub fn shoebox(&self) -> Shoebox {
        let pose = self.object.pose();
        Shoebox::new(pose.position, self.size, pose.orientation)
    }
}

/// A box that attenuates receivers depending on their position.
#[derive(Debug, Clone)]
pub struct Mask {
    /// Trajectory and activity.
    pub object: ObjectState,
    /// Box size.
    pub size: DVec3,
    /// Fade length at the box boundary in metres.
    pub falloff: f64,
    /// Attenuate inside instead of outside.
    pub inside: bool,
}

impl Mask {
    /// Runtime mask.
    pub fn new(desc: &MaskDesc, base_dir: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            object: ObjectState::new(&desc.object, base_dir)?,
            size: DVec3::from_array(desc.size),
            falloff: desc.falloff,
            inside: desc.inside,
        })
    }

    /// Gain at position `p`.
    ///
    /// The fade is centred on the box surface: the box is shrunk by
    /// `falloff` before measuring, so the gain is 0.5 at the nominal
    /// boundary. Inside masks return the complement.
    pub fn gain(&self, p: DVec3) -> f32 {
        let pose = self.object.pose();
        let size = (self.size - DVec3::splat(self.falloff)).max(DVec3::ZERO);
        let d = Shoebox::new(pose.position, size, pose.orientation)
            .next_point(p)
            .length();
        let g = hann_falloff(d, self.falloff) as f32;
        if self.inside {
            1.0 - g
        } else {
            g
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tascar_scene::ReceiverKind;

    fn cfg() -> ChunkConfig {
        ChunkConfig::new(1000.0, 4, 1)
    }

    fn receiver(desc: ReceiverDesc) -> Receiver {
        Receiver::new(&desc, &cfg(), Path::new(".")).expect("valid receiver")
    }

    #[test]
    fn solo_and_time_window() {
        let mut obj = ObjectState::new(
            &ObjectDesc {
                start: 1.0,
                end: 2.0,
                ..ObjectDesc::at("o", [0.0; 3])
            },
            Path::new("."),
        )
        .expect("valid object");
        obj.update_activity(0.5, false);
        assert!(!obj.is_active());
        obj.update_activity(1.5, false);
        assert!(obj.is_active());
        obj.update_activity(1.5, true);
        assert!(!obj.is_active());
        obj.solo = true;
        obj.update_activity(1.5, true);
        assert!(obj.is_active());
        obj.update_activity(2.5, true);
        assert!(!obj.is_active());
    }

    #[test]
    fn sound_follows_source_pose() {
        let desc = SourceDesc {
            object: ObjectDesc {
                orientation: vec![vec![0.0, 90.0, 0.0, 0.0]],
                ..ObjectDesc::at("src", [1.0, 0.0, 0.0])
            },
            sound: vec![SoundDesc {
                name: "a".into(),
                x: 1.0,
                ..SoundDesc::default()
            }],
        };
        let src = Source::new(&desc, &cfg(), Path::new(".")).expect("valid source");
        assert_eq!(src.sounds[0].port, "src.a");
        assert!((src.sounds[0].position - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn point_receiver_distance_law() {
        let rec = receiver(ReceiverDesc {
            object: ObjectDesc::at("r", [0.0; 3]),
            ..ReceiverDesc::default()
        });
        let p = DVec3::new(0.0, 4.0, 0.0);
        let rp = rec.update_refpoint(p, p, false, GainModel::InverseDistance);
        assert!((rp.distance - 4.0).abs() < 1e-12);
        assert!((rp.gain - 0.25).abs() < 1e-12);
        let rp = rec.update_refpoint(p, DVec3::new(0.0, 0.01, 0.0), false, GainModel::InverseDistance);
        assert!((rp.gain - 10.0).abs() < 1e-9);
        let rp = rec.update_refpoint(p, DVec3::new(0.0, 2.0, 0.0), true, GainModel::Unity);
        assert_eq!(rp.gain, 0.0);
    }

    #[test]
    fn volumetric_receiver_uses_box_distance() {
        let rec = receiver(ReceiverDesc {
            object: ObjectDesc::at("r", [0.0; 3]),
            volumetric: [2.0, 2.0, 2.0],
            falloff: 1.0,
            ..ReceiverDesc::default()
        });
        assert!((rec.avgdist - 0.5 * 8f64.cbrt()).abs() < 1e-12);
        let inside = rec.update_refpoint(DVec3::X * 0.5, DVec3::X * 0.5, false, GainModel::InverseDistance);
        assert!((inside.gain - 1.0).abs() < 1e-12);
        let far = rec.update_refpoint(DVec3::X * 3.0, DVec3::X * 3.0, false, GainModel::InverseDistance);
        assert!(far.gain.abs() < 1e-12);
    }

    #[test]
    fn receiver_gain_ramps_per_fragment() {
        let mut rec = receiver(ReceiverDesc {
            object: ObjectDesc::at("r", [0.0; 3]),
            kind: ReceiverKind::Omni,
            ..ReceiverDesc::default()
        });
        rec.outputs[0].copy_from(&[1.0; 4]);
        rec.set_next_gain(0.0);
        assert!(!rec.gain_zero());
        rec.apply_gain();
        assert_eq!(&*rec.outputs[0], &[0.75, 0.5, 0.25, 0.0]);
        rec.set_next_gain(0.0);
        assert!(rec.gain_zero());
    }

    #[test]
    fn reflection_filter_scales_and_smooths() {
        let face = Face::new(
            &FaceDesc {
                object: ObjectDesc::at("f", [0.0; 3]),
                reflectivity: 0.5,
                damping: 0.5,
                ..FaceDesc::default()
            },
            Path::new("."),
        )
        .expect("valid face");
        let mut state = 0.0;
        let mut audio = [1.0, 0.0, 0.0];
        face.apply_reflection_filter(&mut audio, &mut state);
        assert_eq!(audio, [0.25, 0.125, 0.0625]);
    }

    #[test]
    fn mask_gain_fades_outside_box() {
        let mut mask = Mask::new(
            &MaskDesc {
                object: ObjectDesc::at("m", [0.0; 3]),
                size: [2.0, 2.0, 2.0],
                falloff: 2.0,
                inside: false,
            },
            Path::new("."),
        )
        .expect("valid mask");
        assert_eq!(mask.gain(DVec3::ZERO), 1.0);
        assert!((mask.gain(DVec3::new(1.0, 0.0, 0.0)) - 0.5).abs() < 1e-6);
        assert!(mask.gain(DVec3::new(2.0, 0.0, 0.0)).abs() < 1e-6);
        assert!(mask.gain(DVec3::new(5.0, 0.0, 0.0)).abs() < 1e-6);
        mask.size = DVec3::splat(6.0);
        assert_eq!(mask.gain(DVec3::new(2.0, 0.0, 0.0)), 1.0);
        assert!((mask.gain(DVec3::new(3.0, 0.0, 0.0)) - 0.5).abs() < 1e-6);
        mask.inside = true;
        assert_eq!(mask.gain(DVec3::ZERO), 0.0);
        assert!((mask.gain(DVec3::new(3.0, 0.0, 0.0)) - 0.5).abs() < 1e-6);
    }
}
