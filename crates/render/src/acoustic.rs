//! Acoustic models: one per sound path and receiver.
//!
//! A point model renders a primary sound or one of its image sources into a
//! receiver: directivity, distance gain, propagation delay, air absorption,
//! reflection filtering and panning. A diffuse model renders a diffuse field.

use crate::directivity::DirectivityState;
use crate::objects::{DiffuseField, Face, Receiver, Sound, Source};
use crate::receivermod::PanState;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use tascar_audio::{Amb1Wave, VariDelay, Wave};
use tascar_core::{make_friendly_number, ChunkConfig, DVec3, PosExt, Transport};

/// Air absorption distance constant: `exp(-d·fs/(c·AIR_CONSTANT))`.
const AIR_CONSTANT: f64 = 7782.0;
/// Exponent of the image source aperture gain.
const APERTURE_EXPONENT: f64 = 2.7;
/// Oversampling of the tabulated sinc kernel.
const SINC_OVERSAMPLING: usize = 64;

/// Shared, read-only state of one processing cycle.
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    /// All sources of the world.
    pub sources: &'a [Source],
    /// All reflectors of the world.
    pub faces: &'a [Face],
    /// Transport of the current fragment.
    pub transport: &'a Transport,
}

impl PathContext<'_> {
    fn sound(&self, source: usize, sound: usize) -> &Sound {
        &self.sources[source].sounds[sound]
    }
}

/// Propagation of one sound path (primary or image source) to one receiver.
#[derive(Debug, Clone)]
pub struct AcousticModel {
    source: usize,
    sound: usize,
    parent: Option<usize>,
    reflector: Option<usize>,
    /// Reflectors from this image back to the primary source.
    chain: Vec<usize>,
    order: u32,
    position: DVec3,
    p_cut: DVec3,
    visible: bool,
    reflection_state: Vec<f64>,
    audio: Wave,
    dt: f64,
    c: f64,
    dscale: f64,
    distance: f64,
    gain: f64,
    air: f64,
    air_state: f32,
    layergain: f64,
    dlayergain: f64,
    delayline: VariDelay,
    pan: PanState,
    directivity: DirectivityState,
}

impl AcousticModel {
    /// Model of the primary sound `sound` of source `source`.
    pub fn primary(
        sources: &[Source],
        source: usize,
        sound: usize,
        receiver: &Receiver,
        cfg: &ChunkConfig,
        c: f64,
    ) -> Self {
        let snd = &sources[source].sounds[sound];
        Self::build(snd, receiver, cfg, c, source, sound, None, None, Vec::new())
    }

    /// Image of `parent` (at index `parent_index` of the same graph) mirrored at face `reflector`.
    pub fn image(
        sources: &[Source],
        parent: &AcousticModel,
        parent_index: usize,
        reflector: usize,
        receiver: &Receiver,
        cfg: &ChunkConfig,
        c: f64,
    ) -> Self {
        let snd = &sources[parent.source].sounds[parent.sound];
        let mut chain = Vec::with_capacity(parent.chain.len() + 1);
        chain.push(reflector);
        chain.extend_from_slice(&parent.chain);
        Self::build(
            snd,
            receiver,
            cfg,
            c,
            parent.source,
            parent.sound,
            Some(parent_index),
            Some(reflector),
            chain,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        snd: &Sound,
        receiver: &Receiver,
        cfg: &ChunkConfig,
        c: f64,
        source: usize,
        sound: usize,
        parent: Option<usize>,
        reflector: Option<usize>,
        chain: Vec<usize>,
    ) -> Self {
        let fs = cfg.sample_rate;
        let rp = receiver.update_refpoint(snd.position, snd.position, false, snd.gainmodel);
        let maxdelay = ((snd.maxdist / c) * fs).max(1.0) as usize;
        let order = chain.len() as u32;
        let layergain = if receiver.layers & snd.layers != 0 {
            1.0
        } else {
            0.0
        };
        Self {
            source,
            sound,
            parent,
            reflector,
            reflection_state: vec![0.0; chain.len()],
            chain,
            order,
            position: snd.position,
            p_cut: snd.position,
            visible: true,
            audio: Wave::new(cfg.fragment_size),
            dt: 1.0 / cfg.fragment_size.max(1) as f64,
            c,
            dscale: fs / (c * AIR_CONSTANT),
            distance: rp.distance,
            gain: 1.0,
            air: 0.5,
            air_state: 0.0,
            layergain,
            dlayergain: 1.0 / (receiver.layerfadelen * fs).max(1.0),
            delayline: VariDelay::with_oversampling(
                maxdelay,
                fs,
                c,
                snd.sincorder,
                SINC_OVERSAMPLING,
            ),
            pan: PanState::new(receiver.module.channels()),
            directivity: DirectivityState::default(),
        }
    }

    /// Source index.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Sound index within the source.
    pub fn sound(&self) -> usize {
        self.sound
    }

    /// Index of the parent model in the same graph, for images.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Face this image is mirrored at.
    pub fn reflector(&self) -> Option<usize> {
        self.reflector
    }

    /// Image source order (0 for primary sounds).
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Current (image) source position.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// False if the image lies in front of its reflector.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Path length reached at the end of the last fragment, after delay compensation.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Distance gain reached at the end of the last fragment.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Mirror the parent position at the reflector.
    fn update_position(&mut self, snd: &Sound, parent: Option<&AcousticModel>, faces: &[Face]) {
        self.visible = true;
        match (self.reflector, parent) {
            (Some(r), Some(parent)) => {
                let poly = &faces[r].polygon;
                self.p_cut = poly.nearest_on_plane(parent.position);
                self.position = 2.0 * self.p_cut - parent.position;
                if (self.position - self.p_cut).dot(poly.normal()) > 0.0 {
                    self.visible = false;
                }
            }
            _ => {
                self.position = snd.position;
                self.p_cut = snd.position;
            }
        }
    }

    /// Apparent source position seen from `p_rec` and the aperture gain of the reflection.
    fn effective_position(&self, p_rec: DVec3, faces: &[Face]) -> (DVec3, f64) {
        let Some(r) = self.reflector else {
            return (self.position, 1.0);
        };
        let face = &faces[r];
        let poly = &face.polygon;
        let pcut_rec = poly.nearest_on_plane(p_rec);
        if (p_rec - pcut_rec).dot(poly.normal()) < 0.0 {
            return (self.position, 0.0);
        }
        let len_rec = (p_rec - pcut_rec).length();
        let len_src = (self.p_cut - self.position).length();
        let ratio = len_rec / (len_rec + len_src).max(1e-6);
        let (p_is, _) = poly.nearest(pcut_rec + (self.p_cut - pcut_rec) * ratio);
        let aperture = (p_rec - p_is)
            .normal()
            .dot((p_is - self.position).normal())
            .max(0.0);
        let gain = aperture.powf(APERTURE_EXPONENT);
        let position = if face.edgereflection {
            p_is + (p_is - p_rec).normal() * (p_is - self.position).length()
        } else {
            self.position
        };
        (position, gain)
    }

    fn apply_reflection_filters(&mut self, faces: &[Face]) {
        for (face, state) in self.chain.iter().zip(self.reflection_state.iter_mut()) {
            faces[*face].apply_reflection_filter(&mut self.audio, state);
        }
    }

    /// Render one fragment into `receiver`; returns 1 if audio was added.
    ///
    /// `parent` is the parent image model of this path, already processed
    /// in this cycle.
    pub fn process(
        &mut self,
        ctx: &PathContext,
        parent: Option<&AcousticModel>,
        receiver: &mut Receiver,
    ) -> u32 {
        let snd = ctx.sound(self.source, self.sound);
        if snd.active {
            self.update_position(snd, parent, ctx.faces);
        }
        let reflector_active = self
            .reflector
            .map_or(true, |r| ctx.faces[r].object.is_active());
        if receiver.gain_zero() || !receiver.is_active() || !snd.active || !reflector_active {
            if snd.active {
                self.delayline.add_chunk(&snd.input);
            } else {
                for _ in 0..snd.input.len() {
                    self.delayline.push(0.0);
                }
            }
            return 0;
        }
        if !receiver.render_point
            || !snd.renders_order(self.order)
            || !receiver.renders_order(self.order)
        {
            return 0;
        }
        let layeractive = receiver.layers & snd.layers != 0;
        if !layeractive && self.layergain <= 0.0 {
            return 0;
        }
        if !self.visible {
            return 0;
        }
        let (position, srcgainmod) = self.effective_position(receiver.position, ctx.faces);
        let prelsrc = snd
            .orientation
            .rotate_inverse(receiver.position - snd.position);
        self.directivity
            .read(snd.directivity, prelsrc, &snd.input, &mut self.audio);
        let rp = receiver.update_refpoint(snd.position, position, self.order > 0, snd.gainmodel);
        if rp.distance > snd.maxdist {
            return 0;
        }
        let next_gain = rp.gain * srcgainmod;
        let next_air = (-rp.distance * self.dscale).exp();
        let next_distance = (rp.distance - self.c * receiver.delaycomp).max(0.0);
        let ddistance = (next_distance - self.distance) * self.dt;
        let mut dgain = (next_gain - self.gain) * self.dt;
        let dair = (next_air - self.air) * self.dt;
        self.apply_reflection_filters(ctx.faces);
        if receiver.muteonstop && !ctx.transport.rolling {
            self.gain = 0.0;
            dgain = 0.0;
        }
        let mut distance = self.distance;
        let mut gain = self.gain;
        let mut air = self.air;
        for v in self.audio.iter_mut() {
            distance += ddistance;
            gain += dgain;
            if layeractive {
                self.layergain = (self.layergain + self.dlayergain).min(1.0);
            } else {
                self.layergain = (self.layergain - self.dlayergain).max(0.0);
            }
            let mut y = if snd.delayline {
                self.delayline.get_dist_push(distance, *v)
            } else {
                *v
            };
            y *= (self.layergain * gain) as f32;
            if snd.airabsorption {
                air += dair;
                let c1 = air as f32;
                self.air_state = make_friendly_number((1.0 - c1) * self.air_state + c1 * y);
                y = self.air_state;
            }
            *v = y;
        }
        self.distance = next_distance;
        self.gain = if receiver.muteonstop && !ctx.transport.rolling {
            0.0
        } else {
            next_gain
        };
        self.air = next_air;
        if self.gain == 0.0 && dgain == 0.0 {
            return 0;
        }
        if snd.minlevel > 0.0 && self.audio.rms() <= snd.minlevel {
            return 0;
        }
        let scattering = self.reflector.map_or(0.0, |r| ctx.faces[r].scattering);
        let width = FRAC_PI_2.min(FRAC_PI_4 * snd.size / rp.distance.max(0.01));
        receiver.add_pointsource(rp.prel, width, scattering, &self.audio, &mut self.pan);
        1
    }
}

/// Rendering of one diffuse field into one receiver.
#[derive(Debug, Clone)]
pub struct DiffuseModel {
    field: usize,
    gain: f32,
    dt: f32,
    audio: Amb1Wave,
}

impl DiffuseModel {
    /// Model of diffuse field `field`.
    pub fn new(field: usize, cfg: &ChunkConfig) -> Self {
        Self {
            field,
            gain: 1.0,
            dt: 1.0 / cfg.fragment_size.max(1) as f32,
            audio: Amb1Wave::new(cfg.fragment_size),
        }
    }

    /// Diffuse field index.
    pub fn field(&self) -> usize {
        self.field
    }

    /// Render one fragment; returns 1 if audio was added.
    pub fn process(&mut self, fields: &[DiffuseField], receiver: &mut Receiver) -> u32 {
        let field = &fields[self.field];
        let d = field.shoebox().next_point(receiver.position).length();
        let x = if field.falloff > 0.0 {
            (d / field.falloff).min(1.0)
        } else if d > 0.0 {
            1.0
        } else {
            0.0
        };
        let next_gain = (0.5 + 0.5 * (PI * x).cos()) as f32;
        if self.gain == 0.0 && next_gain == 0.0 {
            return 0;
        }
        for (dst, src) in self.audio.channels_mut().into_iter().zip(field.audio.channels()) {
            dst.copy_from(src);
        }
        self.audio.rotate_inverse(&receiver.orientation);
        let active = receiver.is_active() && field.object.is_active();
        if active {
            let dg = (next_gain - self.gain) * self.dt;
            let mut g = self.gain;
            for k in 0..self.audio.len() {
                g += dg;
                for ch in self.audio.channels_mut() {
                    ch[k] *= g;
                }
            }
        }
        self.gain = next_gain;
        if receiver.render_diffuse
            && active
            && !receiver.gain_zero()
            && receiver.layers & field.layers != 0
        {
            self.audio.scale(receiver.diffusegain);
            receiver.add_diffuse(&self.audio);
            return 1;
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tascar_scene::{FaceDesc, ObjectDesc, ReceiverDesc, SoundDesc, SourceDesc};

    const FS: f64 = 34000.0;

    fn cfg() -> ChunkConfig {
        ChunkConfig::new(FS, 64, 1)
    }

    fn source_at(p: [f64; 3]) -> Source {
        let desc = SourceDesc {
            object: ObjectDesc::at("src", p),
            sound: vec![SoundDesc {
                airabsorption: false,
                ..SoundDesc::default()
            }],
        };
        Source::new(&desc, &cfg(), Path::new(".")).expect("valid source")
    }

    fn receiver() -> Receiver {
        let desc = ReceiverDesc {
            object: ObjectDesc::at("rec", [0.0; 3]),
            ..ReceiverDesc::default()
        };
        let mut rec = Receiver::new(&desc, &cfg(), Path::new(".")).expect("valid receiver");
        rec.object.update_activity(0.0, false);
        rec
    }

    fn wall() -> Face {
        let desc = FaceDesc {
            object: ObjectDesc::at("wall", [-1.0, -5.0, -5.0]),
            width: 10.0,
            height: 10.0,
            ..FaceDesc::default()
        };
        let mut face = Face::new(&desc, Path::new(".")).expect("valid face");
        face.object.update_activity(0.0, false);
        face
    }

    #[test]
    fn primary_delay_and_gain() {
        let mut sources = vec![source_at([2.0, 0.0, 0.0])];
        let mut rec = receiver();
        let tp = Transport::default();
        let mut model = AcousticModel::primary(&sources, 0, 0, &rec, &cfg(), 340.0);
        sources[0].sounds[0].input[0] = 1.0;
        let ctx = PathContext {
            sources: &sources,
            faces: &[],
            transport: &tp,
        };
        rec.clear_output();
        assert_eq!(model.process(&ctx, None, &mut rec), 1);
        // 2 m at 34 kHz is 200 samples; the impulse lands in the fourth fragment.
        let mut delivered = vec![0.0f32; 64 * 4];
        delivered[..64].copy_from_slice(&rec.outputs[0]);
        sources[0].sounds[0].input.clear();
        for frag in 1..4 {
            let ctx = PathContext {
                sources: &sources,
                faces: &[],
                transport: &tp,
            };
            rec.clear_output();
            model.process(&ctx, None, &mut rec);
            delivered[64 * frag..64 * (frag + 1)].copy_from_slice(&rec.outputs[0]);
        }
        let peak = delivered
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(k, v)| (k, *v));
        let (k, v) = peak.expect("non-empty");
        assert_eq!(k, 200);
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn image_is_mirrored_and_visible() {
        let sources = vec![source_at([2.0, 0.0, 0.0])];
        let faces = vec![wall()];
        let mut rec = receiver();
        let tp = Transport::default();
        let ctx = PathContext {
            sources: &sources,
            faces: &faces,
            transport: &tp,
        };
        let mut primary = AcousticModel::primary(&sources, 0, 0, &rec, &cfg(), 340.0);
        let mut image = AcousticModel::image(&sources, &primary, 0, 0, &rec, &cfg(), 340.0);
        assert_eq!(image.order(), 1);
        primary.process(&ctx, None, &mut rec);
        image.process(&ctx, Some(&primary), &mut rec);
        assert!(image.is_visible());
        assert!((image.position() - DVec3::new(-4.0, 0.0, 0.0)).length() < 1e-9);
        assert!((image.distance() - 4.0).abs() < 1e-9);
        assert!((image.gain() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn image_of_source_behind_face_is_invisible() {
        let sources = vec![source_at([-2.0, 0.0, 0.0])];
        let faces = vec![wall()];
        let mut rec = receiver();
        let tp = Transport::default();
        let ctx = PathContext {
            sources: &sources,
            faces: &faces,
            transport: &tp,
        };
        let mut primary = AcousticModel::primary(&sources, 0, 0, &rec, &cfg(), 340.0);
        let mut image = AcousticModel::image(&sources, &primary, 0, 0, &rec, &cfg(), 340.0);
        primary.process(&ctx, None, &mut rec);
        assert_eq!(image.process(&ctx, Some(&primary), &mut rec), 0);
        assert!(!image.is_visible());
    }

    #[test]
    fn delay_compensation_shortens_path() {
        let sources = vec![source_at([3.4, 0.0, 0.0])];
        let mut rec = receiver();
        rec.delaycomp = 0.005;
        let tp = Transport::default();
        let ctx = PathContext {
            sources: &sources,
            faces: &[],
            transport: &tp,
        };
        let mut model = AcousticModel::primary(&sources, 0, 0, &rec, &cfg(), 340.0);
        model.process(&ctx, None, &mut rec);
        assert!((model.distance() - 1.7).abs() < 1e-9);
        assert!((model.gain() - 1.0 / 3.4).abs() < 1e-9);
    }

    #[test]
    fn diffuse_gain_fades_outside_field() {
        use tascar_scene::DiffuseDesc;
        let desc = DiffuseDesc {
            object: ObjectDesc::at("amb", [2.0, 0.0, 0.0]),
            size: [2.0, 2.0, 2.0],
            falloff: 2.0,
            ..DiffuseDesc::default()
        };
        let mut field = DiffuseField::new(&desc, &cfg(), Path::new(".")).expect("valid field");
        field.object.update_activity(0.0, false);
        field.set_input([&[1.0; 64], &[0.0; 64], &[0.0; 64], &[0.0; 64]]);
        let fields = vec![field];
        let mut rec = receiver();
        let mut model = DiffuseModel::new(0, &cfg());
        rec.clear_output();
        assert_eq!(model.process(&fields, &mut rec), 1);
        // Receiver is 1 m outside the box: gain fades from 1 to 0.5.
        let out = &rec.outputs[0];
        assert!(out[63] > 0.0);
        assert!(out[0] > out[63]);
    }
}
