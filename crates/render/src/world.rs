//! The world: all scene objects and one render graph per receiver.

use crate::acoustic::{AcousticModel, DiffuseModel, PathContext};
use crate::objects::{DiffuseField, Face, Mask, Receiver, Source};
use crate::RenderError;
use std::path::Path;
use tascar_core::{ChunkConfig, Transport};
use tascar_scene::SceneDesc;
use tracing::debug;

/// Acoustic models rendered into one receiver.
///
/// Point models are ordered by image order: primaries first, then first
/// order images and so on, so a parent always precedes its images.
#[derive(Debug, Clone)]
pub struct ReceiverGraph {
    receiver: usize,
    point: Vec<AcousticModel>,
    diffuse: Vec<DiffuseModel>,
    active_point: usize,
    active_diffuse: usize,
}

impl ReceiverGraph {
    /// Build the graph of receiver `index` up to image order `ismorder`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        receiver: &Receiver,
        sources: &[Source],
        faces: usize,
        fields: usize,
        ismorder: u32,
        cfg: &ChunkConfig,
        c: f64,
    ) -> Self {
        let diffuse = if receiver.render_diffuse {
            (0..fields).map(|k| DiffuseModel::new(k, cfg)).collect()
        } else {
            Vec::new()
        };
        let mut point = Vec::new();
        if receiver.render_point {
            for (isrc, src) in sources.iter().enumerate() {
                for isnd in 0..src.sounds.len() {
                    point.push(AcousticModel::primary(sources, isrc, isnd, receiver, cfg, c));
                }
            }
            if receiver.render_image {
                let mut previous = 0..point.len();
                for _ in 0..ismorder {
                    let first = point.len();
                    for parent in previous.clone() {
                        for face in 0..faces {
                            if point[parent].reflector() == Some(face) {
                                continue;
                            }
                            let model = AcousticModel::image(
                                sources,
                                &point[parent],
                                parent,
                                face,
                                receiver,
                                cfg,
                                c,
                            );
                            point.push(model);
                        }
                    }
                    previous = first..point.len();
                    if previous.is_empty() {
                        break;
                    }
                }
            }
        }
        Self {
            receiver: index,
            point,
            diffuse,
            active_point: 0,
            active_diffuse: 0,
        }
    }

    /// Receiver index.
    pub fn receiver(&self) -> usize {
        self.receiver
    }

    /// Point models in processing order.
    pub fn point_models(&self) -> &[AcousticModel] {
        &self.point
    }

    /// Diffuse models.
    pub fn diffuse_models(&self) -> &[DiffuseModel] {
        &self.diffuse
    }

    /// Render all point models.
    pub fn process_point(&mut self, ctx: &PathContext, receiver: &mut Receiver) {
        self.active_point = 0;
        for k in 0..self.point.len() {
            let (done, rest) = self.point.split_at_mut(k);
            let model = &mut rest[0];
            let parent = model.parent().map(|p| &done[p]);
            self.active_point += model.process(ctx, parent, receiver) as usize;
        }
    }

    /// Render all diffuse models.
    pub fn process_diffuse(&mut self, fields: &[DiffuseField], receiver: &mut Receiver) {
        self.active_diffuse = 0;
        for model in &mut self.diffuse {
            self.active_diffuse += model.process(fields, receiver) as usize;
        }
    }
}

/// All objects of a scene with their render graphs.
#[derive(Debug)]
pub struct World {
    /// Sources.
    pub sources: Vec<Source>,
    /// Receivers.
    pub receivers: Vec<Receiver>,
    /// Reflectors.
    pub faces: Vec<Face>,
    /// Diffuse fields.
    pub diffuse: Vec<DiffuseField>,
    /// Receiver masks.
    pub masks: Vec<Mask>,
    graphs: Vec<ReceiverGraph>,
}

impl World {
    /// Build all objects and graphs of `scene`.
    pub fn new(scene: &SceneDesc, cfg: &ChunkConfig, base_dir: &Path) -> Result<Self, RenderError> {
        let sources = scene
            .source
            .iter()
            .map(|d| Source::new(d, cfg, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        let receivers = scene
            .receiver
            .iter()
            .map(|d| Receiver::new(d, cfg, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        let faces = scene
            .face
            .iter()
            .map(|d| Face::new(d, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        let diffuse = scene
            .diffuse
            .iter()
            .map(|d| DiffuseField::new(d, cfg, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        let masks = scene
            .mask
            .iter()
            .map(|d| Mask::new(d, base_dir))
            .collect::<Result<Vec<_>, _>>()?;
        let graphs: Vec<ReceiverGraph> = receivers
            .iter()
            .enumerate()
            .map(|(k, rec)| {
                ReceiverGraph::new(
                    k,
                    rec,
                    &sources,
                    faces.len(),
                    diffuse.len(),
                    scene.ismorder,
                    cfg,
                    scene.c,
                )
            })
            .collect();
        for graph in &graphs {
            debug!(
                receiver = %receivers[graph.receiver].object.name,
                point = graph.point.len(),
                diffuse = graph.diffuse.len(),
                "Built receiver graph"
            );
        }
        Ok(Self {
            sources,
            receivers,
            faces,
            diffuse,
            masks,
            graphs,
        })
    }

    /// Render graphs, one per receiver.
    pub fn graphs(&self) -> &[ReceiverGraph] {
        &self.graphs
    }

    /// Move every object to session time `t`.
    pub fn geometry_update(&mut self, t: f64) {
        for src in &mut self.sources {
            src.geometry_update(t);
        }
        for rec in &mut self.receivers {
            rec.geometry_update(t);
        }
        for face in &mut self.faces {
            face.geometry_update(t);
        }
        for field in &mut self.diffuse {
            field.object.geometry_update(t);
        }
        for mask in &mut self.masks {
            mask.object.geometry_update(t);
        }
    }

    /// Update activity of every object; solo applies across all object kinds.
    pub fn process_active(&mut self, t: f64) {
        let anysolo = self.sources.iter().any(|o| o.object.solo)
            || self.receivers.iter().any(|o| o.object.solo)
            || self.faces.iter().any(|o| o.object.solo)
            || self.diffuse.iter().any(|o| o.object.solo)
            || self.masks.iter().any(|o| o.object.solo);
        for src in &mut self.sources {
            src.update_activity(t, anysolo);
        }
        for rec in &mut self.receivers {
            rec.object.update_activity(t, anysolo);
        }
        for face in &mut self.faces {
            face.object.update_activity(t, anysolo);
        }
        for field in &mut self.diffuse {
            field.object.update_activity(t, anysolo);
        }
        for mask in &mut self.masks {
            mask.object.update_activity(t, anysolo);
        }
    }

    fn apply_masks(&mut self) {
        let masks: Vec<&Mask> = self.masks.iter().filter(|m| m.object.is_active()).collect();
        let any_outer = masks.iter().any(|m| !m.inside);
        for rec in &mut self.receivers {
            let mut gain_inner = 1.0f32;
            let mut gain_outer = 0.0f32;
            for mask in &masks {
                let g = mask.gain(rec.position);
                if mask.inside {
                    gain_inner = gain_inner.min(g);
                } else {
                    gain_outer = gain_outer.max(g);
                }
            }
            if any_outer {
                gain_inner *= gain_outer;
            }
            rec.set_next_gain(gain_inner);
        }
    }

    /// Render one fragment into the receiver outputs.
    ///
    /// Objects must already be moved and their activity updated.
    pub fn process(&mut self, transport: &Transport) {
        for rec in &mut self.receivers {
            rec.clear_output();
        }
        self.apply_masks();
        let ctx = PathContext {
            sources: &self.sources,
            faces: &self.faces,
            transport,
        };
        for graph in &mut self.graphs {
            let rec = &mut self.receivers[graph.receiver];
            graph.process_point(&ctx, rec);
        }
        for graph in &mut self.graphs {
            let rec = &mut self.receivers[graph.receiver];
            graph.process_diffuse(&self.diffuse, rec);
        }
        for rec in &mut self.receivers {
            rec.postproc();
            rec.apply_gain();
        }
    }

    /// Number of point models over all receivers.
    pub fn total_pointsources(&self) -> usize {
        self.graphs.iter().map(|g| g.point.len()).sum()
    }

    /// Number of point models that added audio in the last fragment.
    pub fn active_pointsources(&self) -> usize {
        self.graphs.iter().map(|g| g.active_point).sum()
    }

    /// Number of diffuse models over all receivers.
    pub fn total_diffuse(&self) -> usize {
        self.graphs.iter().map(|g| g.diffuse.len()).sum()
    }

    /// Number of diffuse models that added audio in the last fragment.
    pub fn active_diffuse(&self) -> usize {
        self.graphs.iter().map(|g| g.active_diffuse).sum()
    }
}
