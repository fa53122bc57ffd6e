//! Pass Executor
//!
//! Turns a demo's declarative [`Pass`] list into one [`Frame`] command
//! stream. For every pass it:
//!
//! 1. advances the [`FrameTracker`] (passes out of stage order are rejected),
//! 2. binds the exact target and sets the viewport to the target's size
//!    (cube faces use the capture resolution, not the window),
//! 3. clears what the pass owns this frame (each cube face and each blur
//!    step clears on its own),
//! 4. packs the uniform block of every draw, recomputing the normal matrix
//!    per draw.
//!
//! Textures written earlier in the frame are resolved by target name. A
//! cubemap that a capture pass in the same list has not yet written cannot
//! be sampled.

use glam::{Mat4, Vec3};
use smallvec::SmallVec;

use super::config::FrameConfig;
use super::pass::{
    BlurPass, CompositePass, CubemapCapturePass, DrawItem, Pass, PassTarget, ScenePass, Shading,
    TextureSource,
};
use super::programs::{ProgramKind, ProgramLibrary};
use super::targets::{RenderTargets, TargetName};
use crate::errors::{Result, TavernError};
use crate::renderer::backend::{
    BufferId, ClearOp, CubeFace, DrawCall, DrawState, Frame, LightBinding, PassBegin, ProgramId,
    RenderTarget, TextureId, VertexSource, Viewport,
};
use crate::renderer::graph::{FrameStage, FrameTracker};
use crate::renderer::settings::Projection;
use crate::resources::post_process::{BLUR_WEIGHTS, blur_last_written, blur_schedule};
use crate::resources::uniforms::{
    BlurUniforms, IdUniforms, PostUniforms, SceneFlags, SceneUniforms, SkyUniforms, UniformBlock,
    id_to_color,
};
use crate::scene::Camera;
use crate::scene::camera::face_roll;

/// Binding point of the light block in group 0.
pub const LIGHT_BLOCK_BINDING: u32 = 1;

/// The light uniform buffer as seen by passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightBlock {
    pub buffer: BufferId,
    pub count: usize,
}

/// Everything a frame's passes read besides the pass list itself.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a Camera,
    pub projection: &'a Projection,
    /// Window size in pixels.
    pub window: (u32, u32),
    pub lights: Option<LightBlock>,
    pub config: &'a FrameConfig,
}

/// The camera a pass (or one cube face) renders from.
#[derive(Debug, Clone, Copy)]
struct Eye {
    projection: Mat4,
    camera: Camera,
    /// Set while capturing; the view then takes the face's roll.
    face: Option<CubeFace>,
}

impl Eye {
    fn roll(&self) -> Mat4 {
        self.face.map_or(Mat4::IDENTITY, face_roll)
    }

    fn view(&self) -> Mat4 {
        self.roll() * self.camera.view_matrix()
    }

    /// Rotation-only view for the skybox.
    fn sky_view(&self) -> Mat4 {
        self.roll() * self.camera.view_matrix_no_translation()
    }

    fn position(&self) -> Vec3 {
        self.camera.inverse_view_matrix().w_axis.truncate()
    }
}

/// Stage a pass runs in.
#[must_use]
pub fn stage_of(pass: &Pass) -> FrameStage {
    match pass {
        Pass::CubemapCapture(_) => FrameStage::CaptureEnvironment,
        Pass::Scene(_) => FrameStage::RenderScene,
        Pass::Blur(_) => FrameStage::BlurChain,
        Pass::Composite(_) => FrameStage::Composite,
    }
}

pub struct PassExecutor<'a> {
    programs: &'a ProgramLibrary,
    targets: &'a RenderTargets,
    stage: Option<FrameStage>,
    blur_output: Option<TextureId>,
    pending_captures: SmallVec<[TargetName; 1]>,
}

impl<'a> PassExecutor<'a> {
    #[must_use]
    pub fn new(programs: &'a ProgramLibrary, targets: &'a RenderTargets) -> Self {
        Self {
            programs,
            targets,
            stage: None,
            blur_output: None,
            pending_captures: SmallVec::new(),
        }
    }

    /// Records `passes` in order. `tracker` must already be in
    /// [`FrameStage::BeginFrame`].
    pub fn record(
        mut self,
        label: &str,
        passes: &[Pass],
        ctx: &FrameContext,
        tracker: &mut FrameTracker,
    ) -> Result<Frame> {
        self.pending_captures = passes
            .iter()
            .filter_map(|p| match p {
                Pass::CubemapCapture(c) => Some(c.target),
                _ => None,
            })
            .collect();

        let mut frame = Frame::new(label);
        for pass in passes {
            let stage = stage_of(pass);
            tracker.enter(stage)?;
            self.stage = Some(stage);
            match pass {
                Pass::CubemapCapture(p) => self.record_capture(&mut frame, p, ctx)?,
                Pass::Scene(p) => self.record_scene(&mut frame, p, ctx)?,
                Pass::Blur(p) => self.record_blur(&mut frame, p, ctx)?,
                Pass::Composite(p) => self.record_composite(&mut frame, p, ctx)?,
            }
        }
        Ok(frame)
    }

    // ========================================================================
    // Passes
    // ========================================================================

    fn record_capture(&mut self, frame: &mut Frame, pass: &CubemapCapturePass, ctx: &FrameContext) -> Result<()> {
        let fb = self.targets.framebuffer(pass.target)?;
        let viewport = Viewport::sized(fb.width, fb.height);
        let mut viewer = Camera::new(pass.center, 0.0, 0.0);
        let projection = ctx.projection.cube_face_matrix();

        for face in CubeFace::ALL {
            frame.begin_pass(PassBegin {
                label: format!("Capture {face:?}"),
                target: RenderTarget::CubeFace {
                    framebuffer: fb.id(),
                    face,
                },
                viewport,
                clear: ClearOp::BLACK,
            });
            viewer.set_face(face.index())?;
            let eye = Eye {
                projection,
                camera: viewer,
                face: Some(face),
            };
            for item in &pass.draws {
                frame.draw(self.draw_call(item, &eye, false, ctx)?);
            }
            frame.end_pass();
        }

        self.pending_captures.retain(|t| *t != pass.target);
        Ok(())
    }

    fn record_scene(&mut self, frame: &mut Frame, pass: &ScenePass, ctx: &FrameContext) -> Result<()> {
        let (target, viewport, attachments) = self.bind(pass.target, ctx)?;
        frame.begin_pass(PassBegin {
            label: pass.label.to_string(),
            target,
            viewport,
            clear: ClearOp::BLACK,
        });
        let eye = Eye {
            projection: ctx.projection.matrix(viewport.aspect()),
            camera: *ctx.camera,
            face: None,
        };
        for item in &pass.draws {
            frame.draw(self.draw_call(item, &eye, attachments > 1, ctx)?);
        }
        frame.end_pass();
        Ok(())
    }

    fn record_blur(&mut self, frame: &mut Frame, pass: &BlurPass, ctx: &FrameContext) -> Result<()> {
        let program = self.programs.get(ProgramKind::Blur)?;
        let source = self.resolve(pass.source)?;
        let iterations = ctx.config.blur_iterations;

        for (i, step) in blur_schedule(iterations).enumerate() {
            let fb = self.targets.framebuffer(pass.targets[step.target])?;
            let input = match step.source {
                None => source,
                Some(read) => self.targets.color(pass.targets[read], 0)?,
            };
            frame.begin_pass(PassBegin {
                label: format!(
                    "Blur {i} {}",
                    if step.horizontal { "horizontal" } else { "vertical" }
                ),
                target: RenderTarget::Offscreen(fb.id()),
                viewport: Viewport::sized(fb.width, fb.height),
                clear: ClearOp {
                    color: Some([0.0, 0.0, 0.0, 1.0]),
                    depth: false,
                },
            });
            frame.draw(fullscreen(
                program,
                BlurUniforms::new(step.horizontal, &BLUR_WEIGHTS).to_bytes(),
                [input],
            ));
            frame.end_pass();
        }

        // With no iterations the unblurred bright pass is the output.
        self.blur_output = Some(if iterations == 0 {
            source
        } else {
            self.targets.color(pass.targets[blur_last_written(iterations)], 0)?
        });
        Ok(())
    }

    fn record_composite(&mut self, frame: &mut Frame, pass: &CompositePass, ctx: &FrameContext) -> Result<()> {
        let program = self.programs.get(ProgramKind::Composite)?;
        let (target, viewport, _) = self.bind(pass.target, ctx)?;
        let scene = self.resolve(pass.scene)?;
        let bloom = match pass.bloom {
            Some(source) => self.resolve(source)?,
            None => scene,
        };

        let config = ctx.config;
        let uniforms = PostUniforms::new(
            &config.kernel,
            config.kernel_ratio,
            config.exposure,
            config.gamma,
            config.post_flags(pass.bloom.is_some()),
        );

        frame.begin_pass(PassBegin {
            label: "Composite".to_string(),
            target,
            viewport,
            clear: if target == RenderTarget::Default {
                ClearOp::WHITE
            } else {
                ClearOp::BLACK
            },
        });
        frame.draw(fullscreen(program, uniforms.to_bytes(), [scene, bloom]));
        frame.end_pass();
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn bind(&self, target: PassTarget, ctx: &FrameContext) -> Result<(RenderTarget, Viewport, usize)> {
        match target {
            PassTarget::Default => Ok((
                RenderTarget::Default,
                Viewport::sized(ctx.window.0, ctx.window.1),
                1,
            )),
            PassTarget::Offscreen(name) => {
                let fb = self.targets.framebuffer(name)?;
                Ok((
                    RenderTarget::Offscreen(fb.id()),
                    Viewport::sized(fb.width, fb.height),
                    fb.attachment_count(),
                ))
            }
        }
    }

    fn resolve(&self, source: TextureSource) -> Result<TextureId> {
        match source {
            TextureSource::Texture(id) => Ok(id),
            TextureSource::Attachment { target, index } => {
                if self.pending_captures.contains(&target) {
                    return Err(TavernError::StageOrder {
                        from: self.stage,
                        to: FrameStage::CaptureEnvironment,
                    });
                }
                self.targets.color(target, index)
            }
            TextureSource::BlurOutput => self
                .blur_output
                .ok_or_else(|| TavernError::UnknownResource("no blur chain ran this frame".into())),
        }
    }

    fn draw_call(&self, item: &DrawItem, eye: &Eye, bloom_target: bool, ctx: &FrameContext) -> Result<DrawCall> {
        let program = self.programs.get(item.program)?;
        let textures = item
            .textures
            .iter()
            .map(|s| self.resolve(*s))
            .collect::<Result<SmallVec<[TextureId; 4]>>>()?;

        let bloom = if bloom_target && ctx.config.bloom {
            SceneFlags::BLOOM_OUTPUT
        } else {
            SceneFlags::empty()
        };
        let light_count = ctx.lights.map_or(0, |l| l.count);
        let scene_uniforms = |flags: SceneFlags| {
            SceneUniforms::new(eye.projection, eye.view(), item.model, eye.position())
                .with_lighting(light_count, ctx.config.brightness_clamp)
                .with_flags(flags | bloom)
                .to_bytes()
        };

        let mut state = DrawState {
            wireframe: ctx.config.wireframe,
            ..DrawState::default()
        };
        let mut lights = None;
        let uniforms = match item.shading {
            Shading::Lit(flags) => {
                lights = ctx.lights.map(|l| LightBinding {
                    buffer: l.buffer,
                    binding: LIGHT_BLOCK_BINDING,
                });
                scene_uniforms(flags)
            }
            Shading::Unlit(flags) => scene_uniforms(flags),
            Shading::Sky => {
                state.depth_write = false;
                state.wireframe = false;
                SkyUniforms {
                    projection: eye.projection,
                    view: eye.sky_view(),
                }
                .to_bytes()
            }
            Shading::Id(id) => {
                state.wireframe = false;
                IdUniforms {
                    projection: eye.projection,
                    view: eye.view(),
                    model: item.model,
                    color: id_to_color(id),
                }
                .to_bytes()
            }
        };

        Ok(DrawCall {
            program,
            vertices: Some(VertexSource {
                buffer: item.mesh.buffer,
                layout: item.mesh.layout,
            }),
            instances: item.instances,
            vertex_range: 0..item.mesh.vertex_count,
            uniforms,
            textures,
            lights,
            state,
        })
    }
}

fn fullscreen<const N: usize>(program: ProgramId, uniforms: Vec<u8>, textures: [TextureId; N]) -> DrawCall {
    DrawCall {
        program,
        vertices: None,
        instances: None,
        vertex_range: 0..3,
        uniforms,
        textures: textures.into_iter().collect(),
        lights: None,
        state: DrawState {
            depth_test: false,
            depth_write: false,
            wireframe: false,
        },
    }
}
