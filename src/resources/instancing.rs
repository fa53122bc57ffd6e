//! Procedural asteroid ring placement.
//!
//! Every instance keeps a seed (drift speed, displacement, scale, rotation)
//! that survives regeneration. Seeds are drawn again only when the instance
//! count or the displacement offset changes; otherwise each call to
//! [`InstanceField::update`] just advances every instance's phase.

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceParams {
    pub count: u32,
    /// Radius of the ring.
    pub radius: f32,
    /// Maximum displacement from the ring on each axis.
    pub offset: f32,
}

impl Default for InstanceParams {
    fn default() -> Self {
        Self {
            count: 500,
            radius: 15.0,
            offset: 5.0,
        }
    }
}

/// Per-instance values persisted across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceSeed {
    /// Accumulated angular phase in degrees.
    pub phase: f32,
    /// Degrees added to `phase` per update.
    pub drift: f32,
    pub displacement: Vec3,
    pub scale: f32,
    /// Rotation about X in degrees.
    pub rotation: f32,
}

pub struct InstanceField {
    rng: StdRng,
    seeds: Vec<InstanceSeed>,
    seeded_with: Option<(u32, f32)>,
    matrices: Vec<Mat4>,
}

impl InstanceField {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seeds: Vec::new(),
            seeded_with: None,
            matrices: Vec::new(),
        }
    }

    #[must_use]
    pub fn seeds(&self) -> &[InstanceSeed] {
        &self.seeds
    }

    #[must_use]
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Advances one frame and returns the model matrices.
    pub fn update(&mut self, params: &InstanceParams) -> &[Mat4] {
        let key = (params.count, params.offset);
        if self.seeded_with != Some(key) {
            self.reseed(params);
            self.seeded_with = Some(key);
        }

        let count = params.count.max(1) as f32;
        self.matrices.clear();
        for (i, seed) in self.seeds.iter_mut().enumerate() {
            seed.phase += seed.drift;
            let angle = (i as f32 / count * 360.0 + seed.phase).to_radians();
            let (sin, cos) = angle.sin_cos();
            let position = Vec3::new(
                sin * params.radius + seed.displacement.x,
                seed.displacement.y * 0.4,
                cos * params.radius + seed.displacement.z,
            );
            self.matrices.push(
                Mat4::from_translation(position)
                    * Mat4::from_scale(Vec3::splat(seed.scale))
                    * Mat4::from_rotation_x(seed.rotation.to_radians()),
            );
        }
        &self.matrices
    }

    fn reseed(&mut self, params: &InstanceParams) {
        let span = ((params.offset * 100.0) as u32).max(1);
        let rng = &mut self.rng;
        self.seeds = (0..params.count)
            .map(|_| InstanceSeed {
                phase: 0.0,
                drift: rng.random_range(0..100u32) as f32 / 10_000.0,
                displacement: Vec3::new(
                    displace(rng, span, params.offset),
                    displace(rng, span, params.offset),
                    displace(rng, span, params.offset),
                ),
                scale: rng.random_range(0..20u32) as f32 / 100.0 + 0.05,
                rotation: rng.random_range(0..360u32) as f32,
            })
            .collect();
        log::debug!("Reseeded {} instances (offset {})", params.count, params.offset);
    }
}

fn displace(rng: &mut StdRng, span: u32, offset: f32) -> f32 {
    rng.random_range(0..span) as f32 / 100.0 - offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_within_documented_ranges() {
        let mut field = InstanceField::new(7);
        field.update(&InstanceParams::default());
        for seed in field.seeds() {
            assert!((0.05..0.25).contains(&seed.scale));
            assert!((0.0..360.0).contains(&seed.rotation));
            assert!(seed.displacement.abs().max_element() <= 5.0);
            assert!((0.0..0.01).contains(&seed.drift));
        }
    }

    #[test]
    fn changing_offset_reseeds() {
        let mut field = InstanceField::new(7);
        let mut params = InstanceParams::default();
        field.update(&params);
        let before = field.seeds()[0];
        params.offset = 1.0;
        field.update(&params);
        assert_eq!(field.seeds()[0].phase, field.seeds()[0].drift);
        assert!(field.seeds()[0].displacement.abs().max_element() <= 1.0);
        assert_ne!(field.seeds()[0], before);
    }
}
