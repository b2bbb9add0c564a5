//! Radiance mip-chain scheduling
//!
//! Each mip below the base gets a glossiness derived from its level, which
//! maps to a cosine-power exponent through the gloss scale/bias pair and the
//! lighting model. The exponent fixes the lobe's effective angular support,
//! and the support fixes the footprint half-width handed to the kernel.

use crate::cubemap::{mip_extent, Image};
use crate::error::{Error, Result};
use crate::face::CubeFace;
use crate::kernel::{FilterSource, MipFilter};
use crate::queue::{Capability, FilterJob, FilterTask, TaskKind, TaskList};
use crate::tap_table::{EdgeFixup, TapTable};
use crate::worker::{run_pool, FilterProgress};
use glam::Vec4;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Cosine value the lobe must fall to before samples stop contributing
const LOBE_CUTOFF: f32 = 0.000_001;

/// Footprint half-width per radian of lobe support, in normalised face units
///
/// One face unit spans the least angle near a cube corner, where a cone of
/// half-angle `a` reaches up to `sqrt(3/2)·a` along either face axis.
const FOOTPRINT_PER_RADIAN: f32 = 1.25;

/// Relation between gloss-derived exponent and the lobe the kernel applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingModel {
    Phong,
    PhongBrdf,
    Blinn,
    #[default]
    BlinnBrdf,
}

impl LightingModel {
    /// Convert a gloss-derived exponent into the filter lobe exponent
    pub fn apply(self, specular_power: f32) -> f32 {
        match self {
            LightingModel::Phong => specular_power,
            LightingModel::PhongBrdf => specular_power + 1.0,
            LightingModel::Blinn => specular_power / 4.0,
            LightingModel::BlinnBrdf => specular_power / 4.0 + 1.0,
        }
    }
}

impl FromStr for LightingModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "phong" => Ok(LightingModel::Phong),
            "phong_brdf" | "phongbrdf" => Ok(LightingModel::PhongBrdf),
            "blinn" => Ok(LightingModel::Blinn),
            "blinn_brdf" | "blinnbrdf" => Ok(LightingModel::BlinnBrdf),
            other => Err(format!(
                "unknown lighting model '{other}' (expected phong, phong-brdf, blinn or blinn-brdf)"
            )),
        }
    }
}

impl fmt::Display for LightingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LightingModel::Phong => "phong",
            LightingModel::PhongBrdf => "phong-brdf",
            LightingModel::Blinn => "blinn",
            LightingModel::BlinnBrdf => "blinn-brdf",
        })
    }
}

/// Options for a radiance mip-chain filter run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadianceOptions {
    /// Face size of the base destination mip
    pub face_size: u32,
    pub lighting_model: LightingModel,
    /// Filter the base mip too instead of resampling the source into it
    pub exclude_base: bool,
    /// Requested mip count; clamped to the chain the face size allows
    pub mip_count: u32,
    pub gloss_scale: f32,
    pub gloss_bias: f32,
    pub edge_fixup: EdgeFixup,
    /// Worker threads, clamped to [0, 64]; 0 runs on the calling thread
    pub thread_count: u32,
}

impl Default for RadianceOptions {
    fn default() -> Self {
        Self {
            face_size: 256,
            lighting_model: LightingModel::BlinnBrdf,
            exclude_base: false,
            mip_count: 7,
            gloss_scale: 10.0,
            gloss_bias: 3.0,
            edge_fixup: EdgeFixup::None,
            thread_count: 4,
        }
    }
}

impl RadianceOptions {
    /// Parse from RON; missing fields keep their defaults
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn from_ron_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }
}

/// Clamp a requested mip count to `[1, log2(face_size) + 1]`
pub fn clamp_mip_count(requested: u32, face_size: u32) -> u32 {
    let max = face_size.max(1).ilog2() + 1;
    requested.clamp(1, max)
}

/// Gloss-derived exponent for a mip level
pub fn specular_power_for(mip: u32, mip_count: u32, gloss_scale: f32, gloss_bias: f32) -> f32 {
    let glossiness = (1.0 - mip as f32 / (mip_count as f32 - 1.000_000_1)).max(0.0);
    2.0_f32.powf(gloss_scale * glossiness + gloss_bias)
}

/// Angle at which `cos(angle)^power` drops below the cutoff
pub fn cosine_power_filter_angle(specular_power: f32) -> f32 {
    LOBE_CUTOFF.powf(1.0 / specular_power).acos()
}

impl MipFilter {
    /// Parameters for `mip` of a chain whose base face is `base_face_size`
    pub fn for_mip(
        mip: u32,
        mip_count: u32,
        base_face_size: u32,
        options: &RadianceOptions,
    ) -> Self {
        let min_angle = 1.0_f32.atan2(base_face_size as f32);

        let raw_power = specular_power_for(mip, mip_count, options.gloss_scale, options.gloss_bias);
        let specular_power = options.lighting_model.apply(raw_power);
        let filter_angle = cosine_power_filter_angle(specular_power).clamp(min_angle, FRAC_PI_2);
        let cos_threshold = filter_angle.cos().max(0.0);
        let texel_size = 1.0 / mip_extent(base_face_size, mip) as f32;
        let filter_size = texel_size.max(filter_angle * FOOTPRINT_PER_RADIAN);

        Self {
            specular_power,
            filter_angle,
            filter_size,
            cos_threshold,
        }
    }
}

/// Task grid for a mip chain over the given destination surfaces
fn build_tasks<'a>(
    surfaces: Vec<[Option<&'a mut [Vec4]>; 6]>,
    face_size: u32,
    options: &RadianceOptions,
) -> Vec<[Option<FilterJob<'a>>; 6]> {
    let mip_count = surfaces.len() as u32;

    surfaces
        .into_iter()
        .enumerate()
        .map(|(mip, slots)| {
            let mip = mip as u32;
            let kind = if mip == 0 && !options.exclude_base {
                TaskKind::Downsample
            } else {
                let params = MipFilter::for_mip(mip, mip_count, face_size, options);
                tracing::debug!(
                    mip,
                    specular_power = params.specular_power,
                    filter_angle_deg = params.filter_angle.to_degrees(),
                    filter_size = params.filter_size,
                    "mip filter"
                );
                TaskKind::Radiance(params)
            };
            let capability = match kind {
                TaskKind::Downsample => Capability::CpuOnly,
                TaskKind::Radiance(_) => Capability::Any,
            };

            let mut jobs: [Option<FilterJob<'a>>; 6] = Default::default();
            for (face, slot) in CubeFace::ALL.into_iter().zip(slots) {
                jobs[face.index()] = slot.map(|dst| FilterJob {
                    task: FilterTask {
                        mip,
                        face,
                        face_size: mip_extent(face_size, mip),
                        kind,
                        capability,
                    },
                    dst,
                });
            }
            jobs
        })
        .collect()
}

/// Replace the six texels of a 1×1 last mip with their average
///
/// Returns whether the last mip was 1×1.
pub fn average_unit_mip(image: &mut Image) -> bool {
    let last = image.mip_count() - 1;
    if image.mip_face_size(last) != 1 || !image.is_cubemap() {
        return false;
    }

    let sum: Vec4 = CubeFace::ALL
        .iter()
        .map(|&face| image.texel(face, last, 0, 0))
        .sum();
    let average = sum / 6.0;
    for face in CubeFace::ALL {
        image.face_mut(face, last)[0] = average;
    }
    true
}

/// Radiance mip chain of `src`, one cosine-power lobe per mip
pub fn compute_radiance(src: &Image, options: &RadianceOptions) -> Result<Image> {
    src.ensure_cubemap()?;
    if options.face_size == 0 {
        return Err(Error::InvalidFaceSize(options.face_size));
    }

    let face_size = options.face_size;
    let mip_count = clamp_mip_count(options.mip_count, face_size);
    tracing::info!(
        src_face_size = src.face_size(),
        face_size,
        mip_count,
        lighting_model = %options.lighting_model,
        edge_fixup = %options.edge_fixup,
        threads = options.thread_count,
        "Radiance filter started"
    );

    let taps = TapTable::build(src.face_size(), EdgeFixup::None);
    let source = FilterSource::new(src, &taps, options.edge_fixup);
    let mut output = Image::new_cubemap(face_size, mip_count)?;

    let total = mip_count as usize * 6;
    let progress = FilterProgress::new(total);
    {
        let tasks = build_tasks(output.surfaces_mut(), face_size, options);
        let queue = TaskList::new(tasks);
        run_pool(&queue, &source, options.thread_count, &progress);
    }

    let counters = progress.snapshot();
    debug_assert_eq!(counters.completed(), total);
    if average_unit_mip(&mut output) {
        tracing::debug!("averaged 1x1 mip across faces");
    }

    tracing::info!(
        tasks = counters.completed(),
        elapsed_ms = progress.elapsed().as_millis() as u64,
        "Radiance filter complete"
    );
    Ok(output)
}
