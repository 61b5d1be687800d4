use std::fmt::{self, Debug};

use log::info;
#[cfg(test)]
use mockall::automock;
use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::config::SceneConfig;

const HASH_BYTES: usize = 8;
const DCT_SIZE: usize = 32;
const LOW_FREQ: usize = 8;

/// Opaque fixed-size frame fingerprint.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageHash(pub [u8; HASH_BYTES]);

impl ImageHash {
    #[inline]
    pub fn from_u64(v: u64) -> Self {
        Self(v.to_be_bytes())
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    #[inline]
    pub fn hamming(&self, other: &ImageHash) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

impl Debug for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHash({:016x})", self.as_u64())
    }
}

/// Fingerprints frames and compares fingerprints.
#[cfg_attr(test, automock)]
pub trait PerceptualHasher: Debug {
    fn hash(&self, frame: &Array2<u8>) -> ImageHash;

    fn distance(&self, a: &ImageHash, b: &ImageHash) -> u32;
}

/// DCT based perceptual hash over a grayscale frame.
#[derive(Debug, Clone)]
pub struct DctHasher {
    basis: Array2<f64>,
}

impl DctHasher {
    pub fn new() -> Self {
        let n = DCT_SIZE as f64;
        let basis = Array2::from_shape_fn((DCT_SIZE, DCT_SIZE), |(u, x)| {
            let scale = if u == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            scale * ((2.0 * x as f64 + 1.0) * u as f64 * std::f64::consts::PI / (2.0 * n)).cos()
        });

        Self { basis }
    }

    /// Area-average downscale to `DCT_SIZE` x `DCT_SIZE`.
    fn shrink(frame: ArrayView2<'_, u8>) -> Array2<f64> {
        let (h, w) = frame.dim();

        Array2::from_shape_fn((DCT_SIZE, DCT_SIZE), |(i, j)| {
            let r0 = i * h / DCT_SIZE;
            let r1 = ((i + 1) * h / DCT_SIZE).max(r0 + 1).min(h);
            let c0 = j * w / DCT_SIZE;
            let c1 = ((j + 1) * w / DCT_SIZE).max(c0 + 1).min(w);

            let cell = frame.slice(s![r0..r1, c0..c1]);
            let count = cell.len().max(1) as f64;

            cell.iter().map(|&v| v as f64).sum::<f64>() / count
        })
    }
}

impl Default for DctHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PerceptualHasher for DctHasher {
    fn hash(&self, frame: &Array2<u8>) -> ImageHash {
        if frame.is_empty() {
            return ImageHash::default();
        }

        let small = Self::shrink(frame.view());
        let dct = self.basis.dot(&small).dot(&self.basis.t());

        let mut block = dct.slice(s![..LOW_FREQ, ..LOW_FREQ]).to_owned();

        // DC term carries brightness only
        block[(0, 0)] = 0.0;
        let mean = block.sum() / block.len() as f64;

        let mut bytes = [0u8; HASH_BYTES];
        for (idx, v) in block.iter().enumerate() {
            if *v > mean {
                bytes[idx / 8] |= 1 << (idx % 8);
            }
        }

        ImageHash(bytes)
    }

    fn distance(&self, a: &ImageHash, b: &ImageHash) -> u32 {
        a.hamming(b)
    }
}

/// Flags camera cuts by comparing consecutive frame hashes.
#[derive(Debug, Clone)]
pub struct SceneChangeDetector {
    threshold: u32,
    previous: Option<ImageHash>,
}

impl SceneChangeDetector {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            threshold: config.change_threshold,
            previous: None,
        }
    }

    #[inline]
    pub fn previous(&self) -> Option<&ImageHash> {
        self.previous.as_ref()
    }

    /// Stores `current` and reports whether it differs from the previous
    /// hash by more than the threshold. The first frame never does.
    pub fn update<H>(&mut self, hasher: &H, current: ImageHash) -> bool
    where
        H: PerceptualHasher + ?Sized,
    {
        let changed = match &self.previous {
            Some(prev) => {
                let dist = hasher.distance(prev, &current);
                if dist > self.threshold {
                    info!(target: "phash", "scene changed, hash distance {dist}");
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        self.previous = Some(current);
        changed
    }
}

impl Default for SceneChangeDetector {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}
