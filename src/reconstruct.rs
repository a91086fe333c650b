//! Border-band inpainting for the watermark rectangle.
//!
//! The Gemini logo is small and sits on otherwise continuous content, so the
//! region underneath is rebuilt from the ring of pixels around it:
//!
//! 1. **Edge profiles**: for every row (left/right sides) and column
//!    (top/bottom sides) the border band is collapsed into one sample, with
//!    weights decaying away from the rectangle edge.
//! 2. **Fill**: each interior pixel is an inverse-distance blend of the four
//!    edge samples it lines up with. On smooth backgrounds the nearest edge
//!    sample is copied instead, which avoids a hazy averaged patch.
//! 3. **Feathering**: pixels next to the rectangle edge are pulled toward the
//!    adjacent border sample so no seam is visible.
//!
//! Only pixels inside the rectangle are written.

use image::{Rgba, RgbaImage};
use serde::Serialize;

use crate::region::Rectangle;

/// Tunable parameters for region reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructOptions {
    /// Thickness in pixels of the border band sampled on each side.
    pub band: u32,
    /// Number of pixels next to each edge that are feathered.
    pub feather: u32,
    /// Band luma standard deviation (0-255 scale) below which the background
    /// is treated as smooth and filled by directional copy.
    pub smooth_threshold: f32,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            band: 6,
            feather: 2,
            smooth_threshold: 2.0,
        }
    }
}

/// Quality signal for a reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quality {
    /// A full border band was available on all four sides.
    Full,
    /// Part of the band fell outside the image; the fill used mirrored or
    /// fewer sides.
    Degraded,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// One collapsed band sample per row or column along a side.
struct EdgeProfile {
    samples: Vec<[f32; 4]>,
    partial: bool,
}

/// Running luma statistics over every band pixel read.
#[derive(Default)]
struct BandStats {
    count: f64,
    sum: f64,
    sum_sq: f64,
}

impl BandStats {
    fn push(&mut self, px: &Rgba<u8>) {
        let lum = 0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2]);
        self.count += 1.0;
        self.sum += lum;
        self.sum_sq += lum * lum;
    }

    fn stddev(&self) -> f64 {
        if self.count < 1.0 {
            return 0.0;
        }
        let mean = self.sum / self.count;
        (self.sum_sq / self.count - mean * mean).max(0.0).sqrt()
    }
}

/// Mirror an offset into `0..len` without repeating the edge pixel.
fn reflect101(offset: u32, len: u32) -> u32 {
    debug_assert!(len > 0);
    if len == 1 {
        return 0;
    }
    let period = 2 * len - 2;
    let r = offset % period;
    if r < len {
        r
    } else {
        period - r
    }
}

fn edge_profile(
    image: &RgbaImage,
    rect: &Rectangle,
    side: Side,
    band: u32,
    stats: &mut BandStats,
) -> Option<EdgeProfile> {
    let (img_w, img_h) = image.dimensions();
    let available = match side {
        Side::Left => rect.x,
        Side::Right => img_w - rect.right(),
        Side::Top => rect.y,
        Side::Bottom => img_h - rect.bottom(),
    };
    if available == 0 {
        return None;
    }

    let depth = band.min(available);
    let len = match side {
        Side::Left | Side::Right => rect.height,
        Side::Top | Side::Bottom => rect.width,
    };

    let mut samples = Vec::with_capacity(len as usize);
    for i in 0..len {
        let mut acc = [0.0_f32; 4];
        let mut total = 0.0_f32;

        for k in 0..band {
            let offset = reflect101(k, depth);
            let (px, py) = match side {
                Side::Left => (rect.x - 1 - offset, rect.y + i),
                Side::Right => (rect.right() + offset, rect.y + i),
                Side::Top => (rect.x + i, rect.y - 1 - offset),
                Side::Bottom => (rect.x + i, rect.bottom() + offset),
            };
            let p = image.get_pixel(px, py);
            if k < depth {
                stats.push(p);
            }

            #[allow(clippy::cast_precision_loss)]
            let weight = 1.0 / (k as f32 + 1.0);
            for (a, &v) in acc.iter_mut().zip(p.0.iter()) {
                *a += weight * f32::from(v);
            }
            total += weight;
        }

        samples.push(acc.map(|v| v / total));
    }

    Some(EdgeProfile {
        samples,
        partial: depth < band,
    })
}

/// Intersect a rectangle with the image bounds.
fn clip(rect: Rectangle, width: u32, height: u32) -> Option<Rectangle> {
    if rect.x >= width || rect.y >= height {
        return None;
    }
    let x2 = rect.right().min(width);
    let y2 = rect.bottom().min(height);
    if rect.x >= x2 || rect.y >= y2 {
        return None;
    }
    Some(Rectangle {
        x: rect.x,
        y: rect.y,
        width: x2 - rect.x,
        height: y2 - rect.y,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixel(value: [f32; 4]) -> Rgba<u8> {
    Rgba(value.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

/// Rebuild the content of `rect` in place from its surrounding border band.
///
/// Pixels outside `rect` are never written. A rectangle partly outside the
/// image is clipped first. Never fails: when the band is cut off by the image
/// edge the result is [`Quality::Degraded`], and when no side has any pixels
/// the region is left untouched.
pub fn reconstruct(image: &mut RgbaImage, rect: Rectangle, opts: &ReconstructOptions) -> Quality {
    let Some(rect) = clip(rect, image.width(), image.height()) else {
        return Quality::Degraded;
    };
    // A band deeper than the image only repeats mirrored pixels.
    let band = opts.band.clamp(1, image.width().max(image.height()));

    let mut stats = BandStats::default();
    let left = edge_profile(image, &rect, Side::Left, band, &mut stats);
    let right = edge_profile(image, &rect, Side::Right, band, &mut stats);
    let top = edge_profile(image, &rect, Side::Top, band, &mut stats);
    let bottom = edge_profile(image, &rect, Side::Bottom, band, &mut stats);

    let profiles = [&left, &right, &top, &bottom];
    if profiles.iter().all(|p| p.is_none()) {
        tracing::warn!(?rect, "no border pixels around region, leaving it untouched");
        return Quality::Degraded;
    }
    let quality = if profiles
        .iter()
        .all(|p| matches!(p, Some(profile) if !profile.partial))
    {
        Quality::Full
    } else {
        Quality::Degraded
    };

    let smooth = stats.stddev() < f64::from(opts.smooth_threshold);
    tracing::debug!(
        ?rect,
        ?quality,
        smooth,
        band_stddev = stats.stddev(),
        "reconstructing region"
    );

    #[allow(clippy::cast_precision_loss)]
    let feather_span = opts.feather as f32 + 1.0;
    let (w, h) = (rect.width, rect.height);

    for j in 0..h {
        for i in 0..w {
            // (profile, 1-based distance from that edge, index along the edge)
            let sides = [
                (&left, i + 1, j),
                (&right, w - i, j),
                (&top, j + 1, i),
                (&bottom, h - j, i),
            ];

            let mut acc = [0.0_f32; 4];
            let mut total = 0.0_f32;
            let mut nearest: Option<(u32, [f32; 4])> = None;

            for (profile, dist, idx) in sides {
                let Some(profile) = profile else { continue };
                let sample = profile.samples[idx as usize];

                #[allow(clippy::cast_precision_loss)]
                let weight = 1.0 / dist as f32;
                for (a, s) in acc.iter_mut().zip(sample) {
                    *a += weight * s;
                }
                total += weight;

                if nearest.is_none_or(|(d, _)| dist < d) {
                    nearest = Some((dist, sample));
                }
            }

            let Some((edge_dist, edge_sample)) = nearest else {
                continue;
            };

            let value = if smooth {
                edge_sample
            } else {
                let blended = acc.map(|v| v / total);
                if edge_dist <= opts.feather {
                    #[allow(clippy::cast_precision_loss)]
                    let a = edge_dist as f32 / feather_span;
                    std::array::from_fn(|c| a * blended[c] + (1.0 - a) * edge_sample[c])
                } else {
                    blended
                }
            };

            image.put_pixel(rect.x + i, rect.y + j, to_pixel(value));
        }
    }

    quality
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: u32, y: u32, width: u32, height: u32) -> Rectangle {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    fn stamp(image: &mut RgbaImage, r: Rectangle) {
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
    }

    fn textured(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = ((x * 37 + y * 91) % 251) as u8;
            Rgba([v, v.wrapping_mul(3), 255 - v, 255])
        })
    }

    #[test]
    fn reflect101_mirrors_without_repeating_edge() {
        assert_eq!(reflect101(0, 1), 0);
        assert_eq!(reflect101(5, 1), 0);
        let seq: Vec<u32> = (0..8).map(|k| reflect101(k, 3)).collect();
        assert_eq!(seq, vec![0, 1, 2, 1, 0, 1, 2, 1]);
        assert_eq!(reflect101(4, 6), 4);
    }

    #[test]
    fn uniform_background_is_restored_exactly() {
        let bg = Rgba([30, 120, 200, 255]);
        let mut img = RgbaImage::from_pixel(64, 64, bg);
        let r = rect(40, 44, 12, 10);
        stamp(&mut img, r);

        let quality = reconstruct(&mut img, r, &ReconstructOptions::default());

        assert_eq!(quality, Quality::Full);
        for px in img.pixels() {
            assert_eq!(*px, bg);
        }
    }

    #[test]
    fn gradient_background_is_approximated() {
        let truth = RgbaImage::from_fn(64, 64, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (2 * x + 20) as u8;
            Rgba([v, v, v, 255])
        });
        let mut img = truth.clone();
        let r = rect(24, 24, 16, 16);
        stamp(&mut img, r);

        reconstruct(&mut img, r, &ReconstructOptions::default());

        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                let got = i32::from(img.get_pixel(x, y)[0]);
                let want = i32::from(truth.get_pixel(x, y)[0]);
                assert!(
                    (got - want).abs() < 10,
                    "({x},{y}) got {got}, want {want}"
                );
            }
        }
    }

    #[test]
    fn pixels_outside_region_are_untouched() {
        let original = textured(50, 40);
        let mut img = original.clone();
        let r = rect(30, 20, 15, 12);

        reconstruct(&mut img, r, &ReconstructOptions::default());

        for (x, y, px) in img.enumerate_pixels() {
            if !r.contains(x, y) {
                assert_eq!(px, original.get_pixel(x, y), "({x},{y}) changed");
            }
        }
    }

    #[test]
    fn region_flush_with_corner_is_degraded_but_filled() {
        let bg = Rgba([90, 90, 90, 255]);
        let mut img = RgbaImage::from_pixel(20, 20, bg);
        let r = rect(14, 14, 6, 6);
        stamp(&mut img, r);

        let quality = reconstruct(&mut img, r, &ReconstructOptions::default());

        assert_eq!(quality, Quality::Degraded);
        assert_eq!(*img.get_pixel(19, 19), bg);
    }

    #[test]
    fn thin_band_uses_mirrored_samples() {
        let bg = Rgba([10, 20, 30, 40]);
        let mut img = RgbaImage::from_pixel(30, 30, bg);
        let r = rect(2, 2, 10, 10);
        stamp(&mut img, r);

        let quality = reconstruct(&mut img, r, &ReconstructOptions::default());

        assert_eq!(quality, Quality::Degraded);
        assert_eq!(*img.get_pixel(6, 6), bg);
    }

    #[test]
    fn region_covering_whole_image_is_left_untouched() {
        let original = textured(4, 4);
        let mut img = original.clone();

        let quality = reconstruct(&mut img, rect(0, 0, 4, 4), &ReconstructOptions::default());

        assert_eq!(quality, Quality::Degraded);
        assert_eq!(img, original);
    }

    #[test]
    fn region_past_image_edge_is_clipped() {
        let original = textured(10, 10);
        let mut img = original.clone();

        let quality = reconstruct(&mut img, rect(8, 8, 10, 10), &ReconstructOptions::default());
        assert_eq!(quality, Quality::Degraded);

        let quality = reconstruct(&mut img, rect(12, 12, 2, 2), &ReconstructOptions::default());
        assert_eq!(quality, Quality::Degraded);
        assert_eq!(img.get_pixel(0, 0), original.get_pixel(0, 0));
    }

    #[test]
    fn far_out_of_bounds_region_is_ignored() {
        let original = textured(10, 10);
        let mut img = original.clone();

        let quality = reconstruct(
            &mut img,
            rect(u32::MAX - 1, 0, 10, 1),
            &ReconstructOptions::default(),
        );

        assert_eq!(quality, Quality::Degraded);
        assert_eq!(img, original);
    }

    #[test]
    fn oversized_band_is_capped_to_image() {
        let bg = Rgba([70, 80, 90, 255]);
        let mut img = RgbaImage::from_pixel(64, 64, bg);
        let r = rect(40, 40, 12, 12);
        stamp(&mut img, r);

        let quality = reconstruct(
            &mut img,
            r,
            &ReconstructOptions {
                band: u32::MAX,
                ..ReconstructOptions::default()
            },
        );

        assert_eq!(quality, Quality::Degraded);
        assert!(img.pixels().all(|px| *px == bg));
    }

    /// Left half `left`, right half `right`, in a 60x40 gray image.
    fn split(left: u8, right: u8) -> RgbaImage {
        RgbaImage::from_fn(60, 40, |x, _| {
            let v = if x < 30 { left } else { right };
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn smooth_band_copies_nearest_side() {
        // Band luma stddev is 1.5, under the default threshold.
        let r = rect(20, 10, 20, 20);
        let mut copied = split(100, 103);
        stamp(&mut copied, r);
        let mut blended = copied.clone();

        reconstruct(&mut copied, r, &ReconstructOptions::default());
        reconstruct(
            &mut blended,
            r,
            &ReconstructOptions {
                smooth_threshold: 0.0,
                ..ReconstructOptions::default()
            },
        );

        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                let v = copied.get_pixel(x, y)[0];
                assert!(v == 100 || v == 103, "({x},{y}) mixed to {v}");
            }
        }

        // Equidistant from the left (100) and bottom (100) edges, eleven
        // pixels from the right (103): copy keeps 100, the blend gives
        // 100 + 3 * (1/11) / (2/10 + 2/11) = 100.71.
        assert_eq!(copied.get_pixel(29, 20)[0], 100);
        assert_eq!(blended.get_pixel(29, 20)[0], 101);
    }

    #[test]
    fn feathering_pulls_edge_pixels_toward_border() {
        // Left half dark, right half bright: the blend alone would put the
        // first column well above the dark border.
        let mut img = RgbaImage::from_fn(60, 30, |x, _| {
            if x < 30 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([240, 240, 240, 255])
            }
        });
        let r = rect(20, 10, 20, 10);
        let mut plain = img.clone();

        reconstruct(&mut img, r, &ReconstructOptions::default());
        reconstruct(
            &mut plain,
            r,
            &ReconstructOptions {
                feather: 0,
                ..ReconstructOptions::default()
            },
        );

        // At (20,15) the left, top and bottom samples are 0 and the right
        // one is 240, at edge distances 1, 6, 5 and 20.
        let blend = 240.0 / 20.0 / (1.0 + 1.0 / 20.0 + 1.0 / 6.0 + 1.0 / 5.0);
        let expected = (blend / 3.0_f32).round();

        let feathered = img.get_pixel(20, 15)[0];
        let unfeathered = plain.get_pixel(20, 15)[0];
        assert!(feathered < unfeathered, "{feathered} >= {unfeathered}");
        assert_eq!(f32::from(feathered), expected);
        assert_eq!(f32::from(unfeathered), blend.round());
    }
}
