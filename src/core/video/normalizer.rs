//! ROI 预处理：裁剪 → 灰度 → 锐化 → Otsu 二值化
//!
//! Produces the binary image handed to the recognizer. Digits and background
//! end up as 255 / 0 depending on which side of the Otsu threshold they fall.

use image::GrayImage;
use rayon::prelude::*;

use super::frame::{Frame, Roi};

/// 3x3 sharpening kernel, row-major.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// Full normalization chain. Always returns an image of the ROI's size.
///
/// The ROI must already have been checked against the frame dimensions.
pub fn normalize_region(frame: &Frame, roi: &Roi) -> GrayImage {
    let gray = crop_to_gray(frame, roi);
    let sharp = sharpen(&gray, roi.width, roi.height);
    let threshold = otsu_threshold(&sharp);
    let binary = binarize(&sharp, threshold);

    // Buffer length equals width * height by construction.
    GrayImage::from_raw(roi.width, roi.height, binary)
        .unwrap_or_else(|| GrayImage::new(roi.width, roi.height))
}

/// Crop and convert to luma in one pass.
pub fn crop_to_gray(frame: &Frame, roi: &Roi) -> Vec<u8> {
    let mut gray = Vec::with_capacity((roi.width * roi.height) as usize);

    for y in roi.y..roi.y + roi.height {
        for x in roi.x..roi.x + roi.width {
            let [r, g, b] = frame.rgb_at(x, y).map(u32::from);
            gray.push(((r * 299 + g * 587 + b * 114) / 1000) as u8);
        }
    }

    gray
}

/// Reflect-101 border index (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

pub fn sharpen(gray: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut out = vec![0u8; w * h];
    if w == 0 || h == 0 {
        return out;
    }

    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
            let mut acc = 0i32;
            for (ky, kernel_row) in SHARPEN_KERNEL.iter().enumerate() {
                let sy = reflect_101(y as isize + ky as isize - 1, h);
                for (kx, &weight) in kernel_row.iter().enumerate() {
                    if weight == 0 {
                        continue;
                    }
                    let sx = reflect_101(x as isize + kx as isize - 1, w);
                    acc += weight * gray[sy * w + sx] as i32;
                }
            }
            *px = acc.clamp(0, 255) as u8;
        }
    });

    out
}

/// Otsu's method: the threshold maximizing between-class variance.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut hist = [0u64; 256];
    for &v in gray {
        hist[v as usize] += 1;
    }

    let total = gray.len() as f64;
    if total == 0.0 {
        return 0;
    }

    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_threshold = 0u8;

    for (t, &count) in hist.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }

        sum_bg += t as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;

        let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if between > best_variance {
            best_variance = between;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

pub fn binarize(gray: &[u8], threshold: u8) -> Vec<u8> {
    gray.iter()
        .map(|&v| if v > threshold { 255 } else { 0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dark frame with a bright vertical bar in the middle of the ROI.
    fn bar_frame() -> Frame {
        let (w, h) = (40u32, 20u32);
        let mut frame = Frame::filled(w, h, [20, 20, 20], 0);
        for y in 5..15 {
            for x in 18..22 {
                let idx = ((y * w + x) * 3) as usize;
                frame.data[idx..idx + 3].copy_from_slice(&[230, 230, 230]);
            }
        }
        frame
    }

    #[test]
    fn test_output_has_roi_dimensions() {
        let frame = bar_frame();
        let roi = Roi::new(10, 2, 20, 16);
        let img = normalize_region(&frame, &roi);

        assert_eq!(img.width(), 20);
        assert_eq!(img.height(), 16);
        assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_bar_is_separated_from_background() {
        let frame = bar_frame();
        let roi = Roi::new(10, 2, 20, 16);
        let img = normalize_region(&frame, &roi);

        // bar center (x=20, y=10) in frame coordinates
        assert_eq!(img.get_pixel(10, 8).0[0], 255);
        // background corner
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_gray_weights() {
        let frame = Frame::filled(2, 2, [255, 0, 0], 0);
        let gray = crop_to_gray(&frame, &Roi::new(0, 0, 2, 2));
        assert_eq!(gray, vec![76; 4]);
    }

    #[test]
    fn test_sharpen_uniform_is_identity() {
        let gray = vec![100u8; 5 * 4];
        assert_eq!(sharpen(&gray, 5, 4), gray);
    }

    #[test]
    fn test_sharpen_saturates() {
        // single bright pixel: center 5*200 - 0 saturates to 255, neighbours go negative -> 0
        let mut gray = vec![0u8; 9];
        gray[4] = 200;
        let out = sharpen(&gray, 3, 3);
        assert_eq!(out[4], 255);
        assert_eq!(out[1], 0);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
    }

    #[test]
    fn test_otsu_bimodal() {
        let mut gray = vec![30u8; 50];
        gray.extend(vec![200u8; 50]);
        let t = otsu_threshold(&gray);
        assert!((30..200).contains(&t));

        let bin = binarize(&gray, t);
        assert_eq!(bin[0], 0);
        assert_eq!(bin[99], 255);
    }

    #[test]
    fn test_otsu_uniform() {
        let gray = vec![128u8; 16];
        assert_eq!(otsu_threshold(&gray), 0);
        assert!(binarize(&gray, 0).iter().all(|&v| v == 255));
    }
}
