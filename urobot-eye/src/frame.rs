//! Frame decoding and reduction
//!
//! Raw YUYV bytes are unpacked into a 4:2:2 YCbCr image, rendered to RGB at full
//! resolution, reduced with nearest-neighbour sampling and finally rendered to gray.
//! Gray levels use Rec. 601 luma weights computed at 16-bit precision.

use crate::error::VisionError;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use urobot_core::Measurement;

/// YCbCr image with horizontally subsampled chroma (one Cb/Cr pair per two pixels).
#[derive(Debug, Clone, PartialEq)]
pub struct YCbCr422 {
    pub width: u32,
    pub height: u32,
    pub y: Vec<u8>,
    pub cb: Vec<u8>,
    pub cr: Vec<u8>,
}

impl YCbCr422 {
    /// Unpacks a `Y0 Cb Y1 Cr` byte stream.
    pub fn from_yuyv(raw: &[u8], width: u32, height: u32) -> Result<Self, VisionError> {
        if width == 0 || height == 0 {
            return Err(VisionError::BadFrame("zero-sized frame".to_string()));
        }
        if width % 2 != 0 {
            return Err(VisionError::Format(format!(
                "YUYV width must be even, got {}",
                width
            )));
        }
        let pixels = width as usize * height as usize;
        let needed = pixels * 2;
        if raw.len() < needed {
            return Err(VisionError::BadFrame(format!(
                "frame holds {} bytes, expected {}",
                raw.len(),
                needed
            )));
        }

        let pairs = pixels / 2;
        let mut y = vec![0u8; pixels];
        let mut cb = vec![0u8; pairs];
        let mut cr = vec![0u8; pairs];
        for (i, quad) in raw[..needed].chunks_exact(4).enumerate() {
            y[i * 2] = quad[0];
            cb[i] = quad[1];
            y[i * 2 + 1] = quad[2];
            cr[i] = quad[3];
        }
        Ok(Self {
            width,
            height,
            y,
            cb,
            cr,
        })
    }

    pub fn to_rgb(&self) -> RgbImage {
        let chroma_stride = (self.width / 2) as usize;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let yi = y as usize * self.width as usize + x as usize;
            let ci = y as usize * chroma_stride + (x / 2) as usize;
            Rgb(ycbcr_to_rgb(self.y[yi], self.cb[ci], self.cr[ci]))
        })
    }

    pub fn to_gray(&self) -> GrayImage {
        let chroma_stride = (self.width / 2) as usize;
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let yi = y as usize * self.width as usize + x as usize;
            let ci = y as usize * chroma_stride + (x / 2) as usize;
            Luma([ycbcr_to_gray(self.y[yi], self.cb[ci], self.cr[ci])])
        })
    }
}

/// JFIF YCbCr to RGB in 16.16 fixed point.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let yy = i32::from(y) * 0x10101;
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;
    let r = yy + 91881 * cr;
    let g = yy - 22554 * cb - 46802 * cr;
    let b = yy + 116130 * cb;
    [clamp_fixed(r), clamp_fixed(g), clamp_fixed(b)]
}

/// Luma of a YCbCr pixel: RGB at 16 bits per channel, then 0.299/0.587/0.114 weights.
pub fn ycbcr_to_gray(y: u8, cb: u8, cr: u8) -> u8 {
    let yy = i32::from(y) * 0x10101;
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;
    let r = clamp_fixed16(yy + 91881 * cr);
    let g = clamp_fixed16(yy - 22554 * cb - 46802 * cr);
    let b = clamp_fixed16(yy + 116130 * cb);
    ((19595 * r + 38470 * g + 7471 * b + (1 << 15)) >> 24) as u8
}

#[inline]
fn clamp_fixed(v: i32) -> u8 {
    if (v as u32) & 0xff00_0000 == 0 {
        (v >> 16) as u8
    } else {
        // negative -> 0, overflow -> 255
        !(v >> 31) as u8
    }
}

#[inline]
fn clamp_fixed16(v: i32) -> u32 {
    if (v as u32) & 0xff00_0000 == 0 {
        (v >> 8) as u32
    } else {
        (!(v >> 31) & 0xffff) as u32
    }
}

/// One captured frame at every stage of reduction.
#[derive(Debug, Clone)]
pub struct Frame {
    pub raw: YCbCr422,
    pub thumb: RgbImage,
    pub gray: GrayImage,
}

impl Frame {
    /// Decodes `raw` and reduces it by `factor` in each dimension.
    pub fn from_yuyv(raw: &[u8], width: u32, height: u32, factor: u32) -> Result<Self, VisionError> {
        if factor == 0 {
            return Err(VisionError::Config("downsample factor must be non-zero".to_string()));
        }
        let (tw, th) = (width / factor, height / factor);
        if tw == 0 || th == 0 {
            return Err(VisionError::BadFrame(format!(
                "{}x{} frame is too small for a 1/{} thumbnail",
                width, height, factor
            )));
        }
        let image = YCbCr422::from_yuyv(raw, width, height)?;
        let thumb = imageops::resize(&image.to_rgb(), tw, th, FilterType::Nearest);
        // same sampling as the thumbnail, so gray[i] is the luma of thumb[i]'s source pixel
        let gray = imageops::resize(&image.to_gray(), tw, th, FilterType::Nearest);
        Ok(Self {
            raw: image,
            thumb,
            gray,
        })
    }

    pub fn thumb_size(&self) -> (u32, u32) {
        self.gray.dimensions()
    }

    /// Row-major normalised gray levels of the thumbnail.
    pub fn measurement(&self) -> Measurement {
        Measurement::from_gray(self.gray.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_yuyv(width: u32, height: u32, y: u8) -> Vec<u8> {
        let mut raw = Vec::new();
        for _ in 0..(width * height / 2) {
            raw.extend_from_slice(&[y, 128, y, 128]);
        }
        raw
    }

    #[test]
    fn test_unpack_yuyv() {
        let raw = [10, 20, 30, 40, 50, 60, 70, 80];
        let img = YCbCr422::from_yuyv(&raw, 4, 1).unwrap();
        assert_eq!(img.y, vec![10, 30, 50, 70]);
        assert_eq!(img.cb, vec![20, 60]);
        assert_eq!(img.cr, vec![40, 80]);
    }

    #[test]
    fn test_short_frame_is_bad() {
        let err = YCbCr422::from_yuyv(&[0; 6], 4, 1).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_odd_width_rejected() {
        assert!(matches!(
            YCbCr422::from_yuyv(&[0; 12], 3, 2),
            Err(VisionError::Format(_))
        ));
    }

    #[test]
    fn test_neutral_chroma_is_gray() {
        assert_eq!(ycbcr_to_rgb(0, 128, 128), [0, 0, 0]);
        assert_eq!(ycbcr_to_rgb(255, 128, 128), [255, 255, 255]);
        assert_eq!(ycbcr_to_rgb(100, 128, 128), [100, 100, 100]);
    }

    #[test]
    fn test_saturated_chroma_clamps() {
        let [r, _, b] = ycbcr_to_rgb(255, 255, 255);
        assert_eq!(r, 255);
        assert_eq!(b, 255);
        let [r, _, b] = ycbcr_to_rgb(0, 0, 0);
        assert_eq!(r, 0);
        assert_eq!(b, 0);
    }

    #[test]
    fn test_gray_uses_rec601_weights() {
        assert_eq!(ycbcr_to_rgb(128, 128, 255), [255, 37, 128]);
        assert_eq!(ycbcr_to_gray(128, 128, 255), 113);
        for v in 0..=255u8 {
            assert_eq!(ycbcr_to_gray(v, 128, 128), v);
        }
    }

    #[test]
    fn test_saturated_chroma_frame_gray() {
        let raw: Vec<u8> = (0..64 * 32 / 2).flat_map(|_| [128, 128, 128, 255]).collect();
        let frame = Frame::from_yuyv(&raw, 64, 32, 16).unwrap();
        assert!(frame.thumb.pixels().all(|p| p.0 == [255, 37, 128]));
        assert!(frame.gray.pixels().all(|p| p.0 == [113]));
    }

    #[test]
    fn test_frame_reduction() {
        let raw = uniform_yuyv(64, 32, 128);
        let frame = Frame::from_yuyv(&raw, 64, 32, 16).unwrap();
        assert_eq!(frame.thumb.dimensions(), (4, 2));
        assert_eq!(frame.thumb_size(), (4, 2));
        let m = frame.measurement();
        assert_eq!(m.len(), 8);
        assert!(m.as_slice().iter().all(|v| (*v - 0.5).abs() < 0.01));
    }

    #[test]
    fn test_frame_too_small_for_thumbnail() {
        let raw = uniform_yuyv(8, 8, 0);
        let err = Frame::from_yuyv(&raw, 8, 8, 16).unwrap_err();
        assert!(err.is_transient());
    }
}
