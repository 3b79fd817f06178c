use crate::yunet;
use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use ort::{session::Session, value::Value};
use std::path::Path;

/// YuNet expects a fixed [1, 3, 640, 640] input.
const INPUT_SIZE: u32 = 640;

/// Face found by the detector, in original-image pixels.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: [f32; 4], // x, y, w, h
    pub score: f32,
    pub landmarks: [f32; 10], // 5 points: x1,y1,x2,y2,...,x5,y5
}

#[derive(Debug, Clone, Copy)]
pub struct DetectParams {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    /// Faces narrower or shorter than this many pixels are dropped.
    pub min_face_size: u32,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            score_threshold: 0.6,
            nms_threshold: 0.3,
            min_face_size: 20,
        }
    }
}

/// Image scaled to fit the square network input and centered on a black canvas.
struct Letterbox {
    canvas: image::RgbImage,
    scale: f32,
    offset_x: u32,
    offset_y: u32,
}

impl Letterbox {
    fn new(img: &DynamicImage, target: u32) -> Self {
        let (width, height) = img.dimensions();
        let scale = target as f32 / width.max(height).max(1) as f32;
        let new_width = ((width as f32 * scale) as u32).clamp(1, target);
        let new_height = ((height as f32 * scale) as u32).clamp(1, target);

        let resized =
            img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle);
        let mut canvas = DynamicImage::new_rgb8(target, target);
        let offset_x = (target - new_width) / 2;
        let offset_y = (target - new_height) / 2;
        image::imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

        Self {
            canvas: canvas.to_rgb8(),
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Planar BGR tensor with values in [0, 255].
    fn to_bgr_tensor(&self) -> Result<Array4<f32>> {
        let (w, h) = self.canvas.dimensions();
        let plane = (w * h) as usize;
        let mut data = vec![0.0f32; 3 * plane];
        let (b, rest) = data.split_at_mut(plane);
        let (g, r) = rest.split_at_mut(plane);
        for (i, px) in self.canvas.as_raw().chunks_exact(3).enumerate() {
            r[i] = px[0] as f32;
            g[i] = px[1] as f32;
            b[i] = px[2] as f32;
        }
        Ok(Array4::from_shape_vec((1, 3, h as usize, w as usize), data)?)
    }

    /// Map a normalized canvas coordinate back to the source image.
    fn unmap_x(&self, x: f32) -> f32 {
        (x * INPUT_SIZE as f32 - self.offset_x as f32) / self.scale
    }

    fn unmap_y(&self, y: f32) -> f32 {
        (y * INPUT_SIZE as f32 - self.offset_y as f32) / self.scale
    }

    fn unmap(&self, raw: yunet::RawDetection) -> Detection {
        let mut landmarks = [0.0f32; 10];
        for i in 0..5 {
            landmarks[i * 2] = self.unmap_x(raw.landmarks[i * 2]);
            landmarks[i * 2 + 1] = self.unmap_y(raw.landmarks[i * 2 + 1]);
        }
        Detection {
            bbox: [
                self.unmap_x(raw.bbox[0]),
                self.unmap_y(raw.bbox[1]),
                raw.bbox[2] * INPUT_SIZE as f32 / self.scale,
                raw.bbox[3] * INPUT_SIZE as f32 / self.scale,
            ],
            score: raw.score,
            landmarks,
        }
    }
}

/// Pretrained YuNet face detector.
pub struct FaceDetector {
    session: Session,
    params: DetectParams,
}

impl FaceDetector {
    pub fn new(session: Session, params: DetectParams) -> Self {
        Self { session, params }
    }

    pub fn load(model: &Path, params: DetectParams) -> Result<Self> {
        let session = crate::model::load_session(model).context("load detector model")?;
        Ok(Self::new(session, params))
    }

    pub fn params(&self) -> DetectParams {
        self.params
    }

    /// Detect faces, strongest first.
    pub fn detect(&mut self, img: &DynamicImage) -> Result<Vec<Detection>> {
        let letterbox = Letterbox::new(img, INPUT_SIZE);
        let input = Value::from_array(letterbox.to_bgr_tensor()?)?;
        let outputs = self.session.run(ort::inputs![input])?;

        let mut raw_outputs: Vec<(Vec<i64>, Vec<f32>)> = Vec::new();
        for (_name, output) in outputs.iter() {
            let (shape, data) = output.try_extract_tensor::<f32>()?;
            raw_outputs.push((shape.iter().copied().collect(), data.to_vec()));
        }
        let refs: Vec<(&[i64], &[f32])> = raw_outputs
            .iter()
            .map(|(s, d)| (s.as_slice(), d.as_slice()))
            .collect();

        let mut parsed = yunet::parse_outputs(&refs, INPUT_SIZE as usize)?;
        yunet::apply_sigmoid(&mut parsed.scores);
        let raw = yunet::decode(&parsed, self.params.score_threshold, INPUT_SIZE as usize)?;

        let min = self.params.min_face_size as f32;
        let detections: Vec<Detection> = raw
            .into_iter()
            .map(|d| letterbox.unmap(d))
            .filter(|d| d.bbox[2] >= min && d.bbox[3] >= min)
            .collect();

        let kept = nms(&detections, self.params.nms_threshold);
        log::debug!(
            "detector: {} candidates, {} after nms",
            detections.len(),
            kept.len()
        );
        Ok(kept)
    }
}

/// Non-maximum suppression. The result is sorted by descending score.
pub fn nms(detections: &[Detection], iou_threshold: f32) -> Vec<Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    if iou_threshold >= 1.0 {
        return sorted;
    }

    let mut keep: Vec<Detection> = Vec::new();
    for candidate in sorted {
        if keep
            .iter()
            .all(|k| compute_iou(&k.bbox, &candidate.bbox) <= iou_threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn compute_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = (a[0] + a[2]).min(b[0] + b[2]);
    let y2 = (a[1] + a[3]).min(b[1] + b[3]);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let inter = (x2 - x1) * (y2 - y1);
    inter / (a[2] * a[3] + b[2] * b[3] - inter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(bbox: [f32; 4], score: f32) -> Detection {
        Detection {
            bbox,
            score,
            landmarks: [0.0; 10],
        }
    }

    #[test]
    fn test_iou() {
        let a = [10.0, 10.0, 20.0, 20.0];
        let b = [15.0, 15.0, 20.0, 20.0];
        let iou = compute_iou(&a, &b);
        assert!(iou > 0.0 && iou < 1.0);
        assert!((compute_iou(&a, &a) - 1.0).abs() < 1e-6);

        let c = [100.0, 100.0, 10.0, 10.0];
        assert_eq!(compute_iou(&a, &c), 0.0);
    }

    #[test]
    fn test_nms_keeps_strongest_of_overlap() {
        let detections = vec![
            det([12.0, 12.0, 20.0, 20.0], 0.8),
            det([10.0, 10.0, 20.0, 20.0], 0.9),
            det([100.0, 100.0, 20.0, 20.0], 0.85),
        ];

        let kept = nms(&detections, 0.3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.85);
    }

    #[test]
    fn test_letterbox_round_trips_coordinates() {
        let img = DynamicImage::new_rgb8(320, 160);
        let lb = Letterbox::new(&img, INPUT_SIZE);
        assert_eq!(lb.scale, 2.0);
        assert_eq!(lb.offset_x, 0);
        assert_eq!(lb.offset_y, 160);

        // Canvas pixel (64, 224) is source pixel (32, 32).
        let raw = yunet::RawDetection {
            bbox: [64.0 / 640.0, 224.0 / 640.0, 0.1, 0.1],
            score: 0.9,
            landmarks: [0.0; 10],
        };
        let d = lb.unmap(raw);
        assert!((d.bbox[0] - 32.0).abs() < 1e-3);
        assert!((d.bbox[1] - 32.0).abs() < 1e-3);
        assert!((d.bbox[2] - 32.0).abs() < 1e-3);
    }

    #[test]
    fn test_bgr_tensor_channel_order() {
        let rgb = image::RgbImage::from_pixel(640, 640, image::Rgb([10, 20, 30]));
        let lb = Letterbox::new(&DynamicImage::ImageRgb8(rgb), INPUT_SIZE);
        let t = lb.to_bgr_tensor().unwrap();
        assert_eq!(t.shape(), &[1, 3, 640, 640]);
        assert_eq!(t[[0, 0, 0, 0]], 30.0);
        assert_eq!(t[[0, 1, 0, 0]], 20.0);
        assert_eq!(t[[0, 2, 0, 0]], 10.0);
    }
}
