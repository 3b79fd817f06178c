use crate::detector::Detection;
use image::{imageops::FilterType, DynamicImage, GenericImageView};

#[derive(Debug, Clone, Copy)]
pub struct CropParams {
    /// Total padding added around the detected box, split evenly between sides.
    pub margin: u32,
    /// Side of the square crop handed to the embedding model.
    pub image_size: u32,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            margin: 44,
            image_size: 160,
        }
    }
}

/// A face cut out of a larger image.
#[derive(Debug, Clone)]
pub struct FaceCrop {
    pub image: DynamicImage,
    /// Region of the source image, x1, y1, x2, y2 in pixels (x2/y2 exclusive).
    pub bbox: [u32; 4],
    pub score: f32,
}

/// Padded box around a detection, clamped to the image. `None` when the
/// clamped box is empty.
pub fn margin_box(detection: &Detection, margin: u32, width: u32, height: u32) -> Option<[u32; 4]> {
    let half = margin as f32 / 2.0;
    let [x, y, w, h] = detection.bbox;

    let x1 = (x - half).max(0.0) as u32;
    let y1 = (y - half).max(0.0) as u32;
    let x2 = (x + w + half).min(width as f32).max(0.0) as u32;
    let y2 = (y + h + half).min(height as f32).max(0.0) as u32;

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some([x1, y1, x2, y2])
}

/// Cut every detection out of `img` with margin and resize to the model input size.
pub fn crop_faces(img: &DynamicImage, detections: &[Detection], params: CropParams) -> Vec<FaceCrop> {
    let (width, height) = img.dimensions();
    detections
        .iter()
        .filter_map(|d| {
            let Some(bbox) = margin_box(d, params.margin, width, height) else {
                log::debug!("skipping empty face box {:?}", d.bbox);
                return None;
            };
            let [x1, y1, x2, y2] = bbox;
            let face = img
                .crop_imm(x1, y1, x2 - x1, y2 - y1)
                .resize_exact(params.image_size, params.image_size, FilterType::Triangle);
            Some(FaceCrop {
                image: DynamicImage::ImageRgb8(face.to_rgb8()),
                bbox,
                score: d.score,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(bbox: [f32; 4]) -> Detection {
        Detection {
            bbox,
            score: 0.9,
            landmarks: [0.0; 10],
        }
    }

    #[test]
    fn test_margin_box_inside_image() {
        let b = margin_box(&det([100.0, 80.0, 50.0, 60.0]), 44, 640, 480).unwrap();
        assert_eq!(b, [78, 58, 172, 162]);
    }

    #[test]
    fn test_margin_box_clamped_to_image() {
        let b = margin_box(&det([5.0, 10.0, 100.0, 100.0]), 44, 90, 100).unwrap();
        assert_eq!(b, [0, 0, 90, 100]);
    }

    #[test]
    fn test_margin_box_outside_image() {
        assert!(margin_box(&det([700.0, 10.0, 20.0, 20.0]), 0, 640, 480).is_none());
    }

    #[test]
    fn test_crop_faces_resizes_to_input() {
        let img = DynamicImage::new_rgb8(320, 240);
        let detections = vec![
            det([100.0, 80.0, 50.0, 60.0]),
            det([1000.0, 1000.0, 10.0, 10.0]),
        ];
        let crops = crop_faces(&img, &detections, CropParams::default());
        assert_eq!(crops.len(), 1);
        assert_eq!(crops[0].image.dimensions(), (160, 160));
        assert_eq!(crops[0].bbox, [78, 58, 172, 162]);
    }
}
