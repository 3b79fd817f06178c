//! YuNet output decoding.
//!
//! YuNet is anchor-free: each cell of the stride-8/16/32 grids predicts a
//! score, a box and five landmarks relative to the cell origin.
//!
//! cx = (grid_x + dx) * stride / input_size
//! cy = (grid_y + dy) * stride / input_size
//! w = dw * stride / input_size
//! h = dh * stride / input_size

use anyhow::Result;
use ndarray::Array2;

pub const STRIDES: [usize; 3] = [8, 16, 32];

/// Detection in coordinates normalized to the square network input.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub bbox: [f32; 4], // x, y, w, h
    pub score: f32,
    pub landmarks: [f32; 10],
}

/// Per-stride tensors after parsing, one entry per element of [`STRIDES`].
#[derive(Debug, Clone)]
pub struct YunetOutputs {
    pub scores: Vec<Array2<f32>>,
    pub bboxes: Vec<Array2<f32>>,
    pub landmarks: Vec<Array2<f32>>,
}

fn grid_cells(input_size: usize, stride: usize) -> usize {
    let side = input_size / stride;
    side * side
}

/// Read one group of three per-stride tensors starting at `offset`.
///
/// Each tensor must be `[1, cells, width]`.
fn parse_group(
    outputs: &[(&[i64], &[f32])],
    offset: usize,
    width: usize,
    label: &str,
    input_size: usize,
) -> Result<Vec<Array2<f32>>> {
    let mut group = Vec::with_capacity(STRIDES.len());
    for (i, &stride) in STRIDES.iter().enumerate() {
        let idx = offset + i;
        let cells = grid_cells(input_size, stride);
        let (shape, data) = outputs
            .get(idx)
            .ok_or_else(|| anyhow::anyhow!("missing {} output at index {}", label, idx))?;

        if shape.len() != 3 || shape[0] != 1 || shape[2] != width as i64 {
            anyhow::bail!(
                "unexpected {} shape at index {}: {:?}, expected [1, {}, {}]",
                label,
                idx,
                shape,
                cells,
                width
            );
        }
        if shape[1] as usize != cells {
            anyhow::bail!(
                "expected {} cells for {} at stride {}, got {}",
                cells,
                label,
                stride,
                shape[1]
            );
        }

        group.push(Array2::from_shape_vec((cells, width), data.to_vec())?);
    }
    Ok(group)
}

/// Split the twelve raw YuNet tensors into scores, boxes and landmarks.
///
/// Output order is cls_8, cls_16, cls_32, obj_8, obj_16, obj_32,
/// bbox_8, bbox_16, bbox_32, kps_8, kps_16, kps_32. The returned scores are
/// `cls * obj` without activation.
pub fn parse_outputs(outputs: &[(&[i64], &[f32])], input_size: usize) -> Result<YunetOutputs> {
    let cls = parse_group(outputs, 0, 1, "cls", input_size)?;
    let obj = parse_group(outputs, 3, 1, "obj", input_size)?;
    let bboxes = parse_group(outputs, 6, 4, "bbox", input_size)?;
    let landmarks = parse_group(outputs, 9, 10, "kps", input_size)?;

    let scores = cls.iter().zip(obj.iter()).map(|(c, o)| c * o).collect();

    Ok(YunetOutputs {
        scores,
        bboxes,
        landmarks,
    })
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub fn apply_sigmoid(scores: &mut [Array2<f32>]) {
    for map in scores {
        map.mapv_inplace(sigmoid);
    }
}

/// Turn grid predictions into detections whose score reaches `score_threshold`.
pub fn decode(
    outputs: &YunetOutputs,
    score_threshold: f32,
    input_size: usize,
) -> Result<Vec<RawDetection>> {
    let mut detections = Vec::new();
    let size = input_size as f32;

    for (level, &stride) in STRIDES.iter().enumerate() {
        let scores = &outputs.scores[level];
        let bboxes = &outputs.bboxes[level];
        let landmarks = &outputs.landmarks[level];

        let side = input_size / stride;
        if scores.nrows() != side * side {
            anyhow::bail!(
                "expected {} cells for stride {} ({}x{} grid), got {}",
                side * side,
                stride,
                side,
                side,
                scores.nrows()
            );
        }

        let s = stride as f32;
        for row in 0..side {
            for col in 0..side {
                let idx = row * side + col;
                let score = scores[[idx, 0]];
                if score < score_threshold {
                    continue;
                }

                let cx = (col as f32 + bboxes[[idx, 0]]) * s / size;
                let cy = (row as f32 + bboxes[[idx, 1]]) * s / size;
                let w = bboxes[[idx, 2]] * s / size;
                let h = bboxes[[idx, 3]] * s / size;

                let mut lms = [0.0f32; 10];
                for k in 0..5 {
                    lms[k * 2] = (col as f32 + landmarks[[idx, k * 2]]) * s / size;
                    lms[k * 2 + 1] = (row as f32 + landmarks[[idx, k * 2 + 1]]) * s / size;
                }

                detections.push(RawDetection {
                    bbox: [cx - w / 2.0, cy - h / 2.0, w, h],
                    score,
                    landmarks: lms,
                });
            }
        }
    }

    Ok(detections)
}
