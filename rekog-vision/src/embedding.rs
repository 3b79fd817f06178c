use ndarray::Array1;

/// Face embedding produced by the recognition network.
///
/// The vector is stored exactly as the model emitted it; nothing here
/// normalizes or whitens it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Array1<f32>,
}

impl Embedding {
    pub fn new(vector: Array1<f32>) -> Self {
        Self { vector }
    }

    pub fn from_vec(values: Vec<f32>) -> Self {
        Self {
            vector: Array1::from_vec(values),
        }
    }

    /// Number of components.
    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.vector.iter().copied().collect()
    }

    /// L2 norm of `self - other`. Both sides must have the same dimension;
    /// extra trailing components of the longer one are ignored.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.vector
            .iter()
            .zip(other.vector.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::from_vec(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let e = Embedding::from_vec(vec![0.3, -1.2, 4.0]);
        assert_eq!(e.euclidean_distance(&e), 0.0);
    }

    #[test]
    fn test_distance_345() {
        let a = Embedding::from_vec(vec![0.0, 0.0]);
        let b = Embedding::from_vec(vec![3.0, 4.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
        assert!((b.euclidean_distance(&a) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_dim_and_to_vec() {
        let e: Embedding = vec![1.0, 2.0, 3.0].into();
        assert_eq!(e.dim(), 3);
        assert_eq!(e.to_vec(), vec![1.0, 2.0, 3.0]);
    }
}
