use std::ops::{Add, Sub};

/// Two-dimensional row-major tensor used by the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Flattened storage of tensor elements
    pub data: Vec<f32>,
    /// Shape as (rows, columns)
    pub shape: (usize, usize),
}

impl Tensor {
    /// Creates a new tensor with default shape (1, n)
    pub fn new(data: Vec<f32>) -> Self {
        let n = data.len();
        Tensor {
            data,
            shape: (1, n),
        }
    }

    /// Creates a new tensor with specified shape
    pub fn new_with_shape(data: Vec<f32>, shape: (usize, usize)) -> Self {
        debug_assert_eq!(data.len(), shape.0 * shape.1);
        Tensor { data, shape }
    }

    /// Creates a tensor filled with zeros
    pub fn zeros(shape: (usize, usize)) -> Self {
        Tensor {
            data: vec![0.0; shape.0 * shape.1],
            shape,
        }
    }

    /// Creates a zero-filled tensor with same shape as self
    pub fn zeros_like(&self) -> Self {
        Tensor::zeros(self.shape)
    }

    /// Element-wise multiplication
    pub fn hadamard(mut self, other: &Tensor) -> Tensor {
        self.data
            .iter_mut()
            .zip(other.data.iter())
            .for_each(|(x, &y)| *x *= y);

        self
    }

    /// Matrix multiplication, accumulating row by row
    pub fn matmul(&self, other: &Tensor) -> Tensor {
        let (m, n) = self.shape;
        let (_, p) = other.shape;

        let mut result = vec![0.0; m * p];

        for i in 0..m {
            let row_offset = i * p;
            for k in 0..n {
                let a_val = self.data[i * n + k];
                let other_row = &other.data[k * p..(k + 1) * p];

                for (out, &b_val) in result[row_offset..row_offset + p]
                    .iter_mut()
                    .zip(other_row)
                {
                    *out += a_val * b_val;
                }
            }
        }

        Tensor::new_with_shape(result, (m, p))
    }

    /// Matrix transpose operation
    pub fn transpose(&self) -> Tensor {
        let (rows, cols) = self.shape;
        let mut result = vec![0.0; self.data.len()];

        for i in 0..rows {
            for j in 0..cols {
                result[j * rows + i] = self.data[i * cols + j];
            }
        }

        Tensor::new_with_shape(result, (cols, rows))
    }

    /// Applies the logistic function element-wise, stable for large magnitudes
    pub fn sigmoid(&self) -> Tensor {
        let data = self
            .data
            .iter()
            .map(|&x| {
                if x >= 0.0 {
                    1.0 / (1.0 + (-x).exp())
                } else {
                    let e = x.exp();
                    e / (1.0 + e)
                }
            })
            .collect();

        Tensor {
            data,
            shape: self.shape,
        }
    }

    /// Sums each column over all rows, producing a (1, columns) tensor
    pub fn sum_rows(&self) -> Tensor {
        let (rows, columns) = self.shape;
        let mut sums = vec![0.0; columns];
        for row in 0..rows {
            for (sum, &value) in sums
                .iter_mut()
                .zip(&self.data[row * columns..(row + 1) * columns])
            {
                *sum += value;
            }
        }
        Tensor::new_with_shape(sums, (1, columns))
    }
}

// Element-wise addition implementation
impl<'a, 'b> Add<&'b Tensor> for &'a Tensor {
    type Output = Tensor;

    fn add(self, other: &'b Tensor) -> Tensor {
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();

        Tensor {
            data,
            shape: self.shape,
        }
    }
}

// Element-wise subtraction implementation
impl<'a, 'b> Sub<&'b Tensor> for &'a Tensor {
    type Output = Tensor;

    fn sub(self, other: &'b Tensor) -> Tensor {
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();

        Tensor {
            data,
            shape: self.shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_close, assert_tensors_eq};

    #[test]
    fn test_tensor_creation() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(t.shape, (1, 3));

        let t2 = Tensor::zeros((2, 3));
        assert_eq!(t2.data, vec![0.0; 6]);
        assert_eq!(t2.zeros_like().shape, (2, 3));
    }

    #[test]
    fn test_addition_and_subtraction() {
        let a = Tensor::new_with_shape(vec![1.0, 2.0, 3.0, 4.0], (2, 2));
        let b = Tensor::new_with_shape(vec![4.0, 5.0, 6.0, 7.0], (2, 2));
        assert_eq!((&a + &b).data, vec![5.0, 7.0, 9.0, 11.0]);
        assert_eq!((&b - &a).data, vec![3.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_hadamard() {
        let a = Tensor::new(vec![1.0, 2.0, 3.0]);
        let b = Tensor::new(vec![4.0, 5.0, 6.0]);
        assert_eq!(a.hadamard(&b).data, vec![4.0, 10.0, 18.0]);
    }

    #[test]
    fn test_matmul() {
        let a = Tensor::new_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3));
        let b = Tensor::new_with_shape(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], (3, 2));
        let expected = Tensor::new_with_shape(vec![4.0, 5.0, 10.0, 11.0], (2, 2));
        assert_tensors_eq(&a.matmul(&b), &expected);
    }

    #[test]
    fn test_transpose() {
        let a = Tensor::new_with_shape(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3));
        let result = a.transpose();
        assert_eq!(result.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(result.shape, (3, 2));
    }

    #[test]
    fn test_sigmoid() {
        let t = Tensor::new(vec![0.0, 2.0, -2.0, 100.0, -100.0]);
        let s = t.sigmoid();
        assert_close(s.data[0], 0.5, 1e-7);
        assert_close(s.data[1] + s.data[2], 1.0, 1e-6);
        assert_close(s.data[3], 1.0, 1e-7);
        assert_close(s.data[4], 0.0, 1e-7);
        assert!(s.data.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_sum_rows() {
        let t = Tensor::new_with_shape(vec![1.0, -1.0, 0.5, 0.5], (2, 2));
        assert_eq!(t.sum_rows(), Tensor::new_with_shape(vec![1.5, -0.5], (1, 2)));
    }
}
