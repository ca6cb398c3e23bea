use crate::dtype::Element;
use crate::error::Result;
use crate::ops::engine::check_numel;
use crate::ops::{ExecContext, apply_binary, apply_ternary, apply_unary};
use crate::tensor::Tensor;
use tracing::instrument;

/// Saturating clamp activation.
///
/// Forward: `min_val` below `min_val`, `max_val` above `max_val`, identity in
/// between. Backward passes the gradient through only strictly inside
/// `(min_val, max_val)`; the derivative at either bound is zero.
///
/// `min_val <= max_val` is expected but not checked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HardTanh<T> {
    pub min_val: T,
    pub max_val: T,
    pub inplace: bool,
}

impl<T: Element> HardTanh<T> {
    /// Bounds are given in `f64` and narrowed to the element type
    pub fn new(min_val: f64, max_val: f64) -> Result<Self> {
        Ok(HardTanh {
            min_val: T::from_accreal(min_val)?,
            max_val: T::from_accreal(max_val)?,
            inplace: false,
        })
    }

    /// `min(max(x, 0), 6)`
    pub fn relu6() -> Result<Self> {
        Self::new(0.0, 6.0)
    }

    #[must_use]
    pub fn inplace(mut self, inplace: bool) -> Self {
        self.inplace = inplace;
        self
    }

    /// Compute the activation of `input` into `output`.
    ///
    /// In-place: `output` becomes a view of `input` and `input` is clamped.
    /// Otherwise `output` is resized to `input`'s shape and overwritten.
    #[instrument(skip_all, fields(numel = input.numel(), inplace = self.inplace))]
    pub fn update_output(
        &self,
        ctx: &ExecContext,
        input: &Tensor<T>,
        output: &mut Tensor<T>,
    ) -> Result<()> {
        let (min_val, max_val) = (self.min_val, self.max_val);
        if self.inplace {
            *output = input.view();
            apply_unary(ctx, output, move |x| {
                if *x < min_val {
                    *x = min_val;
                } else if *x > max_val {
                    *x = max_val;
                }
            })
        } else {
            output.resize_as(input);
            apply_binary(ctx, output, input, move |o, x| {
                *o = if x < min_val {
                    min_val
                } else if x > max_val {
                    max_val
                } else {
                    x
                };
            })
        }
    }

    /// Gradient of the activation with respect to `input`.
    ///
    /// In-place: `grad_input` becomes a view of `grad_output`, whose entries
    /// at saturated positions are zeroed. Otherwise `grad_input` is resized
    /// to `input`'s shape and written in full.
    ///
    /// # Errors
    /// `ElementCountMismatch` if `grad_output` and `input` differ in size.
    #[instrument(skip_all, fields(numel = input.numel(), inplace = self.inplace))]
    pub fn update_grad_input(
        &self,
        ctx: &ExecContext,
        input: &Tensor<T>,
        grad_output: &Tensor<T>,
        grad_input: &mut Tensor<T>,
    ) -> Result<()> {
        check_numel("hardtanh_backward", input, grad_output)?;
        let (min_val, max_val) = (self.min_val, self.max_val);
        let saturated = move |x: T| x <= min_val || x >= max_val;

        if self.inplace {
            *grad_input = grad_output.view();
            apply_binary(ctx, grad_input, input, move |g, x| {
                if saturated(x) {
                    *g = T::zero();
                }
            })
        } else {
            grad_input.resize_as(input);
            apply_ternary(ctx, grad_input, grad_output, input, move |g, go, x| {
                *g = if saturated(x) { T::zero() } else { go };
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoltaError;

    fn unit() -> HardTanh<f32> {
        HardTanh::new(-1.0, 1.0).unwrap()
    }

    #[test]
    fn test_forward_clamps() {
        let ctx = ExecContext::default();
        let input = Tensor::from_vec(vec![-2.0f32, -1.0, 0.0, 1.0, 2.0]);
        let mut output = Tensor::zeros(&[0]);
        unit().update_output(&ctx, &input, &mut output).unwrap();
        assert_eq!(output.shape(), &[5]);
        assert!(!output.shares_storage(&input));
        assert_eq!(output.to_vec().unwrap(), vec![-1.0, -1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_forward_inplace_aliases_input() {
        let ctx = ExecContext::default();
        let input = Tensor::new(vec![-3.0f32, 0.5, 3.0, -0.5], &[2, 2]).unwrap();
        let mut output = Tensor::zeros(&[1]);
        unit()
            .inplace(true)
            .update_output(&ctx, &input, &mut output)
            .unwrap();
        assert!(output.is_same_view(&input));
        assert_eq!(input.to_vec().unwrap(), vec![-1.0, 0.5, 1.0, -0.5]);
    }

    #[test]
    fn test_backward_boundaries_are_zero() {
        let ctx = ExecContext::default();
        let input = Tensor::from_vec(vec![-2.0f32, -1.0, 0.0, 1.0, 2.0]);
        let grad_output = Tensor::from_vec(vec![1.0f32; 5]);
        let mut grad_input = Tensor::zeros(&[0]);
        unit()
            .update_grad_input(&ctx, &input, &grad_output, &mut grad_input)
            .unwrap();
        assert_eq!(grad_input.to_vec().unwrap(), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        // grad_output untouched out of place
        assert_eq!(grad_output.to_vec().unwrap(), vec![1.0; 5]);
    }

    #[test]
    fn test_backward_inplace_mutates_grad_output() {
        let ctx = ExecContext::default();
        let input = Tensor::new(vec![-2.0f64, -0.5, 0.5, 2.0], &[2, 2]).unwrap();
        let grad_output = Tensor::new(vec![3.0f64, 4.0, 5.0, 6.0], &[2, 2]).unwrap();
        let mut grad_input = Tensor::zeros(&[0]);
        HardTanh::new(-1.0, 1.0)
            .unwrap()
            .inplace(true)
            .update_grad_input(&ctx, &input, &grad_output, &mut grad_input)
            .unwrap();
        assert!(grad_input.is_same_view(&grad_output));
        assert_eq!(grad_output.to_vec().unwrap(), vec![0.0, 4.0, 5.0, 0.0]);
    }

    #[test]
    fn test_backward_count_mismatch() {
        let ctx = ExecContext::default();
        let input = Tensor::<f32>::zeros(&[4]);
        let grad_output = Tensor::<f32>::zeros(&[5]);
        let mut grad_input = Tensor::zeros(&[7]);
        let err = unit()
            .update_grad_input(&ctx, &input, &grad_output, &mut grad_input)
            .unwrap_err();
        assert!(matches!(err, VoltaError::ElementCountMismatch { .. }));
        // No partial work: grad_input was not resized
        assert_eq!(grad_input.shape(), &[7]);
    }

    #[test]
    fn test_relu6() {
        let ctx = ExecContext::default();
        let input = Tensor::from_vec(vec![-1.0f32, 3.0, 7.0]);
        let mut output = Tensor::zeros(&[3]);
        HardTanh::relu6()
            .unwrap()
            .update_output(&ctx, &input, &mut output)
            .unwrap();
        assert_eq!(output.to_vec().unwrap(), vec![0.0, 3.0, 6.0]);
    }
}
