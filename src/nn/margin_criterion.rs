use crate::dtype::Element;
use crate::error::{Result, VoltaError};
use crate::ops::engine::check_numel;
use crate::ops::{ExecContext, apply_ternary, fold_binary};
use crate::tensor::Tensor;
use tracing::instrument;

/// Margin ranking loss: `Σ max(0, margin - x·y)` over input `x` and
/// target `y` (targets are normally ±1).
///
/// With `size_average` the sum (and the gradient) is divided by the number
/// of elements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarginCriterion<T> {
    pub size_average: bool,
    pub margin: T,
}

impl<T: Element> MarginCriterion<T> {
    pub fn new(size_average: bool, margin: f64) -> Result<Self> {
        Ok(MarginCriterion {
            size_average,
            margin: T::from_accreal(margin)?,
        })
    }

    /// Write the loss into `output[0]`.
    ///
    /// The sum is accumulated serially in index order so the result is
    /// reproducible bit for bit.
    ///
    /// # Errors
    /// `ElementCountMismatch` if `input` and `target` differ in size;
    /// `DimSizeMismatch` unless `output` has shape `[1]`.
    #[instrument(skip_all, fields(numel = input.numel(), size_average = self.size_average))]
    pub fn update_output(
        &self,
        input: &Tensor<T>,
        target: &Tensor<T>,
        output: &Tensor<T>,
    ) -> Result<()> {
        check_numel("margin_criterion", input, target)?;
        if output.ndim() != 1 || output.shape()[0] != 1 {
            return Err(VoltaError::DimSizeMismatch {
                op: "margin_criterion",
                expected_dims: 1,
                dim: 0,
                expected_size: 1,
                shape: output.shape().to_vec(),
            });
        }

        let margin = self.margin;
        let sum = fold_binary("margin_criterion", input, target, T::zero(), |sum, x, y| {
            let z = margin - x * y;
            sum + if z > T::zero() { z } else { T::zero() }
        })?;
        output.set_1d(0, self.average(sum, input.numel())?)
    }

    /// Loss as a plain value
    pub fn forward(&self, input: &Tensor<T>, target: &Tensor<T>) -> Result<T> {
        let output = Tensor::zeros(&[1]);
        self.update_output(input, target, &output)?;
        output.item()
    }

    /// Gradient of the loss with respect to `input`, written into
    /// `grad_input` after resizing it to `input`'s shape.
    ///
    /// # Errors
    /// `ElementCountMismatch` if `input` and `target` differ in size.
    #[instrument(skip_all, fields(numel = input.numel(), size_average = self.size_average))]
    pub fn update_grad_input(
        &self,
        ctx: &ExecContext,
        input: &Tensor<T>,
        target: &Tensor<T>,
        grad_input: &mut Tensor<T>,
    ) -> Result<()> {
        check_numel("margin_criterion_backward", input, target)?;
        let norm = self.average(T::one(), input.numel())?;
        let margin = self.margin;

        grad_input.resize_as(input);
        apply_ternary(ctx, grad_input, input, target, move |g, x, y| {
            *g = if x * y < margin { -norm * y } else { T::zero() };
        })
    }

    // Empty inputs are never averaged; 0/0 would turn the loss into NaN.
    fn average(&self, value: T, n: usize) -> Result<T> {
        if self.size_average && n > 0 {
            Ok(value / T::from_count(n)?)
        } else {
            Ok(value)
        }
    }
}
