use super::context::ExecContext;
use super::engine::apply_n;
use crate::dtype::Element;
use crate::error::Result;
use crate::tensor::Tensor;

/// Update every element of `t` in place with `f`.
///
/// ```
/// use volta_pointwise::{ExecContext, Tensor, apply_unary};
///
/// let t = Tensor::new(vec![-2.0f32, 3.0], &[2, 1]).unwrap();
/// apply_unary(&ExecContext::default(), &t, |x| *x = x.abs()).unwrap();
/// assert_eq!(t.to_vec().unwrap(), vec![2.0, 3.0]);
/// ```
///
/// # Errors
/// `WorkerPanic` if `f` panics; `PoisonedStorage` if the buffer lock is
/// poisoned.
pub fn apply_unary<T, F>(ctx: &ExecContext, t: &Tensor<T>, f: F) -> Result<()>
where
    T: Element,
    F: Fn(&mut T) + Send + Sync,
{
    apply_n(ctx, "apply_unary", t, [], |x, []| f(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplyConfig;

    #[test]
    fn test_unary_in_place() {
        let t = Tensor::new(vec![1.0f32, -2.0, 3.0, -4.0], &[2, 2]).unwrap();
        apply_unary(&ExecContext::default(), &t, |x| *x *= 2.0).unwrap();
        assert_eq!(t.to_vec().unwrap(), vec![2.0, -4.0, 6.0, -8.0]);
    }

    #[test]
    fn test_unary_on_transposed_view() {
        let base = Tensor::new(vec![0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0], &[2, 3]).unwrap();
        let t = base.transpose(0, 1).unwrap();
        apply_unary(&ExecContext::default(), &t, |x| *x += 10.0).unwrap();
        assert_eq!(
            base.to_vec().unwrap(),
            vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]
        );
    }

    #[test]
    fn test_unary_parallel_matches_serial() {
        let ctx = ExecContext::new(ApplyConfig::default().with_parallel_threshold(0)).unwrap();
        let data: Vec<f32> = (0..1000).map(|i| i as f32 - 500.0).collect();
        let a = Tensor::new(data.clone(), &[10, 100]).unwrap();
        let b = Tensor::new(data, &[10, 100]).unwrap();
        apply_unary(&ctx, &a, |x| *x = x.max(0.0)).unwrap();
        apply_unary(&ExecContext::serial(), &b, |x| *x = x.max(0.0)).unwrap();
        assert_eq!(a.to_vec().unwrap(), b.to_vec().unwrap());
    }

    #[test]
    fn test_unary_empty_is_noop() {
        let t = Tensor::<f32>::zeros(&[0, 4]);
        apply_unary(&ExecContext::default(), &t, |_| panic!("never called")).unwrap();
    }
}
