// Neural-network kernels built on the elementwise apply engine.
//
// Kernels are stateless between calls: forward and backward take the
// tensors they read and the tensor handle they write, and establish the
// output's shape or aliasing themselves.
pub mod hardtanh;
pub mod margin_criterion;

pub use hardtanh::HardTanh;
pub use margin_criterion::MarginCriterion;
