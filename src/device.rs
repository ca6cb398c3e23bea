// ===== DEVICE ENUM =====

/// Compute device for tensor operations
///
/// Only CPU execution is implemented; kernels run on the calling thread or
/// on a rayon worker pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    CPU,
}

impl Device {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Device::CPU => "CPU",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
