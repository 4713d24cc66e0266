pub mod chebyshev_record;
pub mod daf_header;
pub mod directory;
pub mod hermite_segment;
pub mod kernel_pool;
pub mod metakernel;
pub mod segment;
pub mod spk_type;
pub mod summary_record;

pub use kernel_pool::KernelPool;
