pub mod ria;
pub mod traits;

pub use ria::{RiaClient, RIA_DEV_URL, RIA_SITE_URL};
pub use traits::{AdSource, DetailSource};
