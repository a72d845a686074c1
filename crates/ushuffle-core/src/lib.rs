#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod catalog;
pub mod constants;
pub mod format;
pub mod groups;
pub mod models;
pub mod outcomes;
pub mod seeds;

pub use crate::catalog::*;
pub use crate::constants::*;
pub use crate::groups::*;
pub use crate::models::*;
pub use crate::outcomes::*;
pub use crate::seeds::*;
