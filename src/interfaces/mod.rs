//! Outer surfaces: CSV scripts in, CSV view logs out, and the replay driver.

pub mod csv;
pub mod fixtures;
pub mod replay;
