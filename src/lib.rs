pub mod binning;
pub mod boundary_errors;
pub mod bounds;
pub mod config;
pub mod constants;
pub mod coordinates;
pub mod crossings;
pub mod ephemeris;
pub mod export;
pub mod fit;
pub mod grid;
pub mod pipeline;
pub mod report;
pub mod solar_wind;
pub mod time;
