// Chart Converter - Rhythm-game charts to a normalized song model
// Module declarations

pub mod config;
pub mod convert;
pub mod interpret;
pub mod lyrics;
pub mod midi;
pub mod model;
pub mod notation;
pub mod output;
pub mod timing;
