//! Color science: white balance, CIE conversions, and the print-preview ink model.

pub mod cmyk;
pub mod lab;
pub mod white_balance;
