// Application layer: renders layouts and calibration records for the binaries.

pub mod report;
