// Adapters layer: concrete calibration sources (local files, directories, in-memory text).

pub mod storage;
