// Copyright (c) 2024 Botho Foundation

use std::path::PathBuf;
use thiserror::Error;

/// Failures specific to reading the tool's input.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Input file {0} is empty")]
    EmptyInput(PathBuf),

    #[error("Input is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Window has {len} entries but the configured limit is {max}")]
    WindowTooLong { len: usize, max: usize },
}
