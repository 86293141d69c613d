// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Errors that keep a battle from starting.

use thiserror::Error;

use crate::battle::OpponentTier;
use crate::config::ConfigError;
use crate::lyrics::LyricError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BattleError {
    #[error("invalid battle configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid lyrics: {0}")]
    Lyrics(#[from] LyricError),

    #[error("the catalog has no lyrics a {tier:?} opponent can play")]
    EmptyOpponentPool { tier: OpponentTier },
}
