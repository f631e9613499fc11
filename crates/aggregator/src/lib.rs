// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod access_control;
mod accumulator;
mod batch_ledger;
mod clock;
mod error;

pub use access_control::*;
pub use accumulator::*;
pub use batch_ledger::*;
pub use clock::*;
pub use error::*;
