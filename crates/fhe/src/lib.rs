// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod cipher;
mod fhe;
mod handle;
mod params;

pub use cipher::*;
pub use fhe::*;
pub use handle::*;
pub use params::*;
