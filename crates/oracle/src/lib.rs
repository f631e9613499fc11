// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod client;
mod codec;
mod context;
mod fence;
mod local;
mod proof;
mod traits;

pub use client::*;
pub use codec::*;
pub use context::*;
pub use fence::*;
pub use local::*;
pub use proof::*;
pub use traits::*;
