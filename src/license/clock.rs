//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Yan.
//! The Yan project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! Wall clock abstraction used for expiry checks.

use chrono::{DateTime, TimeZone, Utc};

pub trait YanClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct YanSystemClock;

impl YanClock for YanSystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Clone, Copy, Debug)]
pub struct YanFixedClock(pub DateTime<Utc>);

impl YanFixedClock {
    /// Falls back to the epoch for timestamps chrono cannot represent.
    pub fn at_timestamp(secs: i64) -> Self {
        YanFixedClock(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }
}

impl YanClock for YanFixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
