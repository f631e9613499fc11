// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ProtocolError, ProtocolResult};
use alloy_primitives::Address;
use ctally_events::{CooldownSet, Paused, ProviderAdded, ProviderRemoved, Unpaused};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The two independently rate limited actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateLimited {
    Submission,
    DecryptionRequest,
}

/// Role a caller must hold for an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner,
    Provider,
    Anyone,
}

/// Preconditions of an operation that are owned by [`AccessControl`].
///
/// [`AccessControl::check`] evaluates them in a fixed order: role, then pause, then cooldown.
/// Lifecycle preconditions are evaluated by the caller afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requirements {
    role: Role,
    not_paused: bool,
    cooldown: Option<RateLimited>,
}

impl Requirements {
    pub fn owner() -> Self {
        Self::with_role(Role::Owner)
    }

    pub fn provider() -> Self {
        Self::with_role(Role::Provider)
    }

    pub fn anyone() -> Self {
        Self::with_role(Role::Anyone)
    }

    fn with_role(role: Role) -> Self {
        Self {
            role,
            not_paused: false,
            cooldown: None,
        }
    }

    pub fn when_not_paused(mut self) -> Self {
        self.not_paused = true;
        self
    }

    pub fn rate_limited(mut self, action: RateLimited) -> Self {
        self.cooldown = Some(action);
        self
    }
}

/// Owner identity, provider allow-list, pause flag and cooldown bookkeeping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    providers: BTreeSet<Address>,
    paused: bool,
    cooldown: u64,
    last_submission: HashMap<Address, u64>,
    last_request: HashMap<Address, u64>,
}

impl AccessControl {
    /// The owner starts out as a provider. `cooldown` is in seconds and must be non-zero.
    pub fn new(owner: Address, cooldown: u64) -> ProtocolResult<Self> {
        if cooldown == 0 {
            return Err(ProtocolError::InvalidParameter("cooldown must be non-zero"));
        }
        Ok(Self {
            owner,
            providers: BTreeSet::from([owner]),
            paused: false,
            cooldown,
            last_submission: HashMap::new(),
            last_request: HashMap::new(),
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_provider(&self, addr: &Address) -> bool {
        self.providers.contains(addr)
    }

    pub fn providers(&self) -> impl Iterator<Item = &Address> {
        self.providers.iter()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn cooldown(&self) -> u64 {
        self.cooldown
    }

    pub fn last_action(&self, action: RateLimited, addr: &Address) -> Option<u64> {
        self.actions(action).get(addr).copied()
    }

    pub fn require_owner(&self, caller: &Address) -> ProtocolResult<()> {
        if *caller != self.owner {
            return Err(ProtocolError::NotOwner(*caller));
        }
        Ok(())
    }

    pub fn require_provider(&self, caller: &Address) -> ProtocolResult<()> {
        if !self.is_provider(caller) {
            return Err(ProtocolError::NotProvider(*caller));
        }
        Ok(())
    }

    pub fn require_not_paused(&self) -> ProtocolResult<()> {
        if self.paused {
            return Err(ProtocolError::Paused);
        }
        Ok(())
    }

    /// Fails while `now < last_action_time + cooldown`. An address that never acted is free to.
    pub fn require_cooldown_elapsed(
        &self,
        last_action_time: Option<u64>,
        now: u64,
    ) -> ProtocolResult<()> {
        let Some(last) = last_action_time else {
            return Ok(());
        };
        let ready_at = last.saturating_add(self.cooldown);
        if now < ready_at {
            return Err(ProtocolError::CooldownActive { now, ready_at });
        }
        Ok(())
    }

    /// Evaluate `req` for `caller` in the order role, pause, cooldown.
    pub fn check(&self, caller: &Address, req: Requirements, now: u64) -> ProtocolResult<()> {
        match req.role {
            Role::Owner => self.require_owner(caller)?,
            Role::Provider => self.require_provider(caller)?,
            Role::Anyone => (),
        }
        if req.not_paused {
            self.require_not_paused()?;
        }
        if let Some(action) = req.cooldown {
            self.require_cooldown_elapsed(self.last_action(action, caller), now)?;
        }
        Ok(())
    }

    /// Record that `addr` performed `action` at `now`. Call only once the action committed.
    pub fn record_action(&mut self, action: RateLimited, addr: Address, now: u64) {
        self.actions_mut(action).insert(addr, now);
    }

    pub fn add_provider(
        &mut self,
        caller: &Address,
        provider: Address,
    ) -> ProtocolResult<ProviderAdded> {
        self.require_owner(caller)?;
        self.providers.insert(provider);
        Ok(ProviderAdded { provider })
    }

    pub fn remove_provider(
        &mut self,
        caller: &Address,
        provider: Address,
    ) -> ProtocolResult<ProviderRemoved> {
        self.require_owner(caller)?;
        self.providers.remove(&provider);
        Ok(ProviderRemoved { provider })
    }

    pub fn pause(&mut self, caller: &Address) -> ProtocolResult<Paused> {
        self.require_owner(caller)?;
        if self.paused {
            return Err(ProtocolError::AlreadyPaused);
        }
        self.paused = true;
        Ok(Paused { by: *caller })
    }

    /// Unpausing a running system is a no-op that still emits.
    pub fn unpause(&mut self, caller: &Address) -> ProtocolResult<Unpaused> {
        self.require_owner(caller)?;
        self.paused = false;
        Ok(Unpaused { by: *caller })
    }

    pub fn set_cooldown(&mut self, caller: &Address, cooldown: u64) -> ProtocolResult<CooldownSet> {
        self.require_owner(caller)?;
        if cooldown == 0 {
            return Err(ProtocolError::InvalidParameter("cooldown must be non-zero"));
        }
        let old = std::mem::replace(&mut self.cooldown, cooldown);
        Ok(CooldownSet { old, new: cooldown })
    }

    fn actions(&self, action: RateLimited) -> &HashMap<Address, u64> {
        match action {
            RateLimited::Submission => &self.last_submission,
            RateLimited::DecryptionRequest => &self.last_request,
        }
    }

    fn actions_mut(&mut self, action: RateLimited) -> &mut HashMap<Address, u64> {
        match action {
            RateLimited::Submission => &mut self.last_submission,
            RateLimited::DecryptionRequest => &mut self.last_request,
        }
    }
}
