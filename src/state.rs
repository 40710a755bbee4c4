//! Shared state store with expiring lock flags.
//!
//! A key/value map guarded by a blocking mutex, where any entry may carry an
//! expiry instant.  A key is *locked* while `now < expires_at`; expired
//! entries simply read as unlocked (lazy expiry, no sweeper).  Callers use
//! [`SharedStateStore::is_locked`] as a gate and skip their own action when
//! it is set.  Nothing in here ever waits.
//!
//! ```text
//!  control tick ──publish()──▶ ┌──────────────────┐ ◀──read()── table tick
//!  chart refresh ─set_value()─▶ │ SharedStateStore │ ◀─is_locked()─ chart-data tick
//!                               └──────────────────┘
//! ```

use core::cell::RefCell;
use core::hash::Hash;
use std::collections::HashMap;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant};

use crate::control::pid::PidGains;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Slot<V> {
    fn locked_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|t| now < t)
    }
}

/// Generic key/value store with optional per-key expiry.
///
/// Every operation runs inside one critical section, so a completed write
/// is visible to the next read from any thread and a reader never sees a
/// half-applied batch.
pub struct SharedStateStore<K, V> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<HashMap<K, Slot<V>>>>,
}

impl<K: Eq + Hash, V: Clone> Default for SharedStateStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V: Clone> SharedStateStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(HashMap::new())),
        }
    }

    /// Store `value` under `key`.  A non-zero `ttl` locks the key until
    /// `now + ttl`; reads never extend it.  A zero `ttl` clears any lock.
    pub fn set_value(&self, key: K, value: V, ttl: Duration, now: Instant) {
        let expires_at = if ttl.as_ticks() == 0 {
            None
        } else {
            Some(now.checked_add(ttl).unwrap_or(Instant::MAX))
        };
        self.inner.lock(|map| {
            map.borrow_mut().insert(key, Slot { value, expires_at });
        });
    }

    /// Current value regardless of lock state.
    pub fn get_value(&self, key: &K) -> Option<V> {
        self.inner
            .lock(|map| map.borrow().get(key).map(|slot| slot.value.clone()))
    }

    /// Current value, or `default` when the key was never set.
    pub fn get_or(&self, key: &K, default: V) -> V {
        self.get_value(key).unwrap_or(default)
    }

    /// True iff `key` exists and its expiry lies in the future.
    pub fn is_locked(&self, key: &K, now: Instant) -> bool {
        self.inner
            .lock(|map| map.borrow().get(key).is_some_and(|slot| slot.locked_at(now)))
    }

    /// Write several keys as one atomic step (no TTL).
    pub fn publish(&self, entries: impl IntoIterator<Item = (K, V)>) {
        self.inner.lock(|map| {
            let mut map = map.borrow_mut();
            for (key, value) in entries {
                map.insert(
                    key,
                    Slot {
                        value,
                        expires_at: None,
                    },
                );
            }
        });
    }

    /// Run `f` against a consistent view of the whole store.
    pub fn read<R>(&self, f: impl FnOnce(&StateView<'_, K, V>) -> R) -> R {
        self.inner.lock(|map| {
            let map = map.borrow();
            f(&StateView { map: &*map })
        })
    }

    /// Number of stored keys, locked or not.
    pub fn len(&self) -> usize {
        self.inner.lock(|map| map.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed read-only view handed to [`SharedStateStore::read`].
pub struct StateView<'a, K, V> {
    map: &'a HashMap<K, Slot<V>>,
}

impl<K: Eq + Hash, V: Clone> StateView<'_, K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).map(|slot| slot.value.clone())
    }

    pub fn is_locked(&self, key: &K, now: Instant) -> bool {
        self.map.get(key).is_some_and(|slot| slot.locked_at(now))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Roaster keys and values
// ═══════════════════════════════════════════════════════════════

/// Keys the roaster publishes into its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    HeatLevel,
    Temperature,
    RateOfRise,
    AutoMode,
    TargetRateOfRise,
    PidGains,
    /// Held with a TTL while a full chart redraw is in flight.
    ChartLock,
}

/// Values stored against a [`StateKey`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateValue {
    Level(u8),
    Reading(f64),
    Flag(bool),
    Gains(PidGains),
    Unset,
}

impl StateValue {
    pub fn as_level(self) -> Option<u8> {
        match self {
            Self::Level(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_reading(self) -> Option<f64> {
        match self {
            Self::Reading(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            Self::Flag(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_gains(self) -> Option<PidGains> {
        match self {
            Self::Gains(g) => Some(g),
            _ => None,
        }
    }
}

/// The roaster's store.
pub type ControlStore = SharedStateStore<StateKey, StateValue>;

/// Coherent snapshot of the live control state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    /// Heater output, always within 0..=100.
    pub heat_level: u8,
    /// Latest probe reading, `None` before the first successful tick.
    pub temperature: Option<f64>,
    /// Rate-of-rise in °C/min.
    pub rate_of_rise: f64,
    pub auto_mode: bool,
    pub target_rate_of_rise: Option<f64>,
    pub pid_gains: PidGains,
}

impl ControlState {
    /// Read every control key in one critical section.
    pub fn load(store: &ControlStore) -> Self {
        store.read(|view| {
            let get = |key: StateKey| view.get(&key).unwrap_or(StateValue::Unset);
            Self {
                heat_level: get(StateKey::HeatLevel).as_level().unwrap_or(0),
                temperature: get(StateKey::Temperature).as_reading(),
                rate_of_rise: get(StateKey::RateOfRise).as_reading().unwrap_or(0.0),
                auto_mode: get(StateKey::AutoMode).as_flag().unwrap_or(false),
                target_rate_of_rise: get(StateKey::TargetRateOfRise).as_reading(),
                pid_gains: get(StateKey::PidGains).as_gains().unwrap_or_default(),
            }
        })
    }

    /// Key/value pairs suitable for [`SharedStateStore::publish`].
    pub fn entries(&self) -> [(StateKey, StateValue); 6] {
        let opt = |v: Option<f64>| v.map_or(StateValue::Unset, StateValue::Reading);
        [
            (StateKey::HeatLevel, StateValue::Level(self.heat_level)),
            (StateKey::Temperature, opt(self.temperature)),
            (StateKey::RateOfRise, StateValue::Reading(self.rate_of_rise)),
            (StateKey::AutoMode, StateValue::Flag(self.auto_mode)),
            (StateKey::TargetRateOfRise, opt(self.target_rate_of_rise)),
            (StateKey::PidGains, StateValue::Gains(self.pid_gains)),
        ]
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
