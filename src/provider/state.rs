//! Per-provider lifecycle state.
//!
//! Every adapter embeds one [`ProviderState`]. It owns the declared flags,
//! the `Idle -> Iterating -> Idle` / `Idle -> Exhausted` phase, and an
//! `Arc<Shared>` that issued views point back to through a `Weak`.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::ProviderError;
use crate::flags::{Flags, Kind};
use crate::view::{ByteView, ViewData};

/// State visible to views: current flags and the validity epoch.
#[derive(Debug)]
pub(crate) struct Shared {
    flags: AtomicU8,
    epoch: AtomicU64,
}

impl Shared {
    pub(crate) fn flags(&self) -> Flags {
        Flags::from_bits_retain(self.flags.load(Ordering::Acquire))
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn set_flags(&self, flags: Flags) {
        self.flags.store(flags.bits(), Ordering::Release);
    }
}

/// Lifecycle phase of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Iterating,
    /// Terminal, streams only.
    Exhausted,
}

#[derive(Debug)]
pub(crate) struct ProviderState {
    shared: Arc<Shared>,
    declared: Flags,
    kind: Kind,
    phase: Phase,
}

impl ProviderState {
    pub(crate) fn new(kind: Kind, flags: Flags) -> Result<Self, ProviderError> {
        let flags = flags.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                flags: AtomicU8::new(flags.bits()),
                epoch: AtomicU64::new(0),
            }),
            declared: flags,
            kind,
            phase: Phase::Idle,
        })
    }

    pub(crate) fn kind(&self) -> Kind {
        self.kind
    }

    /// Current flags, with WRITABLE suppressed while iterating.
    pub(crate) fn flags(&self) -> Flags {
        self.shared.flags()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    /// Wraps provider bytes in a view tied to the current epoch.
    pub(crate) fn issue(&self, data: impl Into<ViewData>, offset: u64) -> ByteView {
        ByteView::issued(data.into(), offset, Arc::downgrade(&self.shared), self.shared.epoch())
    }

    /// Invalidates every view issued so far.
    pub(crate) fn invalidate(&self) {
        let epoch = self.shared.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(kind = %self.kind, epoch, "provider views invalidated");
    }

    /// Rejects mutation on CONSTANT providers and outside of `Idle`.
    pub(crate) fn check_not_constant(&self, operation: &'static str) -> Result<(), ProviderError> {
        let flags = self.flags();
        if flags.has(Flags::CONSTANT) {
            return Err(ProviderError::Capability { operation, flags });
        }
        self.check_idle(operation)
    }

    /// Rejects mutation unless the provider is WRITABLE and not CONSTANT.
    pub(crate) fn check_writable(&self, operation: &'static str) -> Result<(), ProviderError> {
        let flags = self.flags();
        if !flags.is_mutable() {
            return Err(ProviderError::Capability { operation, flags });
        }
        self.check_idle(operation)
    }

    fn check_idle(&self, operation: &'static str) -> Result<(), ProviderError> {
        match self.phase {
            Phase::Idle => Ok(()),
            Phase::Exhausted => Err(ProviderError::ExhaustedSource),
            Phase::Iterating => Err(ProviderError::UnsupportedOperation {
                operation,
                kind: self.kind,
            }),
        }
    }

    /// Enters `Iterating`, suppressing WRITABLE until the guard drops.
    pub(crate) fn begin_iteration(&mut self) -> Result<IterationGuard<'_>, ProviderError> {
        match self.phase {
            Phase::Idle => {}
            Phase::Exhausted => return Err(ProviderError::ExhaustedSource),
            Phase::Iterating => {
                return Err(ProviderError::UnsupportedOperation {
                    operation: "re-entrant iteration",
                    kind: self.kind,
                });
            }
        }
        self.phase = Phase::Iterating;
        self.shared.set_flags(self.declared.read_only());
        debug!(kind = %self.kind, "iteration started");
        Ok(IterationGuard { state: self })
    }
}

/// Keeps a provider in `Iterating` for as long as a chunk iterator lives.
#[derive(Debug)]
pub(crate) struct IterationGuard<'a> {
    state: &'a mut ProviderState,
}

impl IterationGuard<'_> {
    pub(crate) fn issue(&self, data: ViewData, offset: u64) -> ByteView {
        self.state.issue(data, offset)
    }
}

impl Drop for IterationGuard<'_> {
    fn drop(&mut self) {
        let state = &mut *self.state;
        state.shared.set_flags(state.declared);
        state.phase = if state.kind.is_stream() {
            Phase::Exhausted
        } else {
            Phase::Idle
        };
        debug!(kind = %state.kind, phase = ?state.phase, "iteration finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_rejects_invalid_flags() {
        let result = ProviderState::new(Kind::Memory, Flags::WRITABLE | Flags::CONSTANT);
        assert!(matches!(result, Err(ProviderError::Capability { .. })));
    }

    #[test]
    fn test_iteration_suppresses_writable() {
        let mut state = ProviderState::new(Kind::Memory, Flags::READABLE | Flags::WRITABLE).unwrap();
        {
            let _guard = state.begin_iteration().unwrap();
        }
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.flags().has(Flags::WRITABLE));

        let guard = state.begin_iteration().unwrap();
        let view = guard.issue(Bytes::from_static(b"abc").into(), 0);
        assert!(!view.origin_flags().unwrap().has(Flags::WRITABLE));
        drop(guard);
        assert!(view.origin_flags().unwrap().has(Flags::WRITABLE));
    }

    #[test]
    fn test_stream_becomes_exhausted() {
        let mut state = ProviderState::new(Kind::Stream, Flags::READABLE).unwrap();
        drop(state.begin_iteration().unwrap());
        assert_eq!(state.phase(), Phase::Exhausted);
        assert!(matches!(
            state.begin_iteration(),
            Err(ProviderError::ExhaustedSource)
        ));
    }

    #[test]
    fn test_invalidate_stales_views() {
        let state = ProviderState::new(Kind::Memory, Flags::READABLE).unwrap();
        let view = state.issue(Bytes::from_static(b"abc"), 0);
        assert!(!view.is_stale());
        state.invalidate();
        assert!(view.is_stale());
    }

    #[test]
    fn test_dropping_state_stales_views() {
        let state = ProviderState::new(Kind::Memory, Flags::READABLE).unwrap();
        let view = state.issue(Bytes::from_static(b"abc"), 0);
        drop(state);
        assert!(matches!(view.as_bytes(), Err(ProviderError::StaleView)));
    }

    #[test]
    fn test_mutation_checks() {
        let state = ProviderState::new(Kind::Memory, Flags::READABLE | Flags::CONSTANT).unwrap();
        assert!(state.check_not_constant("append").is_err());
        assert!(state.check_writable("write").is_err());

        let state = ProviderState::new(Kind::Memory, Flags::READABLE).unwrap();
        assert!(state.check_not_constant("append").is_ok());
        assert!(state.check_writable("write").is_err());
    }
}
