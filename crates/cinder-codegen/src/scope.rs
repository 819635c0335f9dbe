//! Construction-scope bookkeeping
//!
//! Opening an object construction block emits a one-byte placeholder whose
//! true value (the instruction index just past the block) is only known at
//! close time. Placeholders are recorded as patch sites in an arena, and
//! open scopes form an explicit stack: last opened, first closed.

use crate::error::{EmitError, EmitResult};

/// Handle to an open construction scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// One recorded forward reference: a placeholder byte awaiting its value
#[derive(Debug)]
struct PatchSite {
    position: usize,
    resolved: Option<u8>,
}

/// Arena of patch sites plus the stack of scopes still open
#[derive(Debug, Default)]
pub(crate) struct ObjectScopes {
    sites: Vec<PatchSite>,
    open: Vec<usize>,
}

impl ObjectScopes {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a new scope whose placeholder byte sits at `position`
    pub(crate) fn open(&mut self, position: usize) -> ScopeId {
        let id = self.sites.len();
        self.sites.push(PatchSite {
            position,
            resolved: None,
        });
        self.open.push(id);
        ScopeId(id)
    }

    /// Pop the innermost open scope
    pub(crate) fn pop_innermost(&mut self) -> EmitResult<ScopeId> {
        self.open.pop().map(ScopeId).ok_or(EmitError::NoOpenScope)
    }

    /// Resolve a scope's patch site with the instruction count at close
    /// time, returning the placeholder position and the byte to write
    ///
    /// Each site resolves exactly once; the end index must fit one byte.
    pub(crate) fn resolve(&mut self, scope: ScopeId, op_count: u32) -> EmitResult<(usize, u8)> {
        let site = &mut self.sites[scope.0];
        if site.resolved.is_some() {
            return Err(EmitError::PatchAlreadyResolved {
                position: site.position,
            });
        }
        if op_count > u8::MAX as u32 {
            return Err(EmitError::ScopeOverflow { op_count });
        }
        let value = op_count as u8;
        site.resolved = Some(value);
        Ok((site.position, value))
    }

    /// Number of scopes still open
    pub(crate) fn open_count(&self) -> usize {
        self.open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_close_order() {
        let mut scopes = ObjectScopes::new();
        let outer = scopes.open(10);
        let inner = scopes.open(20);

        assert_eq!(scopes.pop_innermost().unwrap(), inner);
        assert_eq!(scopes.pop_innermost().unwrap(), outer);
        assert!(matches!(
            scopes.pop_innermost(),
            Err(EmitError::NoOpenScope)
        ));
    }

    #[test]
    fn test_resolve_returns_site_position() {
        let mut scopes = ObjectScopes::new();
        let id = scopes.open(42);
        scopes.pop_innermost().unwrap();

        let (position, value) = scopes.resolve(id, 7).unwrap();
        assert_eq!(position, 42);
        assert_eq!(value, 7);
    }

    #[test]
    fn test_double_resolution_rejected() {
        let mut scopes = ObjectScopes::new();
        let id = scopes.open(5);
        scopes.pop_innermost().unwrap();

        scopes.resolve(id, 3).unwrap();
        assert!(matches!(
            scopes.resolve(id, 4),
            Err(EmitError::PatchAlreadyResolved { position: 5 })
        ));
    }

    #[test]
    fn test_overflow_rejected_at_resolution() {
        let mut scopes = ObjectScopes::new();
        let id = scopes.open(0);
        scopes.pop_innermost().unwrap();

        assert!(matches!(
            scopes.resolve(id, 256),
            Err(EmitError::ScopeOverflow { op_count: 256 })
        ));
    }

    #[test]
    fn test_boundary_count_fits() {
        let mut scopes = ObjectScopes::new();
        let id = scopes.open(0);
        scopes.pop_innermost().unwrap();

        let (_, value) = scopes.resolve(id, 255).unwrap();
        assert_eq!(value, 255);
    }

    #[test]
    fn test_open_count() {
        let mut scopes = ObjectScopes::new();
        assert_eq!(scopes.open_count(), 0);
        scopes.open(0);
        scopes.open(1);
        assert_eq!(scopes.open_count(), 2);
        scopes.pop_innermost().unwrap();
        assert_eq!(scopes.open_count(), 1);
    }
}
