//! Security element.

use super::{DbElement, ElementCore};
use crate::types::SecurityId;

/// A security held in investment accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Security {
    pub(crate) core: ElementCore,
    pub(crate) symbol: Option<String>,
}

impl Security {
    /// Creates a security. Identity is assigned when it enters a
    /// registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: ElementCore::new(name),
            symbol: None,
        }
    }

    /// Sets the ticker symbol.
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// The security's identity.
    pub fn id(&self) -> SecurityId {
        SecurityId::new(self.core.id)
    }

    /// The security name.
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Whether the security is hidden from pick-lists.
    pub fn is_hidden(&self) -> bool {
        self.core.is_hidden()
    }

    /// Sets the hidden flag.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.core.hidden = hidden;
    }

    /// The ticker symbol, if recorded.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// Outstanding reference count.
    pub fn ref_count(&self) -> u32 {
        self.core.ref_count()
    }

    /// Whether any transaction references this security.
    pub fn is_referenced(&self) -> bool {
        self.core.is_referenced()
    }
}

impl DbElement for Security {
    const KIND: &'static str = "security";
    type Id = SecurityId;

    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }
}
