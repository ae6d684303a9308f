use rowan::Language;

use crate::syntax::kind::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HclLanguage {}

impl Language for HclLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        let raw = raw.0;
        assert!(raw <= SyntaxKind::ErrorExpr as u16);
        // SAFETY: SyntaxKind is repr(u16) with contiguous discriminants from 0
        // through ErrorExpr, and the assertion keeps `raw` in that range.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<HclLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<HclLanguage>;
